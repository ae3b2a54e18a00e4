// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use thiserror::Error;

use crate::definitions::Capabilities;
use crate::device::BluetoothPeer;
use crate::route::{ListingPreference, Route, RoutingSession};

/// Errors reported by a discovery collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The target application is not known to the routing service.
    #[error("Package {0} is not available")]
    PackageNotAvailable(String),

    /// The routing service refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Change notifications emitted by the discovery service on its own execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    /// Routes were added, removed or updated.
    RoutesChanged,
    /// A routing session was created, changed or released.
    SessionsChanged,
    /// The application published a new listing preference, or withdrew it.
    PreferenceChanged(Option<ListingPreference>),
}

/// Route discovery and routing service the engine is built on.
///
/// All data is already materialized by the implementation; none of these calls block on I/O.
pub trait DiscoveryCollaborator: Send + Sync {
    /// Optional behaviour supported by this implementation.
    fn capabilities(&self) -> Capabilities;

    /// Checks that routing information can be obtained for `app_id`.
    fn probe(&self, app_id: &str) -> Result<(), CollaboratorError>;

    fn start_scan(&self);

    fn stop_scan(&self);

    /// Returns the sessions of `app_id`: the system session first, then linked remote sessions.
    fn list_routing_sessions(&self, app_id: &str) -> Vec<RoutingSession>;

    fn list_selected_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>>;

    fn list_selectable_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>>;

    fn list_deselectable_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>>;

    fn list_transferable_routes(&self, app_id: &str) -> Vec<Arc<Route>>;

    fn listing_preference(&self) -> Option<ListingPreference>;

    fn set_route_volume(&self, route: &Route, volume: i32) -> Result<(), CollaboratorError>;

    fn set_session_volume(
        &self,
        session: &RoutingSession,
        volume: i32,
    ) -> Result<(), CollaboratorError>;

    fn select_route(
        &self,
        route: &Route,
        session: &RoutingSession,
    ) -> Result<(), CollaboratorError>;

    fn deselect_route(
        &self,
        route: &Route,
        session: &RoutingSession,
    ) -> Result<(), CollaboratorError>;

    fn transfer_to_route(&self, route: &Route) -> Result<(), CollaboratorError>;

    fn release_session(&self, session: &RoutingSession) -> Result<(), CollaboratorError>;
}

/// Cache of bonded Bluetooth devices, keyed by hardware address.
pub trait BluetoothPeerCache: Send + Sync {
    fn resolve_peer(&self, address: &str) -> Option<BluetoothPeer>;
}

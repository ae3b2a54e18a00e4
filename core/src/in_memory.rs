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

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::broadcast;

use crate::collaborator::{
    BluetoothPeerCache, CollaboratorError, DiscoveryCollaborator, DiscoveryEvent,
};
use crate::definitions::Capabilities;
use crate::device::BluetoothPeer;
use crate::route::{ListingPreference, Route, RoutingSession};

/// Request recorded by [`InMemoryCollaborator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorCall {
    StartScan,
    StopScan,
    SetRouteVolume { route_id: String, volume: i32 },
    SetSessionVolume { session_id: String, volume: i32 },
    Select { route_id: String, session_id: String },
    Deselect { route_id: String, session_id: String },
    Transfer { route_id: String },
    Release { session_id: String },
}

#[derive(Default)]
struct DiscoverySnapshot {
    packages: HashSet<String>,
    routes: Vec<Arc<Route>>,
    system_session: Option<RoutingSession>,
    remote_sessions: HashMap<String, Vec<RoutingSession>>,
    transferable: HashMap<String, Vec<String>>,
    preference: Option<ListingPreference>,
    scanning: bool,
    calls: Vec<CollaboratorCall>,
}

impl DiscoverySnapshot {
    fn resolve(&self, ids: &[String]) -> Vec<Arc<Route>> {
        ids.iter()
            .filter_map(|id| self.routes.iter().find(|r| &r.id == id).cloned())
            .collect()
    }

    fn session_mut(&mut self, session_id: &str) -> Result<&mut RoutingSession, CollaboratorError> {
        if let Some(system) = self.system_session.as_mut().filter(|s| s.id == session_id) {
            return Ok(system);
        }
        self.remote_sessions
            .values_mut()
            .flat_map(|sessions| sessions.iter_mut())
            .find(|s| s.id == session_id)
            .ok_or_else(|| CollaboratorError::Rejected(format!("unknown session {}", session_id)))
    }
}

/// Discovery collaborator backed by an in-memory snapshot.
///
/// The host drives discovery by replacing routes, sessions and the listing preference; every
/// change is broadcast as a [`DiscoveryEvent`]. Routing requests update the snapshot the way a
/// router would and are recorded for inspection.
pub struct InMemoryCollaborator {
    capabilities: Capabilities,
    state: Mutex<DiscoverySnapshot>,
    event_sender: broadcast::Sender<DiscoveryEvent>,
}

impl InMemoryCollaborator {
    pub fn new(capabilities: Capabilities, system_session: RoutingSession) -> Self {
        let (event_sender, _) = broadcast::channel(100);
        Self {
            capabilities,
            state: Mutex::new(DiscoverySnapshot {
                system_session: Some(system_session),
                ..Default::default()
            }),
            event_sender,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DiscoverySnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, event: DiscoveryEvent) {
        // No receivers is fine; the engine may be driven directly.
        let _ = self.event_sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.event_sender.subscribe()
    }

    pub fn add_package(&self, app_id: impl Into<String>) {
        self.lock().packages.insert(app_id.into());
    }

    /// Replaces the discovered routes, keeping the given discovery order.
    pub fn set_routes(&self, routes: Vec<Route>) {
        self.lock().routes = routes.into_iter().map(Arc::new).collect();
        self.notify(DiscoveryEvent::RoutesChanged);
    }

    pub fn set_system_session(&self, session: RoutingSession) {
        self.lock().system_session = Some(session);
        self.notify(DiscoveryEvent::SessionsChanged);
    }

    /// Links a remote session to `app_id`, after any remote session linked before.
    pub fn add_remote_session(&self, app_id: &str, session: RoutingSession) {
        self.lock()
            .remote_sessions
            .entry(app_id.to_string())
            .or_default()
            .push(session);
        self.notify(DiscoveryEvent::SessionsChanged);
    }

    pub fn set_transferable<I, S>(&self, app_id: &str, route_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = route_ids.into_iter().map(Into::into).collect();
        self.lock().transferable.insert(app_id.to_string(), ids);
        self.notify(DiscoveryEvent::RoutesChanged);
    }

    pub fn set_listing_preference(&self, preference: Option<ListingPreference>) {
        self.lock().preference = preference.clone();
        self.notify(DiscoveryEvent::PreferenceChanged(preference));
    }

    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    pub fn take_calls(&self) -> Vec<CollaboratorCall> {
        std::mem::take(&mut self.lock().calls)
    }
}

impl DiscoveryCollaborator for InMemoryCollaborator {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn probe(&self, app_id: &str) -> Result<(), CollaboratorError> {
        if self.lock().packages.contains(app_id) {
            Ok(())
        } else {
            Err(CollaboratorError::PackageNotAvailable(app_id.to_string()))
        }
    }

    fn start_scan(&self) {
        let mut state = self.lock();
        state.scanning = true;
        state.calls.push(CollaboratorCall::StartScan);
    }

    fn stop_scan(&self) {
        let mut state = self.lock();
        state.scanning = false;
        state.calls.push(CollaboratorCall::StopScan);
    }

    fn list_routing_sessions(&self, app_id: &str) -> Vec<RoutingSession> {
        let state = self.lock();
        state
            .system_session
            .iter()
            .chain(state.remote_sessions.get(app_id).into_iter().flatten())
            .cloned()
            .collect()
    }

    fn list_selected_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>> {
        self.lock().resolve(&session.selected_route_ids)
    }

    fn list_selectable_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>> {
        self.lock().resolve(&session.selectable_route_ids)
    }

    fn list_deselectable_routes(&self, session: &RoutingSession) -> Vec<Arc<Route>> {
        self.lock().resolve(&session.deselectable_route_ids)
    }

    fn list_transferable_routes(&self, app_id: &str) -> Vec<Arc<Route>> {
        let state = self.lock();
        match state.transferable.get(app_id) {
            Some(ids) => state.resolve(ids),
            None => Vec::new(),
        }
    }

    fn listing_preference(&self) -> Option<ListingPreference> {
        self.lock().preference.clone()
    }

    fn set_route_volume(&self, route: &Route, volume: i32) -> Result<(), CollaboratorError> {
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::SetRouteVolume {
                route_id: route.id.clone(),
                volume,
            });
            let slot = state
                .routes
                .iter_mut()
                .find(|r| r.id == route.id)
                .ok_or_else(|| CollaboratorError::Rejected(format!("unknown route {}", route.id)))?;
            let mut updated = Route::clone(slot);
            updated.volume = volume.clamp(0, updated.volume_max.max(0));
            *slot = Arc::new(updated);
        }
        self.notify(DiscoveryEvent::RoutesChanged);
        Ok(())
    }

    fn set_session_volume(
        &self,
        session: &RoutingSession,
        volume: i32,
    ) -> Result<(), CollaboratorError> {
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::SetSessionVolume {
                session_id: session.id.clone(),
                volume,
            });
            let target = state.session_mut(&session.id)?;
            target.volume = volume.clamp(0, target.volume_max.max(0));
        }
        self.notify(DiscoveryEvent::SessionsChanged);
        Ok(())
    }

    fn select_route(
        &self,
        route: &Route,
        session: &RoutingSession,
    ) -> Result<(), CollaboratorError> {
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::Select {
                route_id: route.id.clone(),
                session_id: session.id.clone(),
            });
            let target = state.session_mut(&session.id)?;
            target.selectable_route_ids.retain(|id| id != &route.id);
            target.selected_route_ids.push(route.id.clone());
            target.deselectable_route_ids.push(route.id.clone());
        }
        debug!("Route {} selected in session {}", route.id, session.id);
        self.notify(DiscoveryEvent::SessionsChanged);
        Ok(())
    }

    fn deselect_route(
        &self,
        route: &Route,
        session: &RoutingSession,
    ) -> Result<(), CollaboratorError> {
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::Deselect {
                route_id: route.id.clone(),
                session_id: session.id.clone(),
            });
            let target = state.session_mut(&session.id)?;
            target.selected_route_ids.retain(|id| id != &route.id);
            target.deselectable_route_ids.retain(|id| id != &route.id);
            target.selectable_route_ids.push(route.id.clone());
        }
        debug!("Route {} deselected from session {}", route.id, session.id);
        self.notify(DiscoveryEvent::SessionsChanged);
        Ok(())
    }

    fn transfer_to_route(&self, route: &Route) -> Result<(), CollaboratorError> {
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::Transfer { route_id: route.id.clone() });
            if route.is_system_route {
                if let Some(system) = state.system_session.as_mut() {
                    system.selected_route_ids = vec![route.id.clone()];
                }
            }
        }
        self.notify(DiscoveryEvent::SessionsChanged);
        Ok(())
    }

    fn release_session(&self, session: &RoutingSession) -> Result<(), CollaboratorError> {
        if session.is_system_session {
            return Err(CollaboratorError::Rejected(
                "the system session cannot be released".to_string(),
            ));
        }
        {
            let mut state = self.lock();
            state.calls.push(CollaboratorCall::Release { session_id: session.id.clone() });
            for sessions in state.remote_sessions.values_mut() {
                sessions.retain(|s| s.id != session.id);
            }
        }
        self.notify(DiscoveryEvent::SessionsChanged);
        Ok(())
    }
}

/// Bluetooth peer cache backed by a map of bonded devices.
#[derive(Default)]
pub struct InMemoryPeerCache {
    peers: Mutex<HashMap<String, BluetoothPeer>>,
}

impl InMemoryPeerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, peer: BluetoothPeer) {
        self.peers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(peer.address.clone(), peer);
    }

    pub fn remove(&self, address: &str) -> Option<BluetoothPeer> {
        self.peers.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).remove(address)
    }
}

impl BluetoothPeerCache for InMemoryPeerCache {
    fn resolve_peer(&self, address: &str) -> Option<BluetoothPeer> {
        self.peers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(address)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::RouteType;

    fn collaborator() -> InMemoryCollaborator {
        let system = RoutingSession::new("system", true).with_selected(["speaker"]);
        let collaborator = InMemoryCollaborator::new(Capabilities::all(), system);
        collaborator.add_package("com.example.player");
        collaborator.set_routes(vec![
            Route::new("speaker", "Phone speaker", RouteType::BuiltinSpeaker).system(),
            Route::new("tv", "Living room TV", RouteType::RemoteTv),
        ]);
        collaborator
    }

    #[test]
    fn probe_fails_for_unknown_package() {
        let collaborator = collaborator();
        assert!(collaborator.probe("com.example.player").is_ok());
        assert_eq!(
            collaborator.probe("com.example.other"),
            Err(CollaboratorError::PackageNotAvailable("com.example.other".to_string()))
        );
    }

    #[test]
    fn system_session_is_listed_first() {
        let collaborator = collaborator();
        collaborator.add_remote_session("com.example.player", RoutingSession::new("cast", false));
        let sessions = collaborator.list_routing_sessions("com.example.player");
        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["system", "cast"]);
        assert_eq!(collaborator.list_routing_sessions("com.example.other").len(), 1);
    }

    #[test]
    fn select_moves_route_between_lists() {
        let collaborator = collaborator();
        collaborator.add_remote_session(
            "com.example.player",
            RoutingSession::new("cast", false).with_selectable(["tv"]),
        );
        let session = collaborator.list_routing_sessions("com.example.player").pop().unwrap();
        let tv = collaborator.list_selectable_routes(&session).pop().unwrap();

        collaborator.select_route(&tv, &session).unwrap();

        let session = collaborator.list_routing_sessions("com.example.player").pop().unwrap();
        assert!(session.is_selected("tv"));
        assert!(session.is_deselectable("tv"));
        assert!(!session.is_selectable("tv"));
        assert_eq!(
            collaborator.take_calls(),
            vec![CollaboratorCall::Select { route_id: "tv".into(), session_id: "cast".into() }]
        );
    }

    #[test]
    fn changes_are_broadcast() {
        let collaborator = collaborator();
        let mut events = collaborator.subscribe();
        collaborator.set_listing_preference(None);
        assert_eq!(events.try_recv().unwrap(), DiscoveryEvent::PreferenceChanged(None));
    }

    #[test]
    fn system_session_cannot_be_released() {
        let collaborator = collaborator();
        let system = collaborator.list_routing_sessions("com.example.player").remove(0);
        assert!(collaborator.release_session(&system).is_err());
    }

    #[test]
    fn peer_cache_resolves_by_address() {
        let cache = InMemoryPeerCache::new();
        cache.insert(BluetoothPeer { address: "AA".into(), name: "Buds".into() });
        assert_eq!(cache.resolve_peer("AA").unwrap().name, "Buds");
        cache.remove("AA");
        assert!(cache.resolve_peer("AA").is_none());
    }
}

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


//! Route aggregation and device synthesis.
//!
//! Discovered media routes are deduplicated, ordered by the application's listing preference,
//! classified into presentable devices and published as one atomically replaced snapshot.

pub mod catalog;
pub mod collaborator;
pub mod config;
pub mod definitions;
pub mod device;
pub mod engine;
#[cfg(any(test, feature = "in-memory"))]
pub mod in_memory;
pub mod ordering;
pub mod preference;
pub mod route;
pub mod service;
pub mod session;
pub mod watch;

pub use collaborator::{
    BluetoothPeerCache, CollaboratorError, DiscoveryCollaborator, DiscoveryEvent,
};
pub use config::EngineConfig;
pub use definitions::{Capabilities, DeviceState, RouteType, VolumeHandling};
pub use device::{BluetoothPeer, Device, DeviceCategory, DeviceList};
pub use engine::{DeviceSnapshot, EngineError, EngineEvent, RouteEngine, ScanState};
pub use route::{ListingPreference, PreferenceItem, Route, RoutingSession};
pub use service::{spawn_service, ServiceGroup, ServiceHandle, StopHandle};
pub use watch::{run_discovery_watch, run_engine_listener, EngineEventListener};

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

use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::catalog::filter_duplicates;
use crate::collaborator::{
    BluetoothPeerCache, CollaboratorError, DiscoveryCollaborator, DiscoveryEvent,
};
use crate::config::EngineConfig;
use crate::definitions::Capabilities;
use crate::device::{classify, Device, DeviceList};
use crate::ordering::arrange;
use crate::preference::{compose, PreferenceIndex};
use crate::route::{ListingPreference, Route, RoutingSession};
use crate::session::{is_available_for_volume_control, resolve_active_session};

/// Error type for route engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The discovery service has no routing information for the application
    #[error("Package {0} is not available for media routing")]
    PackageNotAvailable(String),

    /// Scanning was stopped for good on this engine
    #[error("Route engine has been stopped")]
    Stopped,

    /// The discovery service reported no routing session for the application
    #[error("No routing session for {0}")]
    NoActiveSession(String),

    /// The route is not in the active session's selectable set
    #[error("Route {0} is not selectable in the active session")]
    NotSelectable(String),

    /// The route is not in the active session's deselectable set
    #[error("Route {0} is not deselectable in the active session")]
    NotDeselectable(String),

    /// The discovery service cannot transfer playback between routes
    #[error("Transferring playback is not supported")]
    TransferUnsupported,

    #[error("Discovery collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

/// Lifecycle of the scan coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Created, scan not started yet.
    Idle,
    /// `start_scan` is clearing the list and starting discovery.
    Scanning,
    /// A rebuild is running.
    Refreshing,
    /// The list is up to date and discovery events trigger rebuilds.
    Ready,
    /// Terminal; the last list stays published.
    Stopped,
}

/// Everything a rebuild publishes, swapped in as one unit.
#[derive(Debug, Default)]
pub struct DeviceSnapshot {
    /// Number of the rebuild that produced this snapshot; 0 before the first one.
    pub generation: u64,
    pub devices: DeviceList,
    pub selected: Vec<Device>,
    pub selectable: Vec<Device>,
    pub deselectable: Vec<Device>,
}

/// Notifications broadcast to the presentation layer.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Sent once per completed rebuild.
    DeviceListUpdated(Arc<DeviceSnapshot>),
    /// Sent only when the connected device is a different one than after the previous rebuild.
    ConnectedDeviceChanged(Option<Device>),
}

struct RebuildState {
    scan_state: ScanState,
    preference: Option<ListingPreference>,
    preference_index: PreferenceIndex,
    connected_id: Option<String>,
    generation: u64,
}

/// Keeps the presentable device list of one application in sync with route discovery.
///
/// Rebuilds run under a single mutex and publish their result by replacing one shared snapshot,
/// so readers never block on a rebuild and never see a partially built list.
pub struct RouteEngine {
    app_id: String,
    collaborator: Arc<dyn DiscoveryCollaborator>,
    peers: Arc<dyn BluetoothPeerCache>,
    state: Mutex<RebuildState>,
    snapshot: ArcSwap<DeviceSnapshot>,
    event_sender: broadcast::Sender<EngineEvent>,
}

impl RouteEngine {
    /// Creates an engine bound to the configured application.
    ///
    /// Fails with [`EngineError::PackageNotAvailable`] when the discovery service does not know
    /// the application.
    pub fn new(
        config: EngineConfig,
        collaborator: Arc<dyn DiscoveryCollaborator>,
        peers: Arc<dyn BluetoothPeerCache>,
    ) -> Result<Self, EngineError> {
        let app_id = config.resolved_app_id().to_string();
        collaborator.probe(&app_id).map_err(|e| match e {
            CollaboratorError::PackageNotAvailable(app_id) => {
                EngineError::PackageNotAvailable(app_id)
            }
            other => EngineError::Collaborator(other),
        })?;

        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));
        info!("Route engine created for {}", app_id);

        Ok(Self {
            app_id,
            collaborator,
            peers,
            state: Mutex::new(RebuildState {
                scan_state: ScanState::Idle,
                preference: None,
                preference_index: PreferenceIndex::new(),
                connected_id: None,
                generation: 0,
            }),
            snapshot: ArcSwap::from_pointee(DeviceSnapshot::default()),
            event_sender,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, RebuildState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.collaborator.capabilities()
    }

    pub fn scan_state(&self) -> ScanState {
        self.lock_state().scan_state
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    /// Clears the device list, starts discovery and performs the first rebuild.
    pub fn start_scan(&self) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        if state.scan_state == ScanState::Stopped {
            warn!("start_scan() ignored, engine for {} is stopped", self.app_id);
            return Err(EngineError::Stopped);
        }

        info!("Starting route scan for {}", self.app_id);
        state.scan_state = ScanState::Scanning;
        self.snapshot.store(Arc::new(DeviceSnapshot {
            generation: state.generation,
            ..Default::default()
        }));
        self.collaborator.start_scan();
        let preference = self.collaborator.listing_preference();
        self.update_preference(&mut state, preference);
        self.rebuild_locked(&mut state)
    }

    /// Stops discovery for good. The last device list stays published.
    pub fn stop_scan(&self) {
        let mut state = self.lock_state();
        if state.scan_state == ScanState::Stopped {
            return;
        }
        self.collaborator.stop_scan();
        state.scan_state = ScanState::Stopped;
        info!("Route scan for {} stopped", self.app_id);
    }

    /// Handles a notification from the discovery service.
    ///
    /// Preference updates are indexed in every state but `Stopped`; rebuilds only happen once
    /// the scan is running.
    pub fn on_discovery_event(&self, event: DiscoveryEvent) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        if state.scan_state == ScanState::Stopped {
            debug!("Discovery event {:?} ignored, engine stopped", event);
            return Ok(());
        }
        if let DiscoveryEvent::PreferenceChanged(preference) = event {
            self.update_preference(&mut state, preference);
        }
        if state.scan_state != ScanState::Ready {
            debug!("Scan not started for {}, no rebuild", self.app_id);
            return Ok(());
        }
        self.rebuild_locked(&mut state)
    }

    /// Re-reads the listing preference and rebuilds, for when discovery events were missed.
    pub fn resync(&self) -> Result<(), EngineError> {
        let mut state = self.lock_state();
        if state.scan_state == ScanState::Stopped {
            return Ok(());
        }
        let preference = self.collaborator.listing_preference();
        self.update_preference(&mut state, preference);
        if state.scan_state != ScanState::Ready {
            return Ok(());
        }
        info!("Resynchronizing device list for {}", self.app_id);
        self.rebuild_locked(&mut state)
    }

    fn update_preference(&self, state: &mut RebuildState, preference: Option<ListingPreference>) {
        state.preference_index.update(preference.as_ref());
        state.preference = preference;
        debug!("Listing preference updated, {} items", state.preference_index.len());
    }

    fn rebuild_locked(&self, state: &mut RebuildState) -> Result<(), EngineError> {
        state.scan_state = ScanState::Refreshing;
        let result = self.build_snapshot(state);
        state.scan_state = ScanState::Ready;

        let mut snapshot = result?;
        state.generation += 1;
        snapshot.generation = state.generation;
        let connected = snapshot.devices.connected().cloned();
        let snapshot = Arc::new(snapshot);
        self.snapshot.store(snapshot.clone());
        debug!(
            "Device list for {} rebuilt (generation {}): {} devices, connected {:?}",
            self.app_id,
            snapshot.generation,
            snapshot.devices.len(),
            connected.as_ref().map(|d| d.id.as_str())
        );

        // Nobody listening is fine.
        let _ = self.event_sender.send(EngineEvent::DeviceListUpdated(snapshot));
        let connected_id = connected.as_ref().map(|d| d.id.clone());
        if connected_id != state.connected_id {
            state.connected_id = connected_id;
            let _ = self.event_sender.send(EngineEvent::ConnectedDeviceChanged(connected));
        }
        Ok(())
    }

    fn ordering_preference<'a>(&self, state: &'a RebuildState) -> Option<&'a ListingPreference> {
        if self.capabilities().contains(Capabilities::LISTING_PREFERENCE) {
            state.preference.as_ref()
        } else {
            None
        }
    }

    fn build_snapshot(&self, state: &RebuildState) -> Result<DeviceSnapshot, EngineError> {
        let sessions = self.collaborator.list_routing_sessions(&self.app_id);
        let active = resolve_active_session(&sessions)
            .ok_or_else(|| EngineError::NoActiveSession(self.app_id.clone()))?;

        let selected = self.collaborator.list_selected_routes(active);
        let selectable = self.collaborator.list_selectable_routes(active);
        let deselectable = self.collaborator.list_deselectable_routes(active);

        let mut gathered = selected.clone();
        gathered.extend(selectable.iter().cloned());
        for route in self.collaborator.list_transferable_routes(&self.app_id) {
            if !gathered.iter().any(|r| r.id == route.id) {
                gathered.push(route);
            }
        }

        let items = match self.ordering_preference(state) {
            Some(preference) => compose(&preference.items),
            None => Vec::new(),
        };
        let available = filter_duplicates(&gathered);
        let routes = filter_duplicates(&arrange(&selected, &available, &items));

        let resolve_peer = |address: &str| self.peers.resolve_peer(address);
        let classify_all = |routes: &[Arc<Route>]| -> Vec<Device> {
            routes
                .iter()
                .filter_map(|r| {
                    classify(r, state.preference_index.get(&r.id), active, resolve_peer)
                })
                .collect()
        };

        Ok(DeviceSnapshot {
            generation: 0,
            devices: DeviceList::build(&routes, &state.preference_index, active, resolve_peer),
            selected: classify_all(&selected),
            selectable: classify_all(&selectable),
            deselectable: classify_all(&deselectable),
        })
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.snapshot.load_full()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.snapshot().devices.devices().to_vec()
    }

    pub fn current_connected_device(&self) -> Option<Device> {
        self.snapshot().devices.connected().cloned()
    }

    /// Devices that can be added to the active session.
    pub fn selectable_devices(&self) -> Vec<Device> {
        self.snapshot().selectable.clone()
    }

    /// Devices that can be removed from the active session.
    pub fn deselectable_devices(&self) -> Vec<Device> {
        self.snapshot().deselectable.clone()
    }

    /// Devices the active session currently plays on.
    pub fn selected_devices(&self) -> Vec<Device> {
        self.snapshot().selected.clone()
    }

    fn active_session(&self) -> Result<RoutingSession, EngineError> {
        let sessions = self.collaborator.list_routing_sessions(&self.app_id);
        resolve_active_session(&sessions)
            .cloned()
            .ok_or_else(|| EngineError::NoActiveSession(self.app_id.clone()))
    }

    /// Transfers playback to the device.
    pub fn connect_to_device(&self, device: &Device) -> Result<(), EngineError> {
        if !self.capabilities().contains(Capabilities::TRANSFER) {
            warn!("Unable to connect to {}, transfer not supported", device.name);
            return Err(EngineError::TransferUnsupported);
        }
        self.collaborator.transfer_to_route(device.route())?;
        Ok(())
    }

    /// Adds the device to the active session.
    pub fn add_device_to_play_media(&self, device: &Device) -> Result<(), EngineError> {
        let session = self.active_session()?;
        if !session.is_selectable(&device.id) {
            warn!("Ignoring selecting a non-selectable device: {}", device.name);
            return Err(EngineError::NotSelectable(device.id.clone()));
        }
        self.collaborator.select_route(device.route(), &session)?;
        Ok(())
    }

    /// Removes the device from the active session.
    pub fn remove_device_from_play_media(&self, device: &Device) -> Result<(), EngineError> {
        let session = self.active_session()?;
        if !session.is_deselectable(&device.id) {
            warn!("Ignoring deselecting a non-deselectable device: {}", device.name);
            return Err(EngineError::NotDeselectable(device.id.clone()));
        }
        self.collaborator.deselect_route(device.route(), &session)?;
        Ok(())
    }

    /// Releases the active session, stopping playback on its devices.
    pub fn release_session(&self) -> Result<(), EngineError> {
        let session = self.active_session()?;
        self.collaborator.release_session(&session)?;
        Ok(())
    }

    pub fn adjust_device_volume(&self, device: &Device, volume: i32) -> Result<(), EngineError> {
        self.collaborator.set_route_volume(device.route(), volume)?;
        Ok(())
    }

    pub fn adjust_session_volume(&self, volume: i32) -> Result<(), EngineError> {
        let session = self.active_session()?;
        debug!("Adjusting volume of {} to {} for {}", session.id, volume, self.app_id);
        self.adjust_volume_for_session(&session, volume)
    }

    pub fn adjust_volume_for_session(
        &self,
        session: &RoutingSession,
        volume: i32,
    ) -> Result<(), EngineError> {
        self.collaborator.set_session_volume(session, volume)?;
        Ok(())
    }

    pub fn session_volume(&self) -> Result<i32, EngineError> {
        Ok(self.active_session()?.volume)
    }

    pub fn session_volume_max(&self) -> Result<i32, EngineError> {
        Ok(self.active_session()?.volume_max)
    }

    pub fn session_name(&self) -> Result<String, EngineError> {
        Ok(self.active_session()?.name)
    }

    /// Whether the application has a remote session with adjustable volume.
    pub fn is_routing_session_available_for_volume_control(&self) -> bool {
        let sessions = self.collaborator.list_routing_sessions(&self.app_id);
        let available = is_available_for_volume_control(&sessions);
        if !available {
            debug!("No routing session for {} supports volume control", self.app_id);
        }
        available
    }

    /// Whether the application asks for its own listing order instead of the system's.
    pub fn prefer_route_listing_ordering(&self) -> bool {
        let state = self.lock_state();
        self.ordering_preference(&state)
            .is_some_and(|preference| !preference.use_system_ordering)
    }

    pub fn linked_item_component_name(&self) -> Option<String> {
        self.lock_state()
            .preference
            .as_ref()
            .and_then(|preference| preference.linked_item_component.clone())
    }
}

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

use log::{debug, warn};

use crate::definitions::{DeviceState, RouteType, VolumeHandling};
use crate::preference::PreferenceIndex;
use crate::route::{PreferenceItem, Route, RoutingSession};

/// A bonded Bluetooth device known to the local peer cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothPeer {
    pub address: String,
    pub name: String,
}

/// Presentation category of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCategory {
    /// Cast-style remote endpoint or group.
    GenericRemote,
    /// Output attached to the phone itself: speaker, wired, USB, HDMI, dock.
    PhoneLocal,
    Bluetooth(BluetoothPeer),
    /// Remote audio/video receiver.
    ComplexAv,
}

/// Device entity handed to the presentation layer.
///
/// Devices are recreated on every rebuild and never reused between rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub category: DeviceCategory,
    pub state: DeviceState,
    pub preference: Option<PreferenceItem>,
    route: Arc<Route>,
}

impl Device {
    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn is_selected(&self) -> bool {
        self.state == DeviceState::Selected
    }

    pub fn is_suggested(&self) -> bool {
        self.preference.as_ref().is_some_and(|p| p.suggested)
    }

    pub fn volume(&self) -> i32 {
        self.route.volume
    }

    pub fn volume_max(&self) -> i32 {
        self.route.volume_max
    }

    pub fn is_volume_fixed(&self) -> bool {
        self.route.volume_handling == VolumeHandling::Fixed
    }
}

fn category_of<F>(route: &Route, resolve_peer: F) -> Option<DeviceCategory>
where
    F: FnOnce(&str) -> Option<BluetoothPeer>,
{
    match route.route_type {
        RouteType::Unknown
        | RouteType::RemoteTv
        | RouteType::RemoteSpeaker
        | RouteType::Group
        | RouteType::RemoteTablet
        | RouteType::RemoteTabletDocked
        | RouteType::RemoteComputer
        | RouteType::RemoteGameConsole
        | RouteType::RemoteCar
        | RouteType::RemoteSmartwatch
        | RouteType::RemoteSmartphone => Some(DeviceCategory::GenericRemote),
        RouteType::BuiltinSpeaker
        | RouteType::UsbDevice
        | RouteType::UsbHeadset
        | RouteType::UsbAccessory
        | RouteType::Dock
        | RouteType::Hdmi
        | RouteType::HdmiArc
        | RouteType::HdmiEarc
        | RouteType::WiredHeadset
        | RouteType::WiredHeadphones => Some(DeviceCategory::PhoneLocal),
        RouteType::HearingAid | RouteType::BluetoothA2dp | RouteType::BleHeadset => {
            let Some(address) = route.address.as_deref() else {
                warn!("Bluetooth route {} has no address, skipping", route.id);
                return None;
            };
            match resolve_peer(address) {
                Some(peer) => Some(DeviceCategory::Bluetooth(peer)),
                None => {
                    warn!(
                        "No cached Bluetooth peer for route {} ({}), skipping",
                        route.id, address
                    );
                    None
                }
            }
        }
        RouteType::RemoteAudioVideoReceiver => Some(DeviceCategory::ComplexAv),
        RouteType::Unrecognized(code) => {
            warn!("Unknown route type {} for route {}, skipping", code, route.id);
            None
        }
    }
}

/// Synthesizes the device for `route`, or `None` when the route cannot be presented.
///
/// The device is marked selected when the active session lists the route as selected.
pub fn classify<F>(
    route: &Arc<Route>,
    preference: Option<&PreferenceItem>,
    active_session: &RoutingSession,
    resolve_peer: F,
) -> Option<Device>
where
    F: FnOnce(&str) -> Option<BluetoothPeer>,
{
    let category = category_of(route, resolve_peer)?;
    let name = match &category {
        DeviceCategory::Bluetooth(peer) if !peer.name.is_empty() => peer.name.clone(),
        _ => route.name.clone(),
    };
    let state = if active_session.is_selected(&route.id) {
        DeviceState::Selected
    } else {
        DeviceState::Available
    };
    Some(Device {
        id: route.id.clone(),
        name,
        category,
        state,
        preference: preference.cloned(),
        route: route.clone(),
    })
}

/// Ordered device list produced by one rebuild, together with the connected device.
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    devices: Vec<Device>,
    connected: Option<usize>,
}

impl DeviceList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Classifies `routes` in order. The first selected device becomes the connected one; any
    /// later device the session reports as selected is listed as available, so a list never
    /// holds more than one selected device.
    pub fn build<F>(
        routes: &[Arc<Route>],
        preferences: &PreferenceIndex,
        active_session: &RoutingSession,
        mut resolve_peer: F,
    ) -> Self
    where
        F: FnMut(&str) -> Option<BluetoothPeer>,
    {
        let mut devices = Vec::with_capacity(routes.len());
        let mut connected = None;
        for route in routes {
            debug!(
                "Classifying route {} ({:?}), volume {}/{}",
                route.name, route.route_type, route.volume, route.volume_max
            );
            let preference = preferences.get(&route.id);
            let Some(mut device) = classify(route, preference, active_session, &mut resolve_peer)
            else {
                continue;
            };
            if device.is_selected() {
                if connected.is_none() {
                    connected = Some(devices.len());
                } else {
                    device.state = DeviceState::Available;
                }
            }
            devices.push(device);
        }
        Self { devices, connected }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn connected(&self) -> Option<&Device> {
        self.connected.map(|index| &self.devices[index])
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

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

use std::collections::HashSet;

use crate::definitions::{RouteType, VolumeHandling};

/// A discovered playback endpoint.
///
/// Routes are immutable snapshots produced by the discovery service once per discovery cycle.
/// The engine shares them behind `Arc` and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub route_type: RouteType,
    pub volume: i32,
    pub volume_max: i32,
    pub volume_handling: VolumeHandling,
    pub is_system_route: bool,
    /// Hardware address, present for Bluetooth-class routes.
    pub address: Option<String>,
    /// Opaque ids shared by every descriptor of the same physical endpoint.
    pub deduplication_ids: HashSet<String>,
}

impl Route {
    pub fn new(id: impl Into<String>, name: impl Into<String>, route_type: RouteType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            route_type,
            volume: 0,
            volume_max: 0,
            volume_handling: VolumeHandling::Fixed,
            is_system_route: false,
            address: None,
            deduplication_ids: HashSet::new(),
        }
    }

    pub fn system(mut self) -> Self {
        self.is_system_route = true;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_volume(mut self, volume: i32, volume_max: i32, handling: VolumeHandling) -> Self {
        self.volume = volume;
        self.volume_max = volume_max;
        self.volume_handling = handling;
        self
    }

    pub fn with_deduplication_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deduplication_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// One active routing context of the target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSession {
    pub id: String,
    pub name: String,
    pub is_system_session: bool,
    /// Ordered; the first entry takes precedence.
    pub selected_route_ids: Vec<String>,
    pub selectable_route_ids: Vec<String>,
    pub deselectable_route_ids: Vec<String>,
    pub volume: i32,
    pub volume_max: i32,
    pub volume_handling: VolumeHandling,
}

impl RoutingSession {
    pub fn new(id: impl Into<String>, is_system_session: bool) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            is_system_session,
            selected_route_ids: Vec::new(),
            selectable_route_ids: Vec::new(),
            deselectable_route_ids: Vec::new(),
            volume: 0,
            volume_max: 0,
            volume_handling: VolumeHandling::Fixed,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_selected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_route_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_selectable<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectable_route_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deselectable<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deselectable_route_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_volume(mut self, volume: i32, volume_max: i32, handling: VolumeHandling) -> Self {
        self.volume = volume;
        self.volume_max = volume_max;
        self.volume_handling = handling;
        self
    }

    pub fn is_selected(&self, route_id: &str) -> bool {
        self.selected_route_ids.iter().any(|id| id == route_id)
    }

    pub fn is_selectable(&self, route_id: &str) -> bool {
        self.selectable_route_ids.iter().any(|id| id == route_id)
    }

    pub fn is_deselectable(&self, route_id: &str) -> bool {
        self.deselectable_route_ids.iter().any(|id| id == route_id)
    }
}

/// Ranking hint supplied by the application for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceItem {
    pub route_id: String,
    pub suggested: bool,
}

impl PreferenceItem {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self { route_id: route_id.into(), suggested: false }
    }

    pub fn suggested(route_id: impl Into<String>) -> Self {
        Self { route_id: route_id.into(), suggested: true }
    }
}

/// The application's full listing preference, as reported by the discovery service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPreference {
    /// Listing order matters.
    pub items: Vec<PreferenceItem>,
    /// When set the application asks for the system's own ordering instead of `items`.
    pub use_system_ordering: bool,
    /// Component the presentation layer may link to for more routing options.
    pub linked_item_component: Option<String>,
}

impl ListingPreference {
    pub fn new(items: Vec<PreferenceItem>) -> Self {
        Self { items, ..Default::default() }
    }
}

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

/// Default capacity of the engine event channel.
const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Construction parameters of a [`RouteEngine`](crate::RouteEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Application whose routing is managed. `None` or empty selects `fallback_app_id`.
    pub app_id: Option<String>,
    /// Application used when the caller only cares about system routes.
    pub fallback_app_id: String,
    /// Capacity of the broadcast channel carrying engine events.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            fallback_app_id: "system".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_fallback_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.fallback_app_id = app_id.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// The application the engine will be bound to.
    pub fn resolved_app_id(&self) -> &str {
        match self.app_id.as_deref() {
            Some(app_id) if !app_id.is_empty() => app_id,
            _ => &self.fallback_app_id,
        }
    }
}

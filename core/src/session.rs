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

use crate::definitions::VolumeHandling;
use crate::route::RoutingSession;

/// Picks the session that governs default targeting for the application.
///
/// The discovery service lists the system session first and appends remote sessions linked to
/// the application, so the last entry is the most recently established remote session when one
/// exists and the system session otherwise. Returns `None` only for an empty list, which the
/// discovery service never reports.
pub fn resolve_active_session(sessions: &[RoutingSession]) -> Option<&RoutingSession> {
    sessions.last()
}

/// Whether any remote session of the application lets its volume be changed.
pub fn is_available_for_volume_control(sessions: &[RoutingSession]) -> bool {
    sessions
        .iter()
        .any(|s| !s.is_system_session && s.volume_handling != VolumeHandling::Fixed)
}

/// System sessions always get a volume bar, remote ones only when their volume is variable.
pub fn should_enable_volume_seek_bar(session: &RoutingSession) -> bool {
    session.is_system_session || session.volume_handling != VolumeHandling::Fixed
}

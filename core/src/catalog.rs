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
use std::sync::Arc;

use crate::route::Route;

/// Removes routes that describe an already listed physical endpoint.
///
/// A route is dropped when any of its deduplication ids was seen on an earlier route, so the
/// caller decides precedence purely through input order.
pub fn filter_duplicates(routes: &[Arc<Route>]) -> Vec<Arc<Route>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut filtered = Vec::with_capacity(routes.len());
    for route in routes {
        if route.deduplication_ids.iter().any(|id| seen.contains(id.as_str())) {
            continue;
        }
        seen.extend(route.deduplication_ids.iter().map(String::as_str));
        filtered.push(route.clone());
    }
    filtered
}

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
use std::sync::Arc;

use crate::route::{PreferenceItem, Route};

/// Insertion-ordered set of route ids; later duplicates are ignored.
#[derive(Default)]
struct OrderedIds<'a> {
    seen: HashSet<&'a str>,
    order: Vec<&'a str>,
}

impl<'a> OrderedIds<'a> {
    fn insert(&mut self, id: &'a str) {
        if self.seen.insert(id) {
            self.order.push(id);
        }
    }
}

/// Orders routes for presentation.
///
/// The result contains, in this order and without repeated ids:
/// 1. the selected routes,
/// 2. system routes from `available`,
/// 3. routes named by `preference` (expected to be composed already, see
///    [`compose`](crate::preference::compose)).
///
/// With an empty `preference` the remaining available routes follow in discovery order. A
/// non-empty preference lists only the routes it names besides selected and system routes.
pub fn arrange(
    selected: &[Arc<Route>],
    available: &[Arc<Route>],
    preference: &[PreferenceItem],
) -> Vec<Arc<Route>> {
    let mut ids = OrderedIds::default();

    for route in selected {
        ids.insert(&route.id);
    }
    for route in available.iter().filter(|r| r.is_system_route) {
        ids.insert(&route.id);
    }

    let mut index: HashMap<&str, &Arc<Route>> =
        HashMap::with_capacity(selected.len() + available.len());
    for route in selected.iter().chain(available) {
        index.entry(route.id.as_str()).or_insert(route);
    }

    if preference.is_empty() {
        for route in available {
            ids.insert(&route.id);
        }
    } else {
        for item in preference {
            if let Some((id, _)) = index.get_key_value(item.route_id.as_str()) {
                ids.insert(*id);
            }
        }
    }

    ids.order
        .into_iter()
        .filter_map(|id| index.get(id).map(|route| Arc::clone(*route)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::RouteType;
    use proptest::prelude::*;

    fn remote(id: &str) -> Arc<Route> {
        Arc::new(Route::new(id, id, RouteType::RemoteSpeaker))
    }

    fn system(id: &str) -> Arc<Route> {
        Arc::new(Route::new(id, id, RouteType::BuiltinSpeaker).system())
    }

    fn ids(routes: &[Arc<Route>]) -> Vec<&str> {
        routes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn selected_then_system_then_preference() {
        let a = remote("A");
        let b = remote("B");
        let c = remote("C");
        let d = system("D");
        let preference = vec![PreferenceItem::suggested("D"), PreferenceItem::new("C")];

        let arranged = arrange(&[a, b.clone()], &[b, c, d], &preference);

        assert_eq!(ids(&arranged), vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn empty_preference_falls_back_to_discovery_order() {
        let arranged = arrange(
            &[remote("sel")],
            &[remote("x"), system("sys"), remote("sel"), remote("y")],
            &[],
        );
        assert_eq!(ids(&arranged), vec!["sel", "sys", "x", "y"]);
    }

    #[test]
    fn unresolved_preference_items_are_ignored() {
        let arranged = arrange(
            &[],
            &[remote("x"), remote("y")],
            &[PreferenceItem::new("ghost"), PreferenceItem::new("y")],
        );
        assert_eq!(ids(&arranged), vec!["y"]);
    }

    #[test]
    fn selected_descriptor_wins_on_id_collision() {
        let selected = Arc::new(Route::new("A", "selected copy", RouteType::RemoteTv));
        let available = Arc::new(Route::new("A", "available copy", RouteType::RemoteTv));

        let arranged = arrange(&[selected.clone()], &[available], &[]);

        assert_eq!(arranged.len(), 1);
        assert!(Arc::ptr_eq(&arranged[0], &selected));
    }

    #[test]
    fn selected_route_missing_from_discovery_stays_visible() {
        let arranged = arrange(&[remote("gone")], &[remote("x")], &[PreferenceItem::new("x")]);
        assert_eq!(ids(&arranged), vec!["gone", "x"]);
    }

    fn arb_route() -> impl Strategy<Value = Arc<Route>> {
        ("[a-h]", any::<bool>()).prop_map(|(id, is_system)| {
            let route = Route::new(id.clone(), id, RouteType::RemoteSpeaker);
            Arc::new(if is_system { route.system() } else { route })
        })
    }

    type Inputs = (Vec<Arc<Route>>, Vec<Arc<Route>>, Vec<PreferenceItem>);

    fn arb_inputs() -> impl Strategy<Value = Inputs> {
        let item = ("[a-j]", any::<bool>())
            .prop_map(|(id, suggested)| PreferenceItem { route_id: id, suggested });
        (
            prop::collection::vec(arb_route(), 0..4),
            prop::collection::vec(arb_route(), 0..8),
            prop::collection::vec(item, 0..6),
        )
    }

    proptest! {
        #[test]
        fn arranged_ids_are_unique((selected, available, preference) in arb_inputs()) {
            let arranged = arrange(&selected, &available, &preference);
            let unique: HashSet<&str> = arranged.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(unique.len(), arranged.len());
        }

        #[test]
        fn arranging_own_output_is_idempotent((selected, available, preference) in arb_inputs()) {
            let arranged = arrange(&selected, &available, &preference);
            let again = arrange(&arranged, &arranged, &[]);
            prop_assert_eq!(ids(&again), ids(&arranged));
        }

        #[test]
        fn selected_routes_lead_the_result((selected, available, preference) in arb_inputs()) {
            let arranged = arrange(&selected, &available, &preference);
            let mut expected: Vec<&str> = Vec::new();
            for route in &selected {
                if !expected.contains(&route.id.as_str()) {
                    expected.push(&route.id);
                }
            }
            let arranged_ids = ids(&arranged);
            prop_assert_eq!(&arranged_ids[..expected.len()], &expected[..]);
        }
    }
}

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

use std::collections::HashMap;

use crate::route::{ListingPreference, PreferenceItem};

/// Moves suggested items to the front, keeping the listing order inside both groups.
pub fn compose(items: &[PreferenceItem]) -> Vec<PreferenceItem> {
    let (mut suggested, rest): (Vec<_>, Vec<_>) =
        items.iter().cloned().partition(|item| item.suggested);
    suggested.extend(rest);
    suggested
}

/// Lookup of preference items by route id, rebuilt on every preference update.
#[derive(Debug, Clone, Default)]
pub struct PreferenceIndex {
    items: HashMap<String, PreferenceItem>,
}

impl PreferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole index. An absent preference leaves it empty.
    pub fn update(&mut self, preference: Option<&ListingPreference>) {
        self.items.clear();
        if let Some(preference) = preference {
            for item in &preference.items {
                self.items.insert(item.route_id.clone(), item.clone());
            }
        }
    }

    pub fn get(&self, route_id: &str) -> Option<&PreferenceItem> {
        self.items.get(route_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_ids(items: &[PreferenceItem]) -> Vec<&str> {
        items.iter().map(|i| i.route_id.as_str()).collect()
    }

    #[test]
    fn suggested_items_move_to_front_in_listing_order() {
        let items = vec![
            PreferenceItem::new("a"),
            PreferenceItem::suggested("b"),
            PreferenceItem::new("c"),
            PreferenceItem::suggested("d"),
        ];
        assert_eq!(route_ids(&compose(&items)), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn compose_without_suggestions_keeps_order() {
        let items = vec![PreferenceItem::new("a"), PreferenceItem::new("b")];
        assert_eq!(compose(&items), items);
    }

    #[test]
    fn compose_of_nothing_is_nothing() {
        assert!(compose(&[]).is_empty());
    }

    #[test]
    fn index_is_rebuilt_and_cleared() {
        let mut index = PreferenceIndex::new();
        index.update(Some(&ListingPreference::new(vec![
            PreferenceItem::suggested("a"),
            PreferenceItem::new("b"),
        ])));
        assert_eq!(index.len(), 2);
        assert!(index.get("a").unwrap().suggested);

        index.update(Some(&ListingPreference::new(vec![PreferenceItem::new("c")])));
        assert!(index.get("a").is_none());
        assert_eq!(index.len(), 1);

        index.update(None);
        assert!(index.is_empty());
    }
}

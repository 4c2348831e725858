// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::Cell;

use serde_json::Value;

use crate::config::RegionResult;
use crate::errors::StateError;
use crate::state::{Action, AnnotationId, MappedPolicy, StateStore, UnitId};

/// Key of the split unit holding an annotation's results.
pub const RESULTS_KEY: &str = "results";
/// Key of the mapped unit holding region selection.
pub const SELECTION_KEY: &str = "selection";

/// One open annotation: its state namespace and the units every tag shares.
///
/// Results live as items of a split unit, one item per region, keyed by the
/// region id. Selection lives in a non-retaining mapped unit keyed by the
/// region's item key, so removing a region also drops its selection.
#[derive(Debug)]
pub struct AnnotationScope {
    id: AnnotationId,
    read_only: bool,
    results: UnitId,
    selection: UnitId,
    next_region: Cell<u64>,
}

impl AnnotationScope {
    /// Open the namespace and seed it with `results`. On failure the
    /// namespace is disposed again.
    pub(crate) fn open(
        store: &StateStore,
        id: AnnotationId,
        read_only: bool,
        results: &[RegionResult],
    ) -> Result<Self, StateError> {
        store.open_namespace(id)?;
        match Self::seed(store, id, read_only, results) {
            Ok(scope) => Ok(scope),
            Err(e) => {
                store.dispose_namespace(id)?;
                Err(e)
            }
        }
    }

    fn seed(
        store: &StateStore,
        id: AnnotationId,
        read_only: bool,
        results: &[RegionResult],
    ) -> Result<Self, StateError> {
        let results_unit = store.create_split(id, RESULTS_KEY)?;
        let selection = store.create_mapped(id, SELECTION_KEY, MappedPolicy::WEAK)?;
        for result in results {
            store.write(
                results_unit,
                Action::InsertBefore {
                    item: result.id.clone(),
                    value: result.to_value(),
                    before: None,
                },
            )?;
        }
        Ok(Self {
            id,
            read_only,
            results: results_unit,
            selection,
            next_region: Cell::new(0),
        })
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn results_unit(&self) -> UnitId {
        self.results
    }

    pub fn selection_unit(&self) -> UnitId {
        self.selection
    }

    /// All results in collection order.
    pub fn results(&self, store: &StateStore) -> Result<Vec<RegionResult>, StateError> {
        Ok(decode_results(&store.read(self.results)?))
    }

    /// Results produced by the control named `from_name`, in collection order.
    pub fn results_for(
        &self,
        store: &StateStore,
        from_name: &str,
    ) -> Result<Vec<RegionResult>, StateError> {
        Ok(self
            .results(store)?
            .into_iter()
            .filter(|result| result.from_name == from_name)
            .collect())
    }

    pub fn result(&self, store: &StateStore, id: &str) -> Result<Option<RegionResult>, StateError> {
        Ok(self
            .results(store)?
            .into_iter()
            .find(|result| result.id == id))
    }

    /// A region id not yet used in this annotation.
    pub fn next_region_id(&self, store: &StateStore) -> Result<String, StateError> {
        let taken: Vec<String> = store
            .items(self.results)?
            .into_iter()
            .map(|(item, _)| item)
            .collect();
        loop {
            let n = self.next_region.get() + 1;
            self.next_region.set(n);
            let candidate = format!("region-{}", n);
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Unit key of a region's item, as used by the selection unit.
    pub fn region_key(region_id: &str) -> String {
        format!("{}/{}", RESULTS_KEY, region_id)
    }

    pub fn select(&self, store: &StateStore, region_id: &str) -> Result<bool, StateError> {
        store.write(
            self.selection,
            Action::SetEntry {
                key: Self::region_key(region_id),
                value: Value::Bool(true),
            },
        )
    }

    pub fn deselect(&self, store: &StateStore, region_id: &str) -> Result<bool, StateError> {
        store.write(
            self.selection,
            Action::DeleteEntry {
                key: Self::region_key(region_id),
            },
        )
    }

    /// Ids of selected regions, sorted.
    pub fn selected(&self, store: &StateStore) -> Result<Vec<String>, StateError> {
        let prefix = format!("{}/", RESULTS_KEY);
        Ok(match store.read(self.selection)? {
            Value::Object(entries) => entries
                .keys()
                .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Decode the array read from a results unit, skipping malformed items.
pub fn decode_results(value: &Value) -> Vec<RegionResult> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(RegionResult::from_value).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(id: &str, from_name: &str) -> RegionResult {
        RegionResult {
            id: id.to_string(),
            from_name: from_name.to_string(),
            to_name: "img".to_string(),
            result_type: "rectangle".to_string(),
            value: json!({"x": 1}),
        }
    }

    #[test]
    fn test_open_seeds_results_in_order() {
        let store = StateStore::new();
        let scope = AnnotationScope::open(
            &store,
            AnnotationId(1),
            false,
            &[result("b", "box"), result("a", "box"), result("c", "other")],
        )
        .unwrap();

        let ids: Vec<String> = scope
            .results(&store)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(scope.results_for(&store, "other").unwrap().len(), 1);
        assert!(scope.result(&store, "a").unwrap().is_some());
        assert!(scope.result(&store, "zzz").unwrap().is_none());
    }

    #[test]
    fn test_open_rolls_back_on_duplicate_ids() {
        let store = StateStore::new();
        let err = AnnotationScope::open(
            &store,
            AnnotationId(1),
            false,
            &[result("a", "box"), result("a", "box")],
        )
        .unwrap_err();
        assert!(matches!(err, StateError::DuplicateKey(_)));
        assert!(!store.has_namespace(AnnotationId(1)));
    }

    #[test]
    fn test_next_region_id_skips_taken_ids() {
        let store = StateStore::new();
        let scope =
            AnnotationScope::open(&store, AnnotationId(1), false, &[result("region-1", "box")])
                .unwrap();
        assert_eq!(scope.next_region_id(&store).unwrap(), "region-2");
        assert_eq!(scope.next_region_id(&store).unwrap(), "region-3");
    }

    #[test]
    fn test_selection_follows_region_removal() {
        let store = StateStore::new();
        let scope = AnnotationScope::open(
            &store,
            AnnotationId(1),
            false,
            &[result("a", "box"), result("b", "box")],
        )
        .unwrap();

        scope.select(&store, "a").unwrap();
        scope.select(&store, "b").unwrap();
        assert_eq!(scope.selected(&store).unwrap(), vec!["a", "b"]);

        store
            .write(
                scope.results_unit(),
                Action::Remove {
                    item: "a".to_string(),
                },
            )
            .unwrap();
        assert_eq!(scope.selected(&store).unwrap(), vec!["b"]);

        assert!(scope.deselect(&store, "b").unwrap());
        assert!(scope.selected(&store).unwrap().is_empty());
    }
}

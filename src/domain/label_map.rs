// ============================================================
// Layer 3 — Label Map
// ============================================================
// Maps label strings to dense class indices 0..n.
//
// The map is built from the TRAINING split only, from the
// sorted set of distinct labels, so "0" < "1" and
// "figurative" < "irony" < "regular" < "sarcasm".
//
// Cross-evaluation uses the same map to decide which rows of
// a second dataset can be scored at all: rows whose label the
// model never saw are dropped, the rest keep their order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::example::LabeledExample;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from any label iterator; duplicates collapse, order is sorted.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            labels: unique.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn from_examples(examples: &[LabeledExample]) -> Self {
        Self::from_labels(examples.iter().map(|e| e.label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }
}

/// Result of restricting an evaluation set to a training label space.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    pub kept:    Vec<LabeledExample>,
    /// Unseen label → number of rows dropped for it.
    pub dropped: BTreeMap<String, usize>,
}

impl LabelFilter {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Keep only rows whose label is in `labels`, preserving relative order.
pub fn retain_known_labels(examples: Vec<LabeledExample>, labels: &LabelMap) -> LabelFilter {
    let mut dropped: BTreeMap<String, usize> = BTreeMap::new();
    let kept = examples
        .into_iter()
        .filter(|e| {
            if labels.contains(&e.label) {
                true
            } else {
                *dropped.entry(e.label.clone()).or_insert(0) += 1;
                false
            }
        })
        .collect();
    LabelFilter { kept, dropped }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Maps selected identifiers (digests) back to loaded records.
//!
//! Policy is strict: an unknown identifier fails the whole selection and the
//! error names every unknown identifier, so a caller can never end up with a
//! batch shorter than what was selected. Repeated identifiers collapse to
//! their first occurrence.

use std::collections::HashSet;

use crate::error::AnchorError;
use crate::record::{FingerprintBatch, FingerprintSet};

/// Resolves selections against one [`FingerprintSet`].
#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'a> {
    set: &'a FingerprintSet,
}

impl<'a> SelectionResolver<'a> {
    /// Resolver over `set`.
    pub fn new(set: &'a FingerprintSet) -> Self {
        Self { set }
    }

    /// Resolve `selected` digests into a batch in selection order.
    pub fn resolve<I, S>(&self, selected: I) -> Result<FingerprintBatch, AnchorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut unknown = Vec::new();
        for id in selected {
            let id = id.as_ref();
            if !seen.insert(id.to_string()) {
                continue;
            }
            match self.set.get(id) {
                Some(record) => records.push(record.clone()),
                None => unknown.push(id.to_string()),
            }
        }
        if seen.is_empty() {
            return Err(AnchorError::EmptySelection);
        }
        if !unknown.is_empty() {
            return Err(AnchorError::UnknownSelection {
                unknown,
                requested: seen.len(),
            });
        }
        FingerprintBatch::new(records)
    }

    /// Select every loaded record in payload order.
    pub fn resolve_all(&self) -> Result<FingerprintBatch, AnchorError> {
        FingerprintBatch::new(self.set.records().to_vec())
    }
}

// vim: tw=80
use std::slice;

use crate::{Expectation, Invocation};

/// Every expectation declared on one mock, in declaration order.
///
/// Expectations are never removed.  A later declaration shadows earlier ones
/// for the calls they both match, but the earlier ones still take part in
/// verification, unless the later one has exactly the same call pattern.
#[derive(Debug, Default)]
pub struct ExpectationStore(Vec<Expectation>);

impl ExpectationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `expectation`, overriding any earlier one with the same call
    /// pattern.
    pub(crate) fn push(&mut self, expectation: Expectation) -> &mut Expectation
    {
        for earlier in self.0.iter_mut() {
            earlier.override_if_shadowed_by(&expectation);
        }
        let idx = self.0.len();
        self.0.push(expectation);
        &mut self.0[idx]
    }

    /// Find the expectation that governs `invocation`: the most recently
    /// declared one that matches.
    pub fn resolve(&self, invocation: &Invocation) -> Option<&Expectation> {
        self.0.iter()
            .rev()
            .find(|e| e.matches(invocation))
    }

    /// Describe every expectation on the invoked member that rejected
    /// `invocation`, for diagnostics.
    pub(crate) fn near_misses(&self, invocation: &Invocation) -> Vec<String> {
        self.0.iter()
            .filter_map(|e| e.near_miss(invocation))
            .collect()
    }

    pub fn iter(&self) -> slice::Iter<'_, Expectation> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> IntoIterator for &'a ExpectationStore {
    type Item = &'a Expectation;
    type IntoIter = slice::Iter<'a, Expectation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

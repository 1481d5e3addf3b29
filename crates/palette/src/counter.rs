use footprint_common::ColorCodeField;
use std::collections::BTreeMap;

/// Receives one call per categorical classification. Diagnostic only; the
/// animation never reads it.
pub trait CategoryCounter {
    fn record(&mut self, field: ColorCodeField, value: &str);
}

impl<C: CategoryCounter + ?Sized> CategoryCounter for &mut C {
    fn record(&mut self, field: ColorCodeField, value: &str) {
        (**self).record(field, value);
    }
}

/// Counter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCounter;

impl CategoryCounter for NoopCounter {
    fn record(&mut self, _field: ColorCodeField, _value: &str) {}
}

/// Occurrence counts keyed by field and raw value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTally {
    counts: BTreeMap<(ColorCodeField, String), u64>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occurrences of `value` for `field`.
    pub fn get(&self, field: ColorCodeField, value: &str) -> u64 {
        self.counts
            .get(&(field, value.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// All `(value, count)` pairs recorded for `field`, sorted by value.
    pub fn values(&self, field: ColorCodeField) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .filter(move |((f, _), _)| *f == field)
            .map(|((_, v), n)| (v.as_str(), *n))
    }

    /// Total number of recorded classifications.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

impl CategoryCounter for CategoryTally {
    fn record(&mut self, field: ColorCodeField, value: &str) {
        *self.counts.entry((field, value.to_string())).or_insert(0) += 1;
    }
}

//! Query results that carry their own degradation status.

use serde::Serialize;

/// How completely a scan ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanStatus {
    /// Every candidate was examined
    Complete,
    /// Some candidates could not be read or stat'ed and were skipped
    Partial { skipped: usize },
    /// The scan could not run at all; the value is empty
    Failed,
}

/// A query value plus the status of the scan that produced it.
///
/// An empty value means "no match or scan failed"; `status` tells the two
/// apart for callers that care.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub status: ScanStatus,
}

/// Ordered repo-relative file paths
pub type SearchResult = Outcome<Vec<String>>;

impl<T> Outcome<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            status: ScanStatus::Complete,
        }
    }

    /// Complete if nothing was skipped, partial otherwise
    pub fn with_skipped(value: T, skipped: usize) -> Self {
        let status = if skipped == 0 {
            ScanStatus::Complete
        } else {
            ScanStatus::Partial { skipped }
        };
        Self { value, status }
    }

    pub fn is_degraded(&self) -> bool {
        self.status != ScanStatus::Complete
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: Default> Outcome<T> {
    pub fn failed() -> Self {
        Self {
            value: T::default(),
            status: ScanStatus::Failed,
        }
    }
}

impl Outcome<Vec<String>> {
    pub fn files(&self) -> &[String] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Fold a sub-scan's status into this one; a failed sub-scan counts as
    /// one skipped item
    pub(crate) fn absorb_status(&mut self, other: ScanStatus) {
        self.status = match (self.status, other) {
            (ScanStatus::Failed, _) => ScanStatus::Failed,
            (status, ScanStatus::Complete) => status,
            (status, other) => ScanStatus::Partial {
                skipped: status.skipped() + other.skipped().max(1),
            },
        };
    }
}

impl ScanStatus {
    fn skipped(self) -> usize {
        match self {
            ScanStatus::Partial { skipped } => skipped,
            _ => 0,
        }
    }
}

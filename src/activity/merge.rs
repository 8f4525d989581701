use std::collections::HashSet;

use tracing::debug;

use super::entities::{Activity, ActivitySet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub admitted: usize,
    pub duplicates: usize,
}

/// Adds every candidate whose signature is not yet known. Signatures admitted from the batch
/// count as known immediately, so the first of several identical candidates wins. The result is
/// not sorted.
pub fn merge(
    existing: ActivitySet,
    candidates: impl IntoIterator<Item = Activity>,
) -> (ActivitySet, MergeReport) {
    let mut seen = existing.iter().map(Activity::signature).collect::<HashSet<_>>();
    let mut merged = existing;
    let mut report = MergeReport::default();

    for candidate in candidates {
        if seen.insert(candidate.signature()) {
            merged.push(candidate);
            report.admitted += 1;
        } else {
            debug!(
                "Duplicate run on {} ({} km, {})",
                candidate.iso_date, candidate.distance, candidate.time
            );
            report.duplicates += 1;
        }
    }

    (merged, report)
}

//! Partitioning of candidates by environment

use std::collections::BTreeMap;

use crate::models::deployment::{ReplacementCandidate, ReplacementGroup};

/// Split candidates into one group per environment.
///
/// Groups come back ordered by environment name; each keeps the input order of
/// its candidates. Every candidate lands in exactly one group.
pub fn group_by_environment(candidates: Vec<ReplacementCandidate>) -> Vec<ReplacementGroup> {
    let mut groups: BTreeMap<String, Vec<ReplacementCandidate>> = BTreeMap::new();

    for candidate in candidates {
        groups
            .entry(candidate.record.environment.clone())
            .or_default()
            .push(candidate);
    }

    groups
        .into_iter()
        .map(|(environment, candidates)| ReplacementGroup {
            environment,
            candidates,
        })
        .collect()
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Month;

// ---------------------------------------------------------------------------
// CohortMember — (entity_id, category, platform_id) observed at baseline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CohortMember {
    pub entity_id: String,
    pub category: String,
    pub platform_id: String,
}

// ---------------------------------------------------------------------------
// Cohort — fixed entity snapshot keyed on a baseline month
// ---------------------------------------------------------------------------

/// The distinct entity tuples present at the baseline month.
///
/// Immutable once built: a new baseline means a new `Cohort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    baseline: Month,
    members: BTreeSet<CohortMember>,
}

impl Cohort {
    pub fn new(baseline: Month, members: impl IntoIterator<Item = CohortMember>) -> Self {
        Self {
            baseline,
            members: members.into_iter().collect(),
        }
    }

    pub fn baseline(&self) -> Month {
        self.baseline
    }

    pub fn members(&self) -> &BTreeSet<CohortMember> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct entity ids, regardless of category or platform.
    pub fn entity_ids(&self) -> BTreeSet<&str> {
        self.members.iter().map(|m| m.entity_id.as_str()).collect()
    }

    pub fn contains_entity(&self, entity_id: &str) -> bool {
        self.members.iter().any(|m| m.entity_id == entity_id)
    }
}

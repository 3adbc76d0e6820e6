//! Cascading category → platform filter domains and selection readiness.
//!
//! Domains are derived from the cohort snapshot alone, so they are pure
//! functions of the baseline month. Every upstream change re-runs the whole
//! cascade through [`Readiness::resolve`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{Cohort, FilterSelection};

/// Distinct categories in the cohort, ascending.
pub fn categories_for(cohort: &Cohort) -> Vec<String> {
    cohort
        .members()
        .iter()
        .map(|m| m.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct platforms in the cohort whose category is selected, ascending.
///
/// Empty when no categories are selected.
pub fn platforms_for(cohort: &Cohort, selected_categories: &BTreeSet<String>) -> Vec<String> {
    if selected_categories.is_empty() {
        return Vec::new();
    }
    cohort
        .members()
        .iter()
        .filter(|m| selected_categories.contains(&m.category))
        .map(|m| m.platform_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

/// How far the selection cascade has progressed.
///
/// Advances `NoCategories → CategoriesChosen → PlatformsAvailable →
/// ReadyToAggregate`, one step per non-empty set. Any empty set stops the
/// cascade at that stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    /// No category chosen (or none available in the cohort).
    NoCategories { available: Vec<String> },
    /// Categories chosen but they expose no platforms.
    CategoriesChosen { categories: BTreeSet<String> },
    /// Platforms available but none chosen.
    PlatformsAvailable {
        categories: BTreeSet<String>,
        available: Vec<String>,
    },
    /// Both sets non-empty; aggregation may run.
    ReadyToAggregate { selection: FilterSelection },
}

impl Readiness {
    /// Run the cascade against the cohort's live domains.
    ///
    /// Choices outside the current domain are dropped. `platforms == None`
    /// selects every platform available for the chosen categories.
    pub fn resolve(
        cohort: &Cohort,
        categories: &BTreeSet<String>,
        platforms: Option<&BTreeSet<String>>,
    ) -> Self {
        let category_domain = categories_for(cohort);
        let chosen: BTreeSet<String> = categories
            .iter()
            .filter(|c| category_domain.binary_search(*c).is_ok())
            .cloned()
            .collect();
        debug!(
            available = category_domain.len(),
            chosen = chosen.len(),
            "resolved category domain"
        );
        if chosen.is_empty() {
            return Readiness::NoCategories {
                available: category_domain,
            };
        }

        let platform_domain = platforms_for(cohort, &chosen);
        if platform_domain.is_empty() {
            return Readiness::CategoriesChosen { categories: chosen };
        }

        let chosen_platforms: BTreeSet<String> = match platforms {
            Some(requested) => platform_domain
                .iter()
                .filter(|p| requested.contains(*p))
                .cloned()
                .collect(),
            None => platform_domain.iter().cloned().collect(),
        };
        debug!(
            available = platform_domain.len(),
            chosen = chosen_platforms.len(),
            "resolved platform domain"
        );
        if chosen_platforms.is_empty() {
            return Readiness::PlatformsAvailable {
                categories: chosen,
                available: platform_domain,
            };
        }

        Readiness::ReadyToAggregate {
            selection: FilterSelection {
                categories: chosen,
                platforms: chosen_platforms,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::ReadyToAggregate { .. })
    }

    /// The selection to aggregate with, once ready.
    pub fn selection(&self) -> Option<&FilterSelection> {
        match self {
            Readiness::ReadyToAggregate { selection } => Some(selection),
            _ => None,
        }
    }

    /// Informational message for a state still awaiting input.
    pub fn awaiting(&self) -> Option<&'static str> {
        match self {
            Readiness::NoCategories { available } if available.is_empty() => {
                Some("No categories available for the baseline month.")
            }
            Readiness::NoCategories { .. } => {
                Some("Select at least one category to view data.")
            }
            Readiness::CategoriesChosen { .. } => {
                Some("No platforms available for the selected categories.")
            }
            Readiness::PlatformsAvailable { .. } => {
                Some("Select at least one platform to view data.")
            }
            Readiness::ReadyToAggregate { .. } => None,
        }
    }
}

//! Weighted query plan over (role × location).

use serde::Serialize;

use crate::config::CrawlerConfig;
use crate::error::{CrawlError, Result};
use crate::types::{Location, Query, Role};

/// A role with the per-location target it was assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRole {
    pub role: Role,
    pub target_per_location: usize,
}

/// Ordered roles crossed with a fixed location set.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    roles: Vec<PlannedRole>,
    locations: Vec<Location>,
}

impl QueryPlan {
    pub fn build(roles: Vec<Role>, locations: Vec<Location>, config: &CrawlerConfig) -> Result<Self> {
        if roles.is_empty() {
            return Err(CrawlError::InvalidPlan {
                reason: "no roles".to_string(),
            });
        }
        if locations.is_empty() {
            return Err(CrawlError::InvalidPlan {
                reason: "no locations".to_string(),
            });
        }
        if roles.iter().any(|r| !r.weight.is_finite() || r.weight < 0.0) {
            return Err(CrawlError::InvalidPlan {
                reason: "role weights must be finite and non-negative".to_string(),
            });
        }

        let mean_weight = roles.iter().map(|r| r.weight).sum::<f64>() / roles.len() as f64;
        if mean_weight <= 0.0 {
            return Err(CrawlError::InvalidPlan {
                reason: "mean role weight must be positive".to_string(),
            });
        }

        let roles = roles
            .into_iter()
            .map(|role| {
                let target_per_location = per_location_target(
                    config.base_target,
                    role.weight,
                    mean_weight,
                    locations.len(),
                    config.min_target,
                    config.max_target,
                );
                PlannedRole {
                    role,
                    target_per_location,
                }
            })
            .collect();

        Ok(Self { roles, locations })
    }

    pub fn roles(&self) -> &[PlannedRole] {
        &self.roles
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role_index(&self, title: &str) -> Option<usize> {
        self.roles.iter().position(|r| r.role.title == title)
    }

    /// One query per location for the role at `index`.
    pub fn queries_for(&self, index: usize) -> Vec<Query> {
        let Some(planned) = self.roles.get(index) else {
            return Vec::new();
        };
        self.locations
            .iter()
            .map(|location| {
                Query::new(
                    planned.role.title.clone(),
                    location.clone(),
                    planned.target_per_location,
                )
            })
            .collect()
    }
}

/// `floor(base × weight / mean)` spread evenly across locations, clamped.
pub fn per_location_target(
    base_target: usize,
    weight: f64,
    mean_weight: f64,
    location_count: usize,
    min_target: usize,
    max_target: usize,
) -> usize {
    let per_query = (base_target as f64 * (weight / mean_weight)).floor() as usize;
    let per_location = per_query / location_count.max(1);
    per_location.clamp(min_target, max_target)
}

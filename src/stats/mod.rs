//! Occupancy statistics.
//!
//! Everything in here is a pure function over already-materialized record
//! collections. Callers fetch check-ins and check-outs first, then hand the
//! vectors to [`compute_stats`] together with the instant to treat as "now".

pub mod aggregator;
pub mod buildings;
pub mod index;
pub mod summary;

use chrono::Weekday;
use chrono_tz::Tz;
use thiserror::Error;

use crate::config::ReportingConfig;

pub use aggregator::{compute_stats, DailyStats, DateCount, OccupancyReport};
pub use buildings::{AreaMatcher, BuildingCatalog, BuildingCategory, BuildingTally, OTHER_AREAS};
pub use index::DateBucketIndex;
pub use summary::{week_over_week, week_start_of, DaySummary, WeekComparison, WeeklySummary};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Invalid statistics input: {0}")]
    InvalidInput(String),
}

/// Calendar and catalog settings shared by every aggregation call
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub timezone: Tz,
    pub week_start: Weekday,
    pub catalog: BuildingCatalog,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Los_Angeles,
            week_start: Weekday::Sun,
            catalog: BuildingCatalog::default(),
        }
    }
}

impl ReportOptions {
    pub fn from_config(config: &ReportingConfig) -> Result<Self, StatsError> {
        let timezone = parse_timezone(&config.timezone)?;
        let week_start = config.week_start.parse::<Weekday>().map_err(|_| {
            StatsError::InvalidInput(format!("unknown week start day '{}'", config.week_start))
        })?;

        Ok(Self {
            timezone,
            week_start,
            catalog: BuildingCatalog::default(),
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, StatsError> {
    name.parse::<Tz>()
        .map_err(|e| StatsError::InvalidInput(format!("unknown timezone '{}': {}", name, e)))
}

pub mod joined;
pub mod json;
pub mod listings;
pub mod name;
pub mod patterns;
pub mod rating;
pub mod record;
pub mod snapshot;

// Re-export common types
pub use record::{build_record, ResultRecord};
pub use snapshot::Snapshot;

use tracing::debug;

use crate::cli::config::ExtractionSettings;
use crate::error::ExtractError;
use patterns::Patterns;

/// One extraction strategy of a resolver cascade
pub type Strategy<T> = fn(&Snapshot, &ExtractionContext) -> Option<T>;

/// Run-wide, read-only inputs shared by every resolver
#[derive(Debug)]
pub struct ExtractionContext {
    pub current_year: i32,
    pub settings: ExtractionSettings,
    pub patterns: Patterns,
}

impl ExtractionContext {
    pub fn new(settings: ExtractionSettings, current_year: i32) -> Result<Self, regex::Error> {
        let patterns = Patterns::new(&settings)?;
        Ok(Self {
            current_year,
            settings,
            patterns,
        })
    }

    /// Accept a year within `[earliest_year, current_year]`
    pub fn validate_year(&self, year: i32) -> Result<i32, ExtractError> {
        if (self.settings.earliest_year..=self.current_year).contains(&year) {
            Ok(year)
        } else {
            Err(ExtractError::Validation {
                field: "joined_year",
                value: year.to_string(),
            })
        }
    }

    /// Accept a listing count within `(0, max_listing_count]`
    pub fn validate_listing_count(&self, count: u32) -> Result<u32, ExtractError> {
        if count > 0 && count <= self.settings.max_listing_count {
            Ok(count)
        } else {
            Err(ExtractError::Validation {
                field: "listing_count",
                value: count.to_string(),
            })
        }
    }
}

/// Evaluate strategies in order and return the first value produced
pub fn cascade<T>(
    field: &str,
    strategies: &[(&str, Strategy<T>)],
    snapshot: &Snapshot,
    context: &ExtractionContext,
) -> Option<T> {
    for (label, strategy) in strategies {
        if let Some(value) = strategy(snapshot, context) {
            debug!(field, strategy = *label, "Field resolved");
            return Some(value);
        }
    }

    debug!(field, "Field unresolved");
    None
}

#[cfg(test)]
pub(crate) fn test_context() -> ExtractionContext {
    ExtractionContext::new(ExtractionSettings::default(), 2025).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds_are_inclusive() {
        let context = test_context();
        assert!(context.validate_year(2007).is_ok());
        assert!(context.validate_year(2025).is_ok());
        assert!(context.validate_year(2006).is_err());
        assert!(context.validate_year(2030).is_err());
    }

    #[test]
    fn test_listing_count_bounds() {
        let context = test_context();
        assert!(context.validate_listing_count(0).is_err());
        assert_eq!(context.validate_listing_count(1000).unwrap(), 1000);
        assert!(context.validate_listing_count(1001).is_err());
    }

    #[test]
    fn test_cascade_stops_at_first_hit() {
        fn miss(_: &Snapshot, _: &ExtractionContext) -> Option<u32> {
            None
        }
        fn first(_: &Snapshot, _: &ExtractionContext) -> Option<u32> {
            Some(1)
        }
        fn second(_: &Snapshot, _: &ExtractionContext) -> Option<u32> {
            Some(2)
        }

        let strategies: &[(&str, Strategy<u32>)] = &[("miss", miss), ("first", first), ("second", second)];
        let snapshot = Snapshot::default();
        assert_eq!(cascade("test", strategies, &snapshot, &test_context()), Some(1));
        assert_eq!(cascade("test", &strategies[..1], &snapshot, &test_context()), None);
    }
}

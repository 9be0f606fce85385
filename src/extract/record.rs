use serde::Serialize;

use crate::crawler::task::ScrapeTask;
use crate::error::NavigationError;
use crate::extract::{joined, listings, name, rating, ExtractionContext, Snapshot};
use crate::storage::debug::artifact_path;

/// Extraction result for one input URL, in output column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub url: String,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub joined_year: Option<i32>,
    pub years_active: Option<i32>,
    pub listing_count: Option<u32>,
    pub notes: String,
}

impl ResultRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            rating: None,
            joined_year: None,
            years_active: None,
            listing_count: None,
            notes: String::new(),
        }
    }

    /// Record for a page that could not be captured
    pub fn failed(url: impl Into<String>, error: &NavigationError) -> Self {
        let mut record = Self::new(url);
        record.notes = format!("Error: {}", error);
        record
    }

    /// Names of the extracted fields that stayed unknown
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.rating.is_none() {
            missing.push("rating");
        }
        if self.joined_year.is_none() {
            missing.push("joined_year");
        }
        if self.listing_count.is_none() {
            missing.push("listing_count");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Run every resolver against one snapshot and assemble the record
pub fn build_record(task: &ScrapeTask, snapshot: &Snapshot, context: &ExtractionContext) -> ResultRecord {
    let mut record = ResultRecord::new(task.url.as_str());

    record.name = name::resolve(snapshot, context);
    record.rating = rating::resolve(snapshot, context);
    record.listing_count = listings::resolve(snapshot, context);
    record.joined_year = joined::resolve(snapshot, context);
    record.years_active = record
        .joined_year
        .filter(|year| *year <= context.current_year)
        .map(|year| context.current_year - year);

    let missing = record.missing_fields();
    if !missing.is_empty() {
        record.notes = format!(
            "Missing fields: {}. See {}",
            missing.join(", "),
            artifact_path(task.index)
        );
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_context;

    fn task() -> ScrapeTask {
        ScrapeTask::new(3, "https://www.airbnb.fr/users/show/42")
    }

    #[test]
    fn test_notes_list_exactly_the_missing_fields() {
        let snapshot = Snapshot::new("Membre depuis 2016", "").with_heading("Profil de Julie");
        let record = build_record(&task(), &snapshot, &test_context());

        assert_eq!(record.name.as_deref(), Some("Julie"));
        assert_eq!(record.joined_year, Some(2016));
        assert_eq!(record.years_active, Some(9));
        assert_eq!(record.missing_fields(), vec!["rating", "listing_count"]);

        let listed = record
            .notes
            .strip_prefix("Missing fields: ")
            .and_then(|rest| rest.split(". ").next())
            .unwrap();
        assert_eq!(listed, "rating, listing_count");
        assert!(record.notes.ends_with("debug/page_3.html"));
    }

    #[test]
    fn test_complete_record_has_empty_notes() {
        let snapshot = Snapshot::new("Member since 2012 · 8 listings", "")
            .with_heading("Tom")
            .with_structured_data(r#"{"aggregateRating":{"ratingValue":"4,92"}}"#);
        let record = build_record(&task(), &snapshot, &test_context());

        assert_eq!(record.rating, Some(4.92));
        assert_eq!(record.listing_count, Some(8));
        assert_eq!(record.years_active, Some(13));
        assert!(record.notes.is_empty());
        assert!(record.is_complete());
    }

    #[test]
    fn test_years_active_absent_without_joined_year() {
        let record = build_record(&task(), &Snapshot::new("", ""), &test_context());
        assert_eq!(record.joined_year, None);
        assert_eq!(record.years_active, None);
        assert_eq!(record.missing_fields().len(), 4);
    }

    #[test]
    fn test_resolvers_are_pure() {
        let snapshot = Snapshot::new("Note globale 4,7 · 5 annonces · Membre depuis mai 2019", "<h1>x</h1>")
            .with_heading("Quelques informations sur Paul")
            .with_hydration_state(r#"{"props":{"user":{"firstName":"Paul","createdAt":"2019-05-01"}}}"#);
        let context = test_context();

        let first = build_record(&task(), &snapshot, &context);
        let second = build_record(&task(), &snapshot, &context);
        assert_eq!(first, second);
        assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }

    #[test]
    fn test_failed_record_carries_error() {
        let error = NavigationError::timeout("https://www.airbnb.fr/users/show/42", std::time::Duration::from_secs(120));
        let record = ResultRecord::failed("https://www.airbnb.fr/users/show/42", &error);
        assert!(record.notes.starts_with("Error: "));
        assert!(record.notes.contains("navigation timeout"));
        assert_eq!(record.name, None);
    }
}

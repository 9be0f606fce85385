use serde_json::Value;
use tracing::debug;

use crate::error::ExtractError;
use crate::extract::json::parse_json;
use crate::extract::{cascade, ExtractionContext, Snapshot, Strategy};

pub const STRATEGIES: &[(&str, Strategy<f64>)] = &[
    ("structured data", from_structured_data),
    ("text pattern", from_text_patterns),
];

/// Resolve the overall rating
pub fn resolve(snapshot: &Snapshot, context: &ExtractionContext) -> Option<f64> {
    cascade("rating", STRATEGIES, snapshot, context)
}

/// Parse a decimal that may use a comma separator
pub fn parse_decimal(raw: &str) -> Result<f64, ExtractError> {
    let normalized = raw.trim().replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ExtractError::Validation {
            field: "rating",
            value: raw.to_string(),
        }),
    }
}

fn aggregate_rating(item: &Value) -> Option<f64> {
    let value = item.get("aggregateRating")?.get("ratingValue")?;
    let parsed = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| ExtractError::Validation {
            field: "rating",
            value: n.to_string(),
        }),
        Value::String(s) => parse_decimal(s),
        other => Err(ExtractError::Validation {
            field: "rating",
            value: other.to_string(),
        }),
    };

    parsed
        .map_err(|e| debug!("Skipping aggregate rating: {}", e))
        .ok()
}

fn from_structured_data(snapshot: &Snapshot, _context: &ExtractionContext) -> Option<f64> {
    snapshot.structured_data_blocks().iter().find_map(|block| {
        let document = parse_json(block, "structured data block")
            .map_err(|e| debug!("Skipping block: {}", e))
            .ok()?;

        match &document {
            Value::Array(items) => items.iter().find_map(aggregate_rating),
            item => aggregate_rating(item),
        }
    })
}

fn from_text_patterns(snapshot: &Snapshot, context: &ExtractionContext) -> Option<f64> {
    let pool = snapshot.text_and_markup();

    context.patterns.rating_phrases.iter().find_map(|re| {
        let caps = re.captures(&pool)?;
        parse_decimal(caps.get(1)?.as_str()).ok()
    })
}

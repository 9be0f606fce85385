use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;
use std::ops::ControlFlow;
use tracing::debug;

use crate::extract::json::walk_breadth_first;
use crate::extract::{cascade, ExtractionContext, Snapshot, Strategy};

/// Epoch values above this are milliseconds
const MILLIS_THRESHOLD: f64 = 1e12;

pub const STRATEGIES: &[(&str, Strategy<i32>)] = &[
    ("hydration", from_hydration),
    ("joined phrase", from_joined_phrases),
    ("keyword proximity", from_keyword_proximity),
];

/// Resolve the year the host joined
pub fn resolve(snapshot: &Snapshot, context: &ExtractionContext) -> Option<i32> {
    cascade("joined_year", STRATEGIES, snapshot, context)
}

fn accept(year: i32, context: &ExtractionContext) -> Option<i32> {
    context
        .validate_year(year)
        .map_err(|e| debug!("Discarding year: {}", e))
        .ok()
}

/// First `19xx`/`20xx` in a string, if in range
fn year_from_text(text: &str, context: &ExtractionContext) -> Option<i32> {
    let found = context.patterns.year.find(text)?;
    accept(found.as_str().parse().ok()?, context)
}

/// Coerce a JSON value to a year: a literal year, an epoch timestamp in
/// seconds or milliseconds, or a string containing a year
fn year_from_value(value: &Value, context: &ExtractionContext) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(literal) = n.as_i64().filter(|y| (1000..=9999).contains(y)) {
                return accept(literal as i32, context);
            }

            let epoch = n.as_f64()?;
            let instant = if epoch > MILLIS_THRESHOLD {
                DateTime::<Utc>::from_timestamp_millis(epoch as i64)
            } else {
                DateTime::<Utc>::from_timestamp(epoch as i64, 0)
            }?;
            accept(instant.year(), context)
        }
        Value::String(s) => year_from_text(s, context),
        _ => None,
    }
}

fn from_hydration(snapshot: &Snapshot, context: &ExtractionContext) -> Option<i32> {
    let state = snapshot.hydration()?;
    let mut loose = None;

    let keyed = walk_breadth_first(state, |key, value| {
        if let Some(key) = key {
            if context.patterns.join_key.is_match(key) {
                if let Some(year) = year_from_value(value, context) {
                    return ControlFlow::Break(year);
                }
            }
        }

        if loose.is_none() {
            if let Value::String(s) = value {
                loose = year_from_text(s, context);
            }
        }
        ControlFlow::Continue(())
    });

    keyed.or(loose)
}

fn from_joined_phrases(snapshot: &Snapshot, context: &ExtractionContext) -> Option<i32> {
    let sources = [snapshot.body_text(), snapshot.raw_markup()];

    context.patterns.joined_phrases.iter().find_map(|re| {
        sources.iter().find_map(|source| {
            let caps = re.captures(source)?;
            accept(caps.get(1)?.as_str().parse().ok()?, context)
        })
    })
}

fn from_keyword_proximity(snapshot: &Snapshot, context: &ExtractionContext) -> Option<i32> {
    let pool = snapshot.text_and_markup();
    let caps = context.patterns.joined_proximity.captures(&pool)?;
    accept(caps.get(1)?.as_str().parse().ok()?, context)
}

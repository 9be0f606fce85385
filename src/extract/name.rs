use crate::extract::json::find_keyed_string;
use crate::extract::patterns::NAME_KEYS;
use crate::extract::{cascade, ExtractionContext, Snapshot, Strategy};

const HYDRATION_DEPTH: usize = 8;

pub const STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("hydration", from_hydration),
    ("labelled phrase", from_labelled_phrases),
    ("page labels", from_page_labels),
    ("body phrase", from_body_phrases),
];

/// Resolve the profile display name
pub fn resolve(snapshot: &Snapshot, context: &ExtractionContext) -> Option<String> {
    cascade("name", STRATEGIES, snapshot, context)
}

/// Normalize a name candidate, rejecting branding and empty residue
pub fn clean_name(raw: &str, context: &ExtractionContext) -> Option<String> {
    let patterns = &context.patterns;
    let trimmed = raw.trim();

    if trimmed.is_empty()
        || patterns.brand_label.is_match(trimmed)
        || patterns.taglines.iter().any(|t| t.is_match(trimmed))
    {
        return None;
    }

    let mut name = trimmed.to_string();
    for prefix in &patterns.name_prefixes {
        name = prefix.replace(&name, "").into_owned();
    }
    name = patterns.brand_suffix.replace(&name, "").into_owned();

    let mut name = name.split(&['|', '•'][..]).next().unwrap_or_default().trim().to_string();
    if name.chars().count() > context.settings.max_name_len {
        name = name
            .chars()
            .take(context.settings.max_name_len)
            .collect::<String>()
            .trim()
            .to_string();
    }

    if name.is_empty() || patterns.brand.is_match(&name) {
        return None;
    }
    Some(name)
}

fn from_hydration(snapshot: &Snapshot, context: &ExtractionContext) -> Option<String> {
    let state = snapshot.hydration()?;
    find_keyed_string(state, NAME_KEYS, HYDRATION_DEPTH, &|s| clean_name(s, context))
}

fn match_phrases(source: &str, context: &ExtractionContext) -> Option<String> {
    context
        .patterns
        .name_phrases
        .iter()
        .filter_map(|re| re.captures(source))
        .find_map(|caps| clean_name(caps.get(1)?.as_str(), context))
}

fn from_labelled_phrases(snapshot: &Snapshot, context: &ExtractionContext) -> Option<String> {
    [
        snapshot.heading_text(),
        snapshot.meta_title(),
        snapshot.meta_description(),
        Some(snapshot.raw_markup()),
    ]
    .into_iter()
    .flatten()
    .find_map(|source| match_phrases(source, context))
}

fn from_page_labels(snapshot: &Snapshot, context: &ExtractionContext) -> Option<String> {
    [snapshot.heading_text(), snapshot.meta_title(), snapshot.meta_description()]
        .into_iter()
        .flatten()
        .find_map(|label| clean_name(label, context))
}

fn from_body_phrases(snapshot: &Snapshot, context: &ExtractionContext) -> Option<String> {
    match_phrases(snapshot.body_text(), context)
}

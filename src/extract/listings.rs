use tracing::debug;

use crate::extract::{cascade, ExtractionContext, Snapshot, Strategy};

pub const STRATEGIES: &[(&str, Strategy<u32>)] = &[("count pool", largest_count)];

/// Resolve the host's listing count
pub fn resolve(snapshot: &Snapshot, context: &ExtractionContext) -> Option<u32> {
    cascade("listing_count", STRATEGIES, snapshot, context)
}

/// Every "N listings" occurrence in text and markup, in range
fn count_pool(snapshot: &Snapshot, context: &ExtractionContext) -> Vec<u32> {
    let sources = [snapshot.body_text(), snapshot.raw_markup()];

    context
        .patterns
        .listing_counts
        .iter()
        .flat_map(|re| sources.iter().flat_map(move |source| re.captures_iter(*source)))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter_map(|count| {
            context
                .validate_listing_count(count)
                .map_err(|e| debug!("Discarding count: {}", e))
                .ok()
        })
        .collect()
}

// The same count is often repeated in several fragments next to filtered
// subsets; the largest one stands for the whole inventory.
fn largest_count(snapshot: &Snapshot, context: &ExtractionContext) -> Option<u32> {
    count_pool(snapshot, context).into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_context;

    #[test]
    fn test_maximum_across_both_families() {
        let snapshot = Snapshot::new("12 listings", "<h2>47 annonces</h2>");
        assert_eq!(resolve(&snapshot, &test_context()), Some(47));
    }

    #[test]
    fn test_out_of_range_counts_are_discarded() {
        let snapshot = Snapshot::new("1500 listings · 0 annonces · 3 hébergements", "");
        assert_eq!(resolve(&snapshot, &test_context()), Some(3));

        let snapshot = Snapshot::new("1500 listings", "");
        assert_eq!(resolve(&snapshot, &test_context()), None);
    }

    #[test]
    fn test_singular_and_case() {
        let snapshot = Snapshot::new("1 Listing", "");
        assert_eq!(resolve(&snapshot, &test_context()), Some(1));
    }

    #[test]
    fn test_unknown_without_counts() {
        let snapshot = Snapshot::new("Membre depuis 2015", "<p>Aucune annonce</p>");
        assert_eq!(resolve(&snapshot, &test_context()), None);
    }
}

use regex::RegexBuilder;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::crawler::task::ScrapeTask;
use crate::error::InputError;

/// Read the URL list and turn every valid line into a task.
///
/// Duplicates are kept; each occurrence produces its own record.
pub fn load_tasks(path: &Path) -> Result<Vec<ScrapeTask>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let urls = parse_urls(&contents);
    if urls.is_empty() {
        return Err(InputError::NoValidUrls(path.to_path_buf()));
    }

    info!("Detected {} URL(s) in {}", urls.len(), path.display());

    Ok(urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| ScrapeTask::new(i + 1, url))
        .collect())
}

/// Extract absolute HTTP(S) URLs from a pasted list or spreadsheet column
pub fn parse_urls(contents: &str) -> Vec<String> {
    let absolute = match RegexBuilder::new(r"^https?://").case_insensitive(true).build() {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    contents
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        // Only the first column of CSV/TSV pastes
        .filter_map(|line| line.split(&[',', ';', '\t'][..]).next())
        .map(str::trim)
        .filter(|candidate| {
            let keep = absolute.is_match(candidate) && Url::parse(candidate).is_ok();
            if !keep {
                debug!("Skipping input line: {}", candidate);
            }
            keep
        })
        .map(str::to_string)
        .collect()
}

//! Joins listing-phase rows with the host records of a scrape run.

use anyhow::{Result, Context};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::storage::results::BOM;

/// File name of the joined table
pub const MERGED_FILE: &str = "final_complete_results.csv";

/// Notes of a listing whose host has no record
pub const HOST_NOT_SCRAPED: &str = "Host not scraped";

/// One CSV row keyed by header
pub type Row = HashMap<String, String>;

/// Listing row enriched with the host record, in output column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedRow {
    pub listing_url: String,
    pub title: String,
    pub license: String,
    pub host_url: String,
    pub host_name_from_listing: String,
    pub host_name_detailed: String,
    pub host_rating_from_listing: String,
    pub host_rating_detailed: String,
    pub host_joined_from_listing: String,
    pub host_joined_year: String,
    pub host_years_active: String,
    pub host_listing_count: String,
    pub host_scrape_notes: String,
    pub scraped_at: String,
}

/// Outcome of a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub rows: usize,
    pub matched: usize,
}

fn field(row: &Row, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// UTF-8 when valid, Latin-1 otherwise
fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

/// Read a headed CSV file into rows
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    let text = decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    reader
        .deserialize::<Row>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Malformed CSV file: {}", path.display()))
}

/// Files are taken as given; directories contribute their `.csv` files, sorted
pub fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = fs::read_dir(path)
            .with_context(|| format!("Failed to list directory: {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "csv"))
            .collect::<Vec<_>>();
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Rows of every readable file, in order; unreadable files are skipped
fn read_all(files: &[PathBuf]) -> Vec<Row> {
    let mut rows = Vec::new();
    for file in files {
        match read_rows(file) {
            Ok(found) => {
                info!("{}: {} row(s)", file.display(), found.len());
                rows.extend(found);
            }
            Err(e) => warn!("Skipping unreadable input: {:#}", e),
        }
    }
    rows
}

/// Attach host records to listings by profile URL; later host rows win
pub fn merge_rows(listings: &[Row], hosts: &[Row]) -> (Vec<MergedRow>, MergeSummary) {
    let by_url: HashMap<String, &Row> = hosts
        .iter()
        .map(|host| (field(host, "url"), host))
        .filter(|(url, _)| !url.is_empty())
        .collect();

    let mut matched = 0;
    let merged = listings
        .iter()
        .map(|listing| {
            let host_url = field(listing, "host_profile_url");
            let mut row = MergedRow {
                listing_url: field(listing, "url"),
                title: field(listing, "title"),
                license: field(listing, "license_code"),
                host_name_from_listing: field(listing, "host_name"),
                host_rating_from_listing: field(listing, "host_overall_rating"),
                host_joined_from_listing: field(listing, "host_joined"),
                scraped_at: field(listing, "scraped_at"),
                host_url,
                ..MergedRow::default()
            };

            match by_url.get(&row.host_url) {
                Some(host) => {
                    matched += 1;
                    row.host_name_detailed = field(host, "name");
                    row.host_rating_detailed = field(host, "rating");
                    row.host_joined_year = field(host, "joined_year");
                    row.host_years_active = field(host, "years_active");
                    row.host_listing_count = field(host, "listing_count");
                    row.host_scrape_notes = field(host, "notes");
                }
                None => row.host_scrape_notes = HOST_NOT_SCRAPED.to_string(),
            }

            row
        })
        .collect::<Vec<_>>();

    let summary = MergeSummary { rows: merged.len(), matched };
    (merged, summary)
}

/// Serialize merged rows as BOM-prefixed CSV
pub fn write_merged<W: Write>(mut writer: W, rows: &[MergedRow]) -> Result<()> {
    writer.write_all(BOM)?;

    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;

    let mut writer = csv.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    writer.flush()?;

    Ok(())
}

/// Merge listing and host CSV inputs into `output`. Nothing is written when
/// there are no listing rows.
pub fn merge_files(listings: &[PathBuf], hosts: &[PathBuf], output: &Path) -> Result<MergeSummary> {
    let listing_rows = read_all(&expand_inputs(listings)?);
    let host_rows = read_all(&expand_inputs(hosts)?);
    info!("{} listing row(s), {} host row(s)", listing_rows.len(), host_rows.len());

    let (merged, summary) = merge_rows(&listing_rows, &host_rows);
    if merged.is_empty() {
        warn!("No listing rows to merge");
        return Ok(summary);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(output)
        .with_context(|| format!("Failed to create merged file: {}", output.display()))?;
    write_merged(BufWriter::new(file), &merged)
        .with_context(|| format!("Failed to write merged file: {}", output.display()))?;

    info!("Merged {}/{} listing(s) with host data into {}", summary.matched, summary.rows, output.display());

    Ok(summary)
}

use regex::{Regex, RegexBuilder};

use crate::cli::config::ExtractionSettings;

/// Keys whose string values are treated as a display name in hydration state
pub const NAME_KEYS: &[&str] = &[
    "fullName",
    "displayName",
    "hostName",
    "publicName",
    "smartName",
    "name",
    "userName",
    "firstName",
];

/// Locale pattern tables, compiled once per run
#[derive(Debug)]
pub struct Patterns {
    /// "Profile of X" style phrasings, capture 1 is the name span
    pub name_phrases: Vec<Regex>,

    /// Leading phrasings stripped while cleaning a name candidate
    pub name_prefixes: Vec<Regex>,

    pub brand: Regex,
    pub brand_label: Regex,
    pub brand_suffix: Regex,
    pub taglines: Vec<Regex>,

    /// Capture 1 is a decimal rating
    pub rating_phrases: Vec<Regex>,

    /// Capture 1 is a listing count
    pub listing_counts: Vec<Regex>,

    /// Capture 1 is a four digit year
    pub joined_phrases: Vec<Regex>,
    pub joined_proximity: Regex,
    pub join_key: Regex,
    pub year: Regex,
}

fn insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl Patterns {
    pub fn new(settings: &ExtractionSettings) -> Result<Self, regex::Error> {
        let brand = regex::escape(settings.brand.trim());
        // Name spans stop at separators, dashes, line breaks and markup
        let span = r"([^<|–—\-•\n]+)";

        let name_phrases = [
            format!(r"Quelques informations sur\s+{span}"),
            format!(r"Profil de\s+{span}"),
            format!(r"(?:À propos de|About)\s+{span}"),
        ]
        .iter()
        .map(|p| insensitive(p))
        .collect::<Result<Vec<_>, _>>()?;

        let name_prefixes = [
            r"^Quelques informations sur\s+",
            r"^Profil de\s+",
            r"^À propos de\s+",
            r"^About\s+",
        ]
        .iter()
        .map(|p| insensitive(p))
        .collect::<Result<Vec<_>, _>>()?;

        let taglines = settings
            .taglines
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| insensitive(&regex::escape(t.trim())))
            .collect::<Result<Vec<_>, _>>()?;

        let rating_phrases = [
            r"Note\s+globale\s+([0-9]+[.,][0-9]+)",
            r"Moyenne\s+de\s+([0-9]+[.,][0-9]+)",
            r"([0-9]+[.,][0-9]+)\s*(?:évaluations|reviews|rating)",
            r"([0-9]+[.,][0-9]+)\s*[★*]",
        ]
        .iter()
        .map(|p| insensitive(p))
        .collect::<Result<Vec<_>, _>>()?;

        let listing_counts = [
            r"(\d{1,4})\s+(?:annonces|hébergements)",
            r"(\d{1,4})\s+listings?",
        ]
        .iter()
        .map(|p| insensitive(p))
        .collect::<Result<Vec<_>, _>>()?;

        // Optional month token before the year
        let month = r"(?:\p{L}+\s+)?";
        let joined_phrases = [
            format!(r"Membre\s+depuis\s+{month}(\d{{4}})"),
            format!(r"Depuis\s+{month}(\d{{4}})"),
            format!(r"Inscrit[ e]*\s+(?:en|depuis)\s+{month}(\d{{4}})"),
            format!(r"Joined\s+in\s+{month}(\d{{4}})"),
            format!(r"Member\s+since\s+{month}(\d{{4}})"),
            format!(r"On\s+{brand}\s+since\s+{month}(\d{{4}})"),
        ]
        .iter()
        .map(|p| insensitive(p))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name_phrases,
            name_prefixes,
            brand: insensitive(&brand)?,
            brand_label: Regex::new(&format!(r"^{brand}\s*:"))?,
            brand_suffix: insensitive(&format!(r"\s*[-–—]\s*{brand}.*$"))?,
            taglines,
            rating_phrases,
            listing_counts,
            joined_phrases,
            joined_proximity: insensitive(r"(?:membre|member|since|joined|inscrit)[^0-9]{0,20}((?:19|20)\d{2})")?,
            join_key: insensitive(r"membersince|since|createdat|created_at|joindate|join_date")?,
            year: Regex::new(r"(?:19|20)\d{2}")?,
        })
    }
}

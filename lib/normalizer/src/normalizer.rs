use gadgetcache_core::{RawListing, Record, SpecSheet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::extractor::SpecExtractor;
use crate::patterns;

pub const MIN_PRICE: u32 = 5_000;
pub const MAX_PRICE: u32 = 200_000;

const ACCESSORY_KEYWORDS: &[&str] = &[
    "case",
    "cover",
    "charger",
    "cable",
    "protector",
    "earphone",
    "earbuds",
    "headphone",
    "headset",
    "power bank",
    "adapter",
    "tempered glass",
    "screen guard",
    "pouch",
    "holder",
    "tripod",
    "selfie stick",
    "skin",
];

const PHONE_KEYWORDS: &[&str] = &[
    "phone",
    "mobile",
    "5g",
    "4g",
    "galaxy",
    "samsung",
    "apple",
    "oneplus",
    "xiaomi",
    "redmi",
    "poco",
    "realme",
    "oppo",
    "vivo",
    "motorola",
    "moto",
    "google",
    "pixel",
    "nothing",
    "iqoo",
    "infinix",
    "tecno",
    "nokia",
    "asus",
    "honor",
    "lava",
];

/// Normalizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub min_price: u32,
    pub max_price: u32,
    /// Source label for listings that do not name one
    pub default_source: String,
    /// A name containing any of these (case-insensitive) is an accessory
    pub accessory_keywords: Vec<String>,
    /// A name must contain at least one of these (case-insensitive)
    pub phone_keywords: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_price: MIN_PRICE,
            max_price: MAX_PRICE,
            default_source: "web".to_string(),
            accessory_keywords: ACCESSORY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            phone_keywords: PHONE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Why a listing did not become a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Accessory,
    NotAPhone,
    InvalidPrice,
    PriceOutOfRange,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Accessory => "accessory",
            Rejection::NotAPhone => "not a phone",
            Rejection::InvalidPrice => "invalid price",
            Rejection::PriceOutOfRange => "price out of range",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection counts per reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionTally {
    pub accessory: usize,
    pub not_a_phone: usize,
    pub invalid_price: usize,
    pub price_out_of_range: usize,
}

impl RejectionTally {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Accessory => self.accessory += 1,
            Rejection::NotAPhone => self.not_a_phone += 1,
            Rejection::InvalidPrice => self.invalid_price += 1,
            Rejection::PriceOutOfRange => self.price_out_of_range += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.accessory + self.not_a_phone + self.invalid_price + self.price_out_of_range
    }
}

/// Result of normalizing a batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub records: Vec<Record>,
    pub rejected: RejectionTally,
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Keywords this short only match as whole words, so "4g" does not hit "64gb"
const WHOLE_WORD_MAX_LEN: usize = 2;

fn mentions(name: &str, keyword: &str) -> bool {
    if keyword.len() > WHOLE_WORD_MAX_LEN {
        return name.contains(keyword);
    }
    name.match_indices(keyword).any(|(start, _)| {
        let before = name[..start].chars().next_back();
        let after = name[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Converts raw listings into validated records.
///
/// Specs come from the assisted extractor when one is configured and the
/// listing has features; any failure there falls back to the regex patterns.
pub struct Normalizer {
    config: NormalizerConfig,
    accessory_keywords: Vec<String>,
    phone_keywords: Vec<String>,
    extractor: Option<Arc<dyn SpecExtractor>>,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            accessory_keywords: lowercase_all(&config.accessory_keywords),
            phone_keywords: lowercase_all(&config.phone_keywords),
            config,
            extractor: None,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SpecExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Name-only checks, run before any parsing
    pub fn screen(&self, name: &str) -> Result<(), Rejection> {
        let name = name.to_lowercase();
        if self.accessory_keywords.iter().any(|k| name.contains(k.as_str())) {
            return Err(Rejection::Accessory);
        }
        if !self.phone_keywords.iter().any(|k| mentions(&name, k)) {
            return Err(Rejection::NotAPhone);
        }
        Ok(())
    }

    pub fn normalize(&self, raw: &RawListing) -> Result<Record, Rejection> {
        self.screen(&raw.name)?;

        let price = patterns::parse_price(&raw.price_text);
        if price == 0 {
            return Err(Rejection::InvalidPrice);
        }
        if price < self.config.min_price || price > self.config.max_price {
            return Err(Rejection::PriceOutOfRange);
        }

        let rating = patterns::parse_rating(&raw.rating_text);
        let specs = self.extract_specs(raw);

        let source = raw
            .source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.config.default_source.as_str());
        let description = raw
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("N/A");

        Ok(Record::from_parts(
            &raw.name,
            &raw.url,
            source,
            description,
            price,
            rating,
            specs,
        ))
    }

    fn extract_specs(&self, raw: &RawListing) -> SpecSheet {
        if let Some(extractor) = &self.extractor {
            if !raw.features.is_empty() {
                match extractor.extract_specs(&raw.name, &raw.features) {
                    Ok(specs) if specs.is_sane() => return specs,
                    Ok(_) => warn!("Assisted extraction for '{}' returned unusable specs, using patterns", raw.name),
                    Err(e) => warn!("Assisted extraction for '{}' failed, using patterns: {}", raw.name, e),
                }
            }
        }
        patterns::extract_specs(&raw.features)
    }

    /// Normalize every listing, keeping the ones that validate
    pub fn normalize_batch(&self, listings: &[RawListing]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for raw in listings {
            match self.normalize(raw) {
                Ok(record) => outcome.records.push(record),
                Err(rejection) => {
                    debug!("Rejected '{}': {}", raw.name, rejection);
                    outcome.rejected.record(rejection);
                }
            }
        }
        info!(
            "Normalized {} of {} listings ({} rejected)",
            outcome.records.len(),
            listings.len(),
            outcome.rejected.total()
        );
        outcome
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Price below which a phone is a budget device (currency units)
pub const BUDGET_CEILING: u32 = 15_000;
/// Price below which a phone is mid-range (currency units)
pub const MID_RANGE_CEILING: u32 = 35_000;
/// Upper bound of the rating scale
pub const MAX_RATING: f32 = 5.0;

/// Price bracket of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Budget,
    #[serde(rename = "Mid-range")]
    MidRange,
    Flagship,
}

impl Category {
    /// Pure function of price
    #[inline]
    #[must_use]
    pub fn from_price(price: u32) -> Self {
        if price < BUDGET_CEILING {
            Category::Budget
        } else if price < MID_RANGE_CEILING {
            Category::MidRange
        } else {
            Category::Flagship
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Budget => "Budget",
            Category::MidRange => "Mid-range",
            Category::Flagship => "Flagship",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw listing as handed over by a scraper, before any parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub name: String,
    /// Free-text price, e.g. `"₹45,999"`
    #[serde(default, alias = "price")]
    pub price_text: String,
    /// Free-text rating, e.g. `"4.3 ★"`
    #[serde(default, alias = "rating")]
    pub rating_text: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    /// Site the listing was scraped from
    #[serde(default)]
    pub source: Option<String>,
}

pub const DEFAULT_RAM_GB: u32 = 4;
pub const DEFAULT_STORAGE_GB: u32 = 64;
pub const DEFAULT_CAMERA_MP: u32 = 12;
pub const DEFAULT_BATTERY_MAH: u32 = 4000;
pub const DEFAULT_DISPLAY_INCHES: f32 = 6.5;
pub const DEFAULT_PROCESSOR: &str = "Unknown";

/// Hardware specs extracted from a listing's feature text.
///
/// Missing fields deserialize to the documented defaults, so a partial
/// answer from an assisted extractor still yields a complete sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecSheet {
    pub ram: u32,
    pub storage: u32,
    pub camera_mp: u32,
    pub battery_mah: u32,
    pub display_inches: f32,
    pub processor: String,
}

impl Default for SpecSheet {
    fn default() -> Self {
        Self {
            ram: DEFAULT_RAM_GB,
            storage: DEFAULT_STORAGE_GB,
            camera_mp: DEFAULT_CAMERA_MP,
            battery_mah: DEFAULT_BATTERY_MAH,
            display_inches: DEFAULT_DISPLAY_INCHES,
            processor: DEFAULT_PROCESSOR.to_string(),
        }
    }
}

impl SpecSheet {
    /// True when every numeric field is finite and non-negative
    pub fn is_sane(&self) -> bool {
        self.display_inches.is_finite() && self.display_inches >= 0.0
    }
}

/// A cached product entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub identity_key: String,
    pub full_name: String,
    pub brand: String,
    pub model: String,
    pub price: u32,
    pub rating: f32,
    pub ram: u32,
    pub storage: u32,
    pub camera_mp: u32,
    pub battery_mah: u32,
    pub display_inches: f32,
    pub processor: String,
    pub category: Category,
    pub source: String,
    pub url: String,
    pub description: String,
    pub search_text: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            identity_key: String::new(),
            full_name: String::new(),
            brand: String::new(),
            model: String::new(),
            price: 0,
            rating: 0.0,
            ram: 0,
            storage: 0,
            camera_mp: 0,
            battery_mah: 0,
            display_inches: 0.0,
            processor: String::new(),
            category: Category::Budget,
            source: String::new(),
            url: String::new(),
            description: "N/A".to_string(),
            search_text: String::new(),
        }
    }
}

impl Record {
    /// Build a record from parsed listing parts. Brand is the first word of
    /// the name, model the remainder.
    pub fn from_parts(
        full_name: &str,
        url: &str,
        source: &str,
        description: &str,
        price: u32,
        rating: f32,
        specs: SpecSheet,
    ) -> Self {
        let full_name = full_name.trim();
        let mut words = full_name.split_whitespace();
        let brand = words.next().unwrap_or("Unknown").to_string();
        let model = words.collect::<Vec<_>>().join(" ");

        let mut record = Self {
            identity_key: String::new(),
            full_name: full_name.to_string(),
            brand,
            model: if model.is_empty() { "Unknown".to_string() } else { model },
            price,
            rating,
            ram: specs.ram,
            storage: specs.storage,
            camera_mp: specs.camera_mp,
            battery_mah: specs.battery_mah,
            display_inches: specs.display_inches,
            processor: specs.processor,
            category: Category::from_price(price),
            source: source.to_string(),
            url: url.trim().to_string(),
            description: description.to_string(),
            search_text: String::new(),
        };
        record.finalize();
        record
    }

    /// Fill in derived fields: identity key (when absent), category and
    /// search text.
    pub fn finalize(&mut self) {
        if self.identity_key.is_empty() {
            self.identity_key = identity_key(&self.full_name, &self.brand, &self.model, &self.url);
        }
        self.category = Category::from_price(self.price);
        self.search_text = self.compute_search_text();
    }

    /// Case-folded concatenation of name, brand, model, processor and
    /// description. This is the text the embedding is computed over.
    pub fn compute_search_text(&self) -> String {
        [
            self.full_name.as_str(),
            self.brand.as_str(),
            self.model.as_str(),
            self.processor.as_str(),
            self.description.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Price must be positive, rating within `[0, 5]` and display size
    /// finite and non-negative for a record to be cacheable
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.price > 0
            && (0.0..=MAX_RATING).contains(&self.rating)
            && self.display_inches.is_finite()
            && self.display_inches >= 0.0
    }
}

/// A record returned to a caller, with its relevance when it came from a
/// nearest-neighbor search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    /// Cosine distance to the query
    #[serde(rename = "_distance", skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    /// Relevance in `[0, 100]`
    #[serde(rename = "_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ScoredRecord {
    pub fn unscored(record: Record) -> Self {
        Self {
            record,
            distance: None,
            score: None,
        }
    }
}

/// Deterministic cache key derived from name and URL.
///
/// Falls back to `brand_model` when the name is blank. Whitespace runs
/// collapse to one `_`, ASCII punctuation (other than `-` and `.`) maps to
/// `_`, and the result is lower-cased.
pub fn identity_key(full_name: &str, brand: &str, model: &str, url: &str) -> String {
    let base = if full_name.trim().is_empty() {
        format!("{}_{}", brand.trim(), model.trim())
    } else {
        full_name.trim().to_string()
    };
    let url = url.trim();
    let raw = if url.is_empty() {
        base
    } else {
        format!("{}__{}", base, url)
    };

    let mut key = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                key.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_punctuation() && ch != '-' && ch != '.' {
            key.push('_');
        } else {
            key.extend(ch.to_lowercase());
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds() {
        assert_eq!(Category::from_price(0), Category::Budget);
        assert_eq!(Category::from_price(14_999), Category::Budget);
        assert_eq!(Category::from_price(15_000), Category::MidRange);
        assert_eq!(Category::from_price(34_999), Category::MidRange);
        assert_eq!(Category::from_price(35_000), Category::Flagship);
        assert_eq!(Category::from_price(199_999), Category::Flagship);
    }

    #[test]
    fn test_category_serde_names() {
        assert_eq!(serde_json::to_string(&Category::MidRange).unwrap(), "\"Mid-range\"");
        let parsed: Category = serde_json::from_str("\"Flagship\"").unwrap();
        assert_eq!(parsed, Category::Flagship);
    }

    #[test]
    fn test_identity_key_is_normalized() {
        let a = identity_key("Samsung Galaxy  S24", "", "", "https://shop.example/p/s24");
        let b = identity_key("samsung galaxy s24", "", "", "https://shop.example/p/s24");
        assert_eq!(a, b);
        assert_eq!(a, "samsung_galaxy_s24__https___shop.example_p_s24");
    }

    #[test]
    fn test_identity_key_without_name_or_url() {
        assert_eq!(identity_key("", "Apple", "iPhone 15", ""), "apple_iphone_15");
    }

    #[test]
    fn test_from_parts_derives_fields() {
        let record = Record::from_parts(
            "Apple iPhone 15 (Black, 128 GB)",
            "https://shop.example/p/iphone15",
            "Flipkart",
            "N/A",
            69_999,
            4.6,
            SpecSheet::default(),
        );
        assert_eq!(record.brand, "Apple");
        assert_eq!(record.model, "iPhone 15 (Black, 128 GB)");
        assert_eq!(record.category, Category::Flagship);
        assert!(record.search_text.starts_with("apple iphone 15"));
        assert!(!record.identity_key.is_empty());
        assert!(record.is_valid());
    }

    #[test]
    fn test_validity_bounds() {
        let valid = Record {
            price: 9_999,
            rating: 5.0,
            display_inches: 6.7,
            ..Record::default()
        };
        assert!(valid.is_valid());
        assert!(!Record { rating: -3.0, ..valid.clone() }.is_valid());
        assert!(!Record { rating: 5.5, ..valid.clone() }.is_valid());
        assert!(!Record { rating: f32::NAN, ..valid.clone() }.is_valid());
        assert!(!Record { display_inches: -1.0, ..valid.clone() }.is_valid());
        assert!(!Record { price: 0, ..valid }.is_valid());
    }

    #[test]
    fn test_finalize_keeps_existing_key() {
        let mut record = Record {
            identity_key: "custom".to_string(),
            full_name: "Poco X6".to_string(),
            price: 20_000,
            ..Record::default()
        };
        record.finalize();
        assert_eq!(record.identity_key, "custom");
        assert_eq!(record.category, Category::MidRange);
    }
}

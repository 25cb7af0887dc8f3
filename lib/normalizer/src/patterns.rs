//! Free-text field parsing
//!
//! Every parser here is total: malformed input collapses to the documented
//! default instead of failing.

use gadgetcache_core::record::{
    DEFAULT_BATTERY_MAH, DEFAULT_CAMERA_MP, DEFAULT_DISPLAY_INCHES, DEFAULT_PROCESSOR,
    DEFAULT_RAM_GB, DEFAULT_STORAGE_GB, MAX_RATING,
};
use gadgetcache_core::SpecSheet;
use once_cell::sync::Lazy;
use regex::Regex;

const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '¥', ','];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

static RAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*GB\s*RAM").unwrap());

static STORAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(GB|TB)\s*(?:ROM|Storage)").unwrap());

static CAMERA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*MP").unwrap());

static BATTERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*mAh").unwrap());

static DISPLAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(\d+(?:\.\d+)?)\s*(?:inch|")"#).unwrap());

/// Chipset families, matched anywhere in the feature text
static PROCESSORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bsnapdragon\s+\d+[a-z+]*(?:\s+gen\s*\d+)?",
        r"(?i)\bdimensity\s+\d+[a-z+]*",
        r"(?i)\bhelio\s+[a-z]?\d+",
        r"(?i)\bexynos\s+\d+",
        r"(?i)\btensor(?:\s+g\d+)?",
        r"(?i)\bA\d{2}(?:\s+(?:bionic|pro))+\b",
        r"(?i)\bunisoc\s+[a-z]*\d+[a-z]*",
        r"(?i)\bkirin\s+\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// First run of digits after dropping currency symbols and thousands
/// separators. `0` when there is none or it does not fit.
pub fn parse_price(text: &str) -> u32 {
    let cleaned: String = text.chars().filter(|c| !CURRENCY_SYMBOLS.contains(c)).collect();
    DIGITS
        .find(&cleaned)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First decimal number in the text, `0.0` when absent or outside `0..=5`
pub fn parse_rating(text: &str) -> f32 {
    DECIMAL
        .find(text)
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .filter(|r| r.is_finite() && (0.0..=MAX_RATING).contains(r))
        .unwrap_or(0.0)
}

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn storage_gb(text: &str) -> Option<u32> {
    let caps = STORAGE.captures(text)?;
    let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
    if caps.get(2)?.as_str().eq_ignore_ascii_case("TB") {
        amount.checked_mul(1024)
    } else {
        Some(amount)
    }
}

fn display_inches(text: &str) -> Option<f32> {
    DISPLAY
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .filter(|d| d.is_finite())
}

/// Earliest chipset mention across all families
fn processor(text: &str) -> Option<String> {
    PROCESSORS
        .iter()
        .filter_map(|re| re.find(text))
        .min_by_key(|m| m.start())
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Pattern-based spec extraction over the joined feature text.
///
/// First match wins per field; unmatched fields keep their defaults.
pub fn extract_specs(features: &[String]) -> SpecSheet {
    let text = features.join(" ");
    SpecSheet {
        ram: capture_u32(&RAM, &text).unwrap_or(DEFAULT_RAM_GB),
        storage: storage_gb(&text).unwrap_or(DEFAULT_STORAGE_GB),
        camera_mp: capture_u32(&CAMERA, &text).unwrap_or(DEFAULT_CAMERA_MP),
        battery_mah: capture_u32(&BATTERY, &text).unwrap_or(DEFAULT_BATTERY_MAH),
        display_inches: display_inches(&text).unwrap_or(DEFAULT_DISPLAY_INCHES),
        processor: processor(&text).unwrap_or_else(|| DEFAULT_PROCESSOR.to_string()),
    }
}

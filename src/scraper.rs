use anyhow::{anyhow, Context};
use gadgetcache_core::RawListing;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Live listing source. Called at most once per cache miss.
///
/// "No results" is an empty list, not an error.
pub trait Scraper: Send + Sync {
    fn scrape(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<RawListing>>;
}

/// Serves listings from a JSON file of previously scraped raw output
pub struct ReplayScraper {
    path: PathBuf,
    listings: Vec<RawListing>,
}

impl ReplayScraper {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let listings: Vec<RawListing> = serde_json::from_str(&content)
            .map_err(|e| anyhow!("{} is not a JSON array of listings: {}", path.display(), e))?;
        Ok(Self { path, listings })
    }

    pub fn from_listings(listings: Vec<RawListing>) -> Self {
        Self {
            path: PathBuf::new(),
            listings,
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    fn mentions(listing: &RawListing, words: &[String]) -> bool {
        let name = listing.name.to_lowercase();
        words.iter().any(|word| {
            name.contains(word.as_str())
                || listing
                    .features
                    .iter()
                    .any(|f| f.to_lowercase().contains(word.as_str()))
        })
    }
}

impl Scraper for ReplayScraper {
    fn scrape(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<RawListing>> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 1 && *w != "phone")
            .map(str::to_string)
            .collect();

        let matching: Vec<RawListing> = self
            .listings
            .iter()
            .filter(|l| Self::mentions(l, &words))
            .take(max_results)
            .cloned()
            .collect();

        debug!(
            "Replay from {}: {} of {} listings match '{}'",
            self.path.display(),
            matching.len(),
            self.listings.len(),
            query
        );
        if matching.is_empty() {
            return Ok(self.listings.iter().take(max_results).cloned().collect());
        }
        Ok(matching)
    }
}

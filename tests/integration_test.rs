// Integration tests for gadgetcache
use gadgetcache::{
    AdvisorConfig, CacheCoordinator, Category, HashEmbedder, Normalizer, QueryEnhancer,
    RawListing, RecordStore, Rejection, ReplayScraper, ResolutionSource, Scraper, SpecFilter,
};
use gadgetcache_normalizer::{extract_specs, parse_price};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DIM: usize = 128;

fn open_store(dir: &Path) -> RecordStore {
    RecordStore::open_with_map_size(dir, Arc::new(HashEmbedder::new(DIM)), 16).unwrap()
}

fn listing(name: &str, price: &str, features: &[&str]) -> RawListing {
    RawListing {
        name: name.to_string(),
        price_text: price.to_string(),
        rating_text: "4.3".to_string(),
        features: features.iter().map(|s| s.to_string()).collect(),
        url: format!("https://shop.example/p/{}", name.to_lowercase().replace(' ', "-")),
        source: Some("Flipkart".to_string()),
        ..RawListing::default()
    }
}

fn catalog() -> Vec<RawListing> {
    vec![
        listing(
            "Samsung Galaxy S24 Ultra 5G",
            "₹1,29,999",
            &["12 GB RAM | 256 GB ROM", "200MP Camera", "5000 mAh Battery", "Snapdragon 8 Gen 3"],
        ),
        listing(
            "Poco X6 Pro 5G",
            "₹23,999",
            &["8 GB RAM | 256 GB ROM", "64MP Camera", "5000 mAh Battery", "Dimensity 8300 Ultra"],
        ),
        listing(
            "Redmi 13C",
            "₹8,999",
            &["4 GB RAM | 128 GB ROM", "50MP Camera", "5000 mAh Battery", "Helio G85"],
        ),
        listing("Spigen Case for Galaxy S24", "₹1,499", &[]),
        listing("Apple iPhone 15 Silicone Cover", "₹4,900", &[]),
    ]
}

struct CountingScraper {
    calls: AtomicUsize,
    inner: ReplayScraper,
}

impl CountingScraper {
    fn new(listings: Vec<RawListing>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            inner: ReplayScraper::from_listings(listings),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scraper for CountingScraper {
    fn scrape(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<RawListing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.scrape(query, max_results)
    }
}

struct BrokenScraper;

impl Scraper for BrokenScraper {
    fn scrape(&self, _query: &str, _max_results: usize) -> anyhow::Result<Vec<RawListing>> {
        anyhow::bail!("browser session crashed")
    }
}

fn coordinator(dir: &Path, scraper: Arc<dyn Scraper>) -> CacheCoordinator {
    CacheCoordinator::new(
        open_store(dir),
        QueryEnhancer::default(),
        Normalizer::default(),
        scraper,
    )
}

#[test]
fn test_price_parsing() {
    assert_eq!(parse_price("₹45,999"), 45_999);
}

#[test]
fn test_documented_regex_extraction() {
    let features: Vec<String> = [
        "8GB RAM",
        "128GB Storage",
        "50MP Camera",
        "5000mAh Battery",
        "6.5 inch Display",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let specs = extract_specs(&features);
    assert_eq!(
        (specs.ram, specs.storage, specs.camera_mp, specs.battery_mah, specs.display_inches),
        (8, 128, 50, 5000, 6.5)
    );
}

#[test]
fn test_case_and_cover_always_rejected() {
    let normalizer = Normalizer::default();
    for name in ["OnePlus 12 Case", "Pixel 8 cover", "CASE for Samsung Galaxy phone 5G"] {
        let raw = listing(name, "₹49,999", &["8GB RAM"]);
        assert_eq!(normalizer.normalize(&raw), Err(Rejection::Accessory), "{name}");
    }
}

#[test]
fn test_category_boundaries() {
    for (price, category) in [
        (5_000, Category::Budget),
        (14_999, Category::Budget),
        (15_000, Category::MidRange),
        (34_999, Category::MidRange),
        (35_000, Category::Flagship),
        (200_000, Category::Flagship),
    ] {
        assert_eq!(Category::from_price(price), category, "{price}");
    }
}

#[test]
fn test_empty_store_search_never_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    for limit in [0, 1, 10, usize::MAX] {
        assert!(store.search("gaming phone", limit).unwrap().is_empty());
    }
    assert!(store.search("", 5).unwrap().is_empty());
}

#[test]
fn test_upsert_idempotent_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let records = Normalizer::default().normalize_batch(&catalog()).records;
    assert_eq!(records.len(), 3);

    store.upsert(&records).unwrap();
    let count = store.count();
    store.upsert(&records[..1]).unwrap();
    assert_eq!(store.count(), count);

    let all = store.get_all();
    assert_eq!(
        all.iter().filter(|r| r.identity_key == records[0].identity_key).count(),
        1
    );
    assert_eq!(all, records);
}

#[test]
fn test_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let records = Normalizer::default().normalize_batch(&catalog()).records;
    let before = {
        let store = open_store(dir.path());
        store.upsert(&records).unwrap();
        store.search("poco x6 pro", 3).unwrap()
    };

    let store = open_store(dir.path());
    assert_eq!(store.count(), 3);
    assert_eq!(store.get_all(), records);
    assert_eq!(store.search("poco x6 pro", 3).unwrap(), before);
    assert_eq!(before[0].record.full_name, "Poco X6 Pro 5G");
}

#[test]
fn test_exact_search_text_is_a_hit_without_scraping() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let mut black = listing("Apple iPhone 15 (Black, 128 GB)", "₹69,900", &["128 GB ROM", "48MP Camera"]);
    black.description = Some("Dynamic Island, USB-C, A16 Bionic".to_string());
    let blue = listing("Apple iPhone 15 (Blue, 128 GB)", "₹69,900", &["128 GB ROM", "48MP Camera"]);
    let mut listings = catalog();
    listings.push(black);
    listings.push(blue);
    let records = Normalizer::default().normalize_batch(&listings).records;
    assert_eq!(records.len(), 5);
    store.upsert(&records).unwrap();

    let scraper = Arc::new(CountingScraper::new(catalog()));
    let coordinator = CacheCoordinator::new(
        store,
        QueryEnhancer::default(),
        Normalizer::default(),
        scraper.clone(),
    );

    for target in &records {
        let resolution = coordinator.resolve(&target.search_text, 1, None);
        assert_eq!(resolution.source, ResolutionSource::Cache);
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.records[0].record, *target, "{}", target.full_name);
    }
    assert_eq!(scraper.calls(), 0);
}

#[test]
fn test_miss_fetches_normalizes_and_stores() {
    let dir = tempfile::tempdir().unwrap();
    let scraper = Arc::new(CountingScraper::new(catalog()));
    let coordinator = coordinator(dir.path(), scraper.clone());

    let resolution = coordinator.resolve("samsung galaxy phone", 10, None);
    assert_eq!(resolution.source, ResolutionSource::Fresh);
    assert_eq!(scraper.calls(), 1);
    assert!(resolution
        .records
        .iter()
        .all(|hit| hit.score.is_none() && !hit.record.full_name.contains("Case")));
    assert_eq!(coordinator.store().count(), resolution.records.len());

    let again = coordinator.resolve("samsung galaxy phone", 10, None);
    assert_eq!(again.source, ResolutionSource::Cache);
    assert_eq!(scraper.calls(), 1);
}

#[test]
fn test_scraper_failure_yields_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(dir.path(), Arc::new(BrokenScraper));

    let resolution = coordinator.resolve("gaming phone", 10, Some(25_000));
    assert_eq!(resolution.source, ResolutionSource::Empty);
    assert!(resolution.records.is_empty());
    assert!(coordinator.store().is_empty());
}

#[test]
fn test_working_set_rebuilt_on_start() {
    let dir = tempfile::tempdir().unwrap();
    {
        let coordinator = coordinator(dir.path(), Arc::new(CountingScraper::new(catalog())));
        coordinator.resolve("any phone", 10, None);
    }

    let coordinator = coordinator(dir.path(), Arc::new(BrokenScraper));
    let working_set = coordinator.working_set();
    assert_eq!(working_set.len(), 3);
    assert_eq!(working_set.brands(), vec!["Poco", "Redmi", "Samsung"]);
    assert_eq!(working_set.price_range(), (8_999, 129_999));

    let budget = working_set.filter(&SpecFilter::new().with_max_price(15_000));
    assert_eq!(budget.len(), 1);
    assert_eq!(budget[0].full_name, "Redmi 13C");
    assert_eq!(working_set.details("x6 pro").unwrap().ram, 8);
}

#[test]
fn test_ingest_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("a"));
    let records = Normalizer::default().normalize_batch(&catalog()).records;
    store.upsert(&records).unwrap();

    let file = dir.path().join("export").join("phones.json");
    assert_eq!(store.export_json(&file).unwrap(), 3);

    let other = open_store(&dir.path().join("b"));
    assert_eq!(other.ingest_json(&file).unwrap(), 3);
    assert_eq!(other.get_all(), records);
    assert_eq!(other.stats(), store.stats());

    assert!(other.ingest_json(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_coordinator_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = AdvisorConfig {
        data_dir: dir.path().to_path_buf(),
        embedding_dim: 64,
        map_size_mb: 16,
        ..AdvisorConfig::default()
    };
    let scraper = Arc::new(CountingScraper::new(catalog()));
    let coordinator = CacheCoordinator::from_config(&config, scraper.clone()).unwrap();

    let resolution = coordinator.resolve("redmi phone under 10000", config.max_results, None);
    assert_eq!(resolution.source, ResolutionSource::Fresh);
    assert_eq!(resolution.rejected.total(), 0);
    assert_eq!(coordinator.store().stats().total_records, resolution.records.len());
}

use ahash::AHashMap;
use gadgetcache_core::{Filter, Record, SpecFilter};
use std::collections::BTreeSet;

/// Upper end of the price range reported for an empty working set
pub const EMPTY_PRICE_CEILING: u32 = 200_000;

/// Every record returned in this process, deduplicated by `full_name`.
///
/// A later record with the same name replaces the earlier one in place, so
/// iteration order is first-seen order.
#[derive(Debug, Default)]
pub struct WorkingSet {
    records: Vec<Record>,
    by_name: AHashMap<String, usize>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut set = Self::new();
        set.merge(records);
        set
    }

    /// Merge records in; returns how many names were new
    pub fn merge(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut added = 0;
        for record in records {
            match self.by_name.get(&record.full_name) {
                Some(&idx) => self.records[idx] = record,
                None => {
                    self.by_name.insert(record.full_name.clone(), self.records.len());
                    self.records.push(record);
                    added += 1;
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self, filter: &SpecFilter) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on name or model, within `filter`
    pub fn search(&self, name_query: &str, filter: &SpecFilter) -> Vec<Record> {
        let needle = name_query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.full_name.to_lowercase().contains(&needle)
                    || r.model.to_lowercase().contains(&needle)
            })
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Distinct brands, sorted
    pub fn brands(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.brand.clone())
            .filter(|b| !b.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn price_range(&self) -> (u32, u32) {
        let min = self.records.iter().map(|r| r.price).min();
        let max = self.records.iter().map(|r| r.price).max();
        match (min, max) {
            (Some(min), Some(max)) => (min, max),
            _ => (0, EMPTY_PRICE_CEILING),
        }
    }

    /// First record whose name contains `name`, case-insensitive
    pub fn details(&self, name: &str) -> Option<&Record> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.full_name.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(name: &str, brand: &str, price: u32, ram: u32) -> Record {
        Record {
            full_name: name.to_string(),
            brand: brand.to_string(),
            model: name.split_once(' ').map(|(_, m)| m).unwrap_or("").to_string(),
            price,
            ram,
            ..Record::default()
        }
    }

    fn set() -> WorkingSet {
        WorkingSet::from_records(vec![
            phone("Samsung Galaxy A55", "Samsung", 39_999, 8),
            phone("Apple iPhone 15", "Apple", 69_900, 6),
            phone("Redmi Note 13", "Redmi", 17_999, 6),
        ])
    }

    #[test]
    fn test_merge_dedupes_by_name() {
        let mut set = set();
        let added = set.merge(vec![
            phone("Redmi Note 13", "Redmi", 16_499, 8),
            phone("Poco X6", "Poco", 21_999, 8),
        ]);
        assert_eq!(added, 1);
        assert_eq!(set.len(), 4);
        assert_eq!(set.records()[2].price, 16_499);
        assert_eq!(set.records()[3].full_name, "Poco X6");
    }

    #[test]
    fn test_filter_and_search() {
        let set = set();
        let cheap = SpecFilter::new().with_max_price(40_000);
        assert_eq!(set.filter(&cheap).len(), 2);

        let hits = set.search("note", &SpecFilter::new());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].brand, "Redmi");

        let hits = set.search("", &SpecFilter::new().with_min_ram(8));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].full_name, "Samsung Galaxy A55");
    }

    #[test]
    fn test_brands_and_price_range() {
        let set = set();
        assert_eq!(set.brands(), vec!["Apple", "Redmi", "Samsung"]);
        assert_eq!(set.price_range(), (17_999, 69_900));
        assert_eq!(WorkingSet::new().price_range(), (0, 200_000));
    }

    #[test]
    fn test_details() {
        let set = set();
        assert_eq!(set.details("iphone").unwrap().price, 69_900);
        assert!(set.details("pixel").is_none());
        assert!(set.details("  ").is_none());
    }
}

// Spec-based record filters
use serde::{Deserialize, Serialize};
use crate::Record;

pub trait Filter {
    fn matches(&self, record: &Record) -> bool;
}

/// Hardware/price constraints over records.
///
/// Every bound is optional; a bound of zero is treated the same as an absent
/// one, so form inputs like "0 = any RAM" pass straight through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecFilter {
    /// Exact brand match (case-insensitive); empty means any brand
    pub brands: Vec<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub min_ram: Option<u32>,
    pub max_ram: Option<u32>,
    pub min_camera: Option<u32>,
    pub min_battery: Option<u32>,
    pub min_storage: Option<u32>,
    pub min_display: Option<f32>,
}

#[inline]
fn active(bound: Option<u32>) -> Option<u32> {
    bound.filter(|v| *v > 0)
}

impl SpecFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brands = brands.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_max_price(mut self, max_price: u32) -> Self {
        self.max_price = Some(max_price);
        self
    }

    #[must_use]
    pub fn with_min_ram(mut self, min_ram: u32) -> Self {
        self.min_ram = Some(min_ram);
        self
    }

    #[must_use]
    pub fn with_min_camera(mut self, min_camera: u32) -> Self {
        self.min_camera = Some(min_camera);
        self
    }

    #[must_use]
    pub fn with_min_battery(mut self, min_battery: u32) -> Self {
        self.min_battery = Some(min_battery);
        self
    }

    /// True when no bound is active
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

impl Filter for SpecFilter {
    fn matches(&self, record: &Record) -> bool {
        if !self.brands.is_empty()
            && !self
                .brands
                .iter()
                .any(|b| b.eq_ignore_ascii_case(&record.brand))
        {
            return false;
        }
        if let Some(min) = active(self.min_price) {
            if record.price < min {
                return false;
            }
        }
        if let Some(max) = active(self.max_price) {
            if record.price > max {
                return false;
            }
        }
        if let Some(min) = active(self.min_ram) {
            if record.ram < min {
                return false;
            }
        }
        if let Some(max) = active(self.max_ram) {
            if record.ram > max {
                return false;
            }
        }
        if let Some(min) = active(self.min_camera) {
            if record.camera_mp < min {
                return false;
            }
        }
        if let Some(min) = active(self.min_battery) {
            if record.battery_mah < min {
                return false;
            }
        }
        if let Some(min) = active(self.min_storage) {
            if record.storage < min {
                return false;
            }
        }
        if let Some(min) = self.min_display.filter(|v| *v > 0.0) {
            if record.display_inches < min {
                return false;
            }
        }
        true
    }
}

/// Closures work as ad-hoc filters
impl<F> Filter for F
where
    F: Fn(&Record) -> bool,
{
    fn matches(&self, record: &Record) -> bool {
        self(record)
    }
}

//! Fundamentals: sparse company-level fields.

use serde::{Deserialize, Serialize};

/// Fundamental fields reported by the data source.
///
/// Every field is optional. A fully empty record is valid and simply skips the
/// fundamentals-based score adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Trailing price/earnings ratio.
    pub trailing_pe: Option<f64>,
    /// Return on equity as a fraction (0.15 = 15%).
    pub return_on_equity: Option<f64>,
    pub long_name: Option<String>,
}

impl Fundamentals {
    pub fn is_empty(&self) -> bool {
        self.trailing_pe.is_none() && self.return_on_equity.is_none() && self.long_name.is_none()
    }

    /// Return on equity expressed in percent.
    pub fn roe_percent(&self) -> Option<f64> {
        self.return_on_equity.map(|roe| roe * 100.0)
    }

    /// Display name, falling back to the given symbol.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.long_name.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record() {
        let f = Fundamentals::default();
        assert!(f.is_empty());
        assert_eq!(f.roe_percent(), None);
        assert_eq!(f.display_name("2330.TW"), "2330.TW");
    }

    #[test]
    fn roe_percent_scales_fraction() {
        let f = Fundamentals {
            return_on_equity: Some(0.2),
            ..Default::default()
        };
        assert!((f.roe_percent().unwrap() - 20.0).abs() < 1e-12);
    }
}

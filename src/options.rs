use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ParseError;

/// Tunable knobs of the layout engine.
///
/// Defaults follow the wrapped-header detector: rows cluster within 6 units,
/// header fragments merge within 12 units horizontally, and body tokens match
/// a column within 50 units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Vertical distance within which tokens share a header-candidate row.
    pub y_tol: f64,
    /// Horizontal distance within which header fragments form one label.
    pub header_x_tol: f64,
    /// Horizontal window used to match body tokens to a column.
    pub column_x_tol: f64,
    /// Minimum token count of a header row.
    pub min_cols: usize,
    /// Tokens per header-scoring chunk.
    pub chunk_size: usize,
    /// Tokens further than this from the page's median y are margin noise.
    pub outlier_distance: f64,
    /// Fraction of mismatched date pairs above which a page holds two tables.
    pub dual_table_ratio: f64,
    #[serde(skip)]
    pub pages: Option<PageSelection>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            y_tol: 6.0,
            header_x_tol: 12.0,
            column_x_tol: 50.0,
            min_cols: 3,
            chunk_size: 3000,
            outlier_distance: 800.0,
            dual_table_ratio: 0.7,
            pages: None,
        }
    }
}

impl ParseOptions {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.chunk_size == 0 {
            return Err(ParseError::InvalidOption(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.min_cols == 0 {
            return Err(ParseError::InvalidOption(
                "min_cols must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("y_tol", self.y_tol),
            ("header_x_tol", self.header_x_tol),
            ("column_x_tol", self.column_x_tol),
            ("outlier_distance", self.outlier_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParseError::InvalidOption(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.dual_table_ratio) {
            return Err(ParseError::InvalidOption(format!(
                "dual_table_ratio must lie in 0..=1, got {}",
                self.dual_table_ratio
            )));
        }

        Ok(())
    }
}

/// 1-based pages to parse, written like `1-3,5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

fn page_number(text: &str) -> Result<u32, String> {
    match text.trim().parse::<u32>() {
        Ok(0) => Err("pages are 1-based".to_string()),
        Ok(page) => Ok(page),
        Err(_) => Err(format!("'{}' is not a page number", text.trim())),
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for part in selection.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (first, last) = match part.split_once('-') {
                Some((first, last)) => (page_number(first)?, page_number(last)?),
                None => {
                    let page = page_number(part)?;
                    (page, page)
                }
            };
            if last < first {
                return Err(format!("page range '{part}' runs backwards"));
            }
            pages.extend(first..=last);
        }

        if pages.is_empty() {
            return Err("no pages selected".to_string());
        }
        Ok(Self { pages })
    }
}

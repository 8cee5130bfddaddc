use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transactions::Transaction;

/// A positioned text fragment as produced by the token source.
///
/// `y` grows downwards: rows further down the page have larger `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page_number: u32,
}

impl Token {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f64, y: f64, page_number: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            page_number,
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Tokens judged to share one visual line. Members are indices into the
/// token slice the row was clustered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub y: f64,
    pub members: Vec<usize>,
}

impl Row {
    pub(crate) fn start(y: f64, member: usize) -> Self {
        Self {
            y,
            members: vec![member],
        }
    }
}

/// One logical column label, possibly reassembled from wrapped fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// The header row chosen for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderInfo {
    pub y: f64,
    pub headings: Vec<HeaderLabel>,
    pub page_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementLayout {
    pub transactions: Vec<Transaction>,
    pub headings: BTreeMap<u32, HeaderInfo>,
}

/// Summary counters for one parse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub page_count: usize,
    pub pages_with_header: usize,
    pub dual_table_pages: usize,
    pub transaction_count: usize,
}

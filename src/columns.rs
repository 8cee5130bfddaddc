use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::HeaderLabel;

const DATE_KEYWORDS: [&str; 4] = ["date", "posting date", "post date", "value date"];
const DESCRIPTION_KEYWORDS: [&str; 4] = ["description", "transaction", "details", "narrative"];
const AMOUNT_KEYWORDS: [&str; 7] = [
    "amount",
    "debit",
    "credit",
    "money in",
    "money out",
    "payments",
    "deposits",
];
const BALANCE_KEYWORDS: [&str; 3] = ["balance", "available balance", "account balance"];

/// Semantic role of a table column, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Date,
    Description,
    Amount,
    Balance,
}

impl ColumnRole {
    pub const ALL: [Self; 4] = [Self::Date, Self::Description, Self::Amount, Self::Balance];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Balance => "balance",
        }
    }

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Date => &DATE_KEYWORDS,
            Self::Description => &DESCRIPTION_KEYWORDS,
            Self::Amount => &AMOUNT_KEYWORDS,
            Self::Balance => &BALANCE_KEYWORDS,
        }
    }

    /// First role whose keywords occur in `label`.
    #[must_use]
    pub fn classify(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        Self::ALL.into_iter().find(|role| {
            role.keywords()
                .iter()
                .any(|keyword| lower.contains(*keyword))
        })
    }
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| format!("unknown column role: '{value}'"))
    }
}

/// Column x-positions per role, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRoleSet {
    date: Vec<f64>,
    description: Vec<f64>,
    amount: Vec<f64>,
    balance: Vec<f64>,
}

impl ColumnRoleSet {
    #[must_use]
    pub fn from_labels(labels: &[HeaderLabel]) -> Self {
        let mut set = Self::default();
        for label in labels {
            if let Some(role) = ColumnRole::classify(&label.text) {
                set.positions_mut(role).push(label.x);
            }
        }
        set
    }

    #[must_use]
    pub fn positions(&self, role: ColumnRole) -> &[f64] {
        match role {
            ColumnRole::Date => &self.date,
            ColumnRole::Description => &self.description,
            ColumnRole::Amount => &self.amount,
            ColumnRole::Balance => &self.balance,
        }
    }

    fn positions_mut(&mut self, role: ColumnRole) -> &mut Vec<f64> {
        match role {
            ColumnRole::Date => &mut self.date,
            ColumnRole::Description => &mut self.description,
            ColumnRole::Amount => &mut self.amount,
            ColumnRole::Balance => &mut self.balance,
        }
    }

    #[must_use]
    pub fn has_dates(&self) -> bool {
        !self.date.is_empty()
    }
}

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::columns::{ColumnRole, ColumnRoleSet};
use crate::dates::is_date_like;
use crate::model::{HeaderInfo, Token};

/// Transaction field name: a role plus the 1-based column index within that
/// role (`amount2`). Split dual-table records drop the index (`amount`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey {
    pub role: ColumnRole,
    pub index: Option<usize>,
}

impl FieldKey {
    #[must_use]
    pub const fn indexed(role: ColumnRole, index: usize) -> Self {
        Self {
            role,
            index: Some(index),
        }
    }

    #[must_use]
    pub const fn bare(role: ColumnRole) -> Self {
        Self { role, index: None }
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{index}", self.role),
            None => f.write_str(self.role.as_str()),
        }
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let split = value
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(value.len());
        let (name, digits) = value.split_at(split);
        let role = name.parse::<ColumnRole>()?;
        if digits.is_empty() {
            return Ok(Self::bare(role));
        }

        let index = digits
            .parse::<usize>()
            .map_err(|_| format!("invalid field index in '{value}'"))?;
        Ok(Self::indexed(role, index))
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One reconstructed statement row. Unmatched columns keep their key with a
/// `None` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    fields: BTreeMap<FieldKey, Option<String>>,
}

impl Transaction {
    pub(crate) fn insert(&mut self, key: FieldKey, value: Option<String>) {
        self.fields.insert(key, value);
    }

    /// Value stored under a key such as `"date1"`. Returns `None` for unknown
    /// keys and for unmatched columns alike.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.parse::<FieldKey>().ok()?;
        self.fields.get(&key)?.as_deref()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        key.parse::<FieldKey>()
            .is_ok_and(|key| self.fields.contains_key(&key))
    }

    /// Numeric reading of a field, see [`parse_amount`].
    #[must_use]
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(parse_amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, Option<&str>)> {
        self.fields.iter().map(|(key, value)| (*key, value.as_deref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn has_value(&self) -> bool {
        self.fields
            .values()
            .any(|value| value.as_deref().is_some_and(|text| !text.is_empty()))
    }

    pub(crate) fn into_fields(self) -> BTreeMap<FieldKey, Option<String>> {
        self.fields
    }
}

impl FromIterator<(FieldKey, Option<String>)> for Transaction {
    fn from_iter<I: IntoIterator<Item = (FieldKey, Option<String>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Reads a money value: thousands separators, a leading currency sign and
/// accounting parentheses are accepted. Anything else is not a number.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let mut cleaned = text.trim().replace([',', ' '], "");
    let negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    if negative {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    let (sign, rest) = match cleaned.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, cleaned.as_str()),
    };
    let digits = rest.trim_start_matches(['$', '£', '€', 'R']);

    let value = digits.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(if negative { -value } else { sign * value })
}

fn within_column(role: ColumnRole, token_x: f64, column_x: f64, x_tol: f64) -> bool {
    let offset = token_x - column_x;
    match role {
        // Amount columns only look right of the header so adjacent
        // debit/credit columns do not steal each other's values.
        ColumnRole::Amount => (0.0..=x_tol).contains(&offset),
        _ => offset.abs() <= x_tol,
    }
}

/// Tenths of `y`, rounded from its exact binary value: `80.05` is stored as
/// 80.04999.. and keys with `80.0`.
#[allow(clippy::cast_possible_truncation)]
fn row_key(y: f64) -> i64 {
    let tenths = format!("{y:.1}").parse::<f64>().unwrap_or(y);
    (tenths * 10.0).round() as i64
}

/// Rebuilds transactions from the tokens below a page's header.
///
/// Body rows group on y rounded to one decimal. A row is kept only when at
/// least one date column holds a date-shaped token.
pub(crate) fn extract_transactions(
    page_tokens: &[Token],
    header: &HeaderInfo,
    columns: &ColumnRoleSet,
    x_tol: f64,
) -> Vec<Transaction> {
    let mut rows: BTreeMap<i64, Vec<&Token>> = BTreeMap::new();
    for token in page_tokens
        .iter()
        .filter(|token| token.page_number == header.page_number && token.y > header.y)
        .filter(|token| !token.is_blank())
    {
        rows.entry(row_key(token.y)).or_default().push(token);
    }

    let mut transactions = Vec::new();
    for row in rows.values() {
        let mut transaction = Transaction::default();
        let mut has_date = false;

        for (index, &column_x) in columns.positions(ColumnRole::Date).iter().enumerate() {
            let value = row
                .iter()
                .find(|token| {
                    within_column(ColumnRole::Date, token.x, column_x, x_tol)
                        && is_date_like(&token.text)
                })
                .map(|token| token.text.trim().to_string());
            has_date |= value.is_some();
            transaction.insert(FieldKey::indexed(ColumnRole::Date, index + 1), value);
        }

        if !has_date {
            continue;
        }

        for role in [
            ColumnRole::Description,
            ColumnRole::Amount,
            ColumnRole::Balance,
        ] {
            for (index, &column_x) in columns.positions(role).iter().enumerate() {
                let value = row
                    .iter()
                    .find(|token| within_column(role, token.x, column_x, x_tol))
                    .map(|token| token.text.trim().to_string());
                transaction.insert(FieldKey::indexed(role, index + 1), value);
            }
        }

        transactions.push(transaction);
    }

    transactions
}

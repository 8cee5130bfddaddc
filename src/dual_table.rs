use crate::columns::ColumnRole;
use crate::transactions::{FieldKey, Transaction};

const FIRST_DATE: FieldKey = FieldKey::indexed(ColumnRole::Date, 1);
const SECOND_DATE: FieldKey = FieldKey::indexed(ColumnRole::Date, 2);

/// Share of rows with a second date whose two dates differ, or `None` when no
/// row has a second date.
pub(crate) fn date_mismatch_ratio(transactions: &[Transaction]) -> Option<f64> {
    let mut with_second = 0_u32;
    let mut mismatched = 0_u32;

    for transaction in transactions {
        let Some(second) = value(transaction, SECOND_DATE) else {
            continue;
        };
        with_second += 1;
        if value(transaction, FIRST_DATE) != Some(second) {
            mismatched += 1;
        }
    }

    (with_second > 0).then(|| f64::from(mismatched) / f64::from(with_second))
}

fn value(transaction: &Transaction, key: FieldKey) -> Option<&str> {
    transaction
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .and_then(|(_, value)| value)
        .filter(|text| !text.is_empty())
}

/// Splits rows holding two side-by-side tables into one record per table.
/// Index 1 fields form the left record, index 2 fields the right one; a side
/// with no non-empty value is dropped.
pub(crate) fn split_tables(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut split = Vec::with_capacity(transactions.len() * 2);

    for transaction in transactions {
        let (mut left, mut right) = (Transaction::default(), Transaction::default());
        for (key, value) in transaction.into_fields() {
            match key.index {
                Some(1) => left.insert(FieldKey::bare(key.role), value),
                Some(2) => right.insert(FieldKey::bare(key.role), value),
                _ => {}
            }
        }

        split.extend([left, right].into_iter().filter(Transaction::has_value));
    }

    split
}

/// Applies [`split_tables`] when the mismatch ratio exceeds `threshold`.
/// Returns the ratio that triggered the split, if any.
pub(crate) fn split_if_dual(
    transactions: Vec<Transaction>,
    threshold: f64,
) -> (Vec<Transaction>, Option<f64>) {
    match date_mismatch_ratio(&transactions) {
        Some(ratio) if ratio > threshold => (split_tables(transactions), Some(ratio)),
        _ => (transactions, None),
    }
}

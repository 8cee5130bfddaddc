use std::io::Write;

use csv::WriterBuilder;

use crate::error::ParseError;
use crate::model::StatementLayout;
use crate::transactions::{FieldKey, Transaction};

pub fn write_json<W: Write>(writer: W, layout: &StatementLayout) -> Result<(), ParseError> {
    serde_json::to_writer_pretty(writer, layout)?;
    Ok(())
}

/// Columns in the order keys are first seen across `transactions`.
fn csv_headers(transactions: &[Transaction]) -> Vec<FieldKey> {
    let mut headers = Vec::new();
    for (key, _) in transactions.iter().flat_map(|transaction| transaction.iter()) {
        if !headers.contains(&key) {
            headers.push(key);
        }
    }
    headers
}

/// Writes one CSV row per transaction; missing and unmatched fields are
/// empty cells.
pub fn write_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
    delimiter: u8,
) -> Result<(), ParseError> {
    let headers = csv_headers(transactions);
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    if headers.is_empty() {
        writer.flush()?;
        return Ok(());
    }

    writer.write_record(headers.iter().map(ToString::to_string))?;
    for transaction in transactions {
        let row = headers.iter().map(|key| {
            transaction
                .get(&key.to_string())
                .unwrap_or_default()
                .to_string()
        });
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn csv_to_string(transactions: &[Transaction], delimiter: u8) -> Result<String, ParseError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, transactions, delimiter)?;
    Ok(String::from_utf8(buffer)?)
}

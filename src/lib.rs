mod columns;
mod dates;
mod dual_table;
mod error;
mod event;
mod header;
mod labels;
mod model;
mod options;
mod output;
mod rows;
mod token_source;
mod transactions;

use std::path::Path;

use crate::dual_table::split_if_dual;
use crate::header::find_header;
use crate::rows::group_by_page;
use crate::token_source::validate_tokens;
use crate::transactions::extract_transactions;

pub use columns::{ColumnRole, ColumnRoleSet};
pub use dates::is_date_like;
pub use error::ParseError;
pub use event::{EventSink, LayoutEvent, RecordingSink, SkipReason, TracingSink};
pub use model::{HeaderInfo, HeaderLabel, ParseReport, StatementLayout, Token};
pub use options::{PageSelection, ParseOptions};
pub use output::{csv_to_string, write_csv, write_json};
pub use token_source::{extract_tokens_from_pdf, extract_tokens_from_pdf_bytes, tokens_from_json};
pub use transactions::{FieldKey, Transaction, parse_amount};

/// Infers header rows and transactions for every page of a document.
///
/// Pages without a usable header or date column contribute nothing; only
/// malformed tokens and invalid options are errors.
pub fn parse_statement(
    tokens: &[Token],
    options: &ParseOptions,
) -> Result<StatementLayout, ParseError> {
    parse_statement_with_sink(tokens, options, &mut TracingSink)
}

pub fn parse_statement_with_sink(
    tokens: &[Token],
    options: &ParseOptions,
    sink: &mut dyn EventSink,
) -> Result<StatementLayout, ParseError> {
    let (layout, _) = run(tokens, options, sink)?;
    Ok(layout)
}

/// Like [`parse_statement_with_sink`], also returning summary counters.
pub fn parse_statement_with_report(
    tokens: &[Token],
    options: &ParseOptions,
    sink: &mut dyn EventSink,
) -> Result<(StatementLayout, ParseReport), ParseError> {
    run(tokens, options, sink)
}

/// Reads tokens from a PDF and parses them.
pub fn parse_pdf_statement(
    input_pdf: &Path,
    options: &ParseOptions,
) -> Result<(StatementLayout, ParseReport), ParseError> {
    let tokens = extract_tokens_from_pdf(input_pdf)?;
    run(&tokens, options, &mut TracingSink)
}

fn run(
    tokens: &[Token],
    options: &ParseOptions,
    sink: &mut dyn EventSink,
) -> Result<(StatementLayout, ParseReport), ParseError> {
    options.validate()?;
    validate_tokens(tokens)?;

    let mut pages = group_by_page(tokens);
    if let Some(selection) = &options.pages {
        pages.retain(|page, _| selection.contains(*page));
        if pages.is_empty() {
            return Err(ParseError::NoPagesSelected);
        }
    }

    let mut layout = StatementLayout::default();
    let mut report = ParseReport {
        page_count: pages.len(),
        ..ParseReport::default()
    };

    for (page, page_tokens) in &pages {
        let page = *page;
        sink.emit(LayoutEvent::PageStarted {
            page,
            token_count: page_tokens.len(),
        });

        let Some(header) = find_header(page, page_tokens, options, sink) else {
            sink.emit(LayoutEvent::PageSkipped {
                page,
                reason: SkipReason::NoHeader,
            });
            continue;
        };

        sink.emit(LayoutEvent::HeaderSelected {
            page,
            y: header.y,
            labels: header
                .headings
                .iter()
                .map(|label| label.text.clone())
                .collect(),
        });
        report.pages_with_header += 1;

        let columns = ColumnRoleSet::from_labels(&header.headings);
        let rows = if columns.has_dates() {
            extract_transactions(page_tokens, &header, &columns, options.column_x_tol)
        } else {
            Vec::new()
        };
        layout.headings.insert(page, header);

        if !columns.has_dates() {
            sink.emit(LayoutEvent::PageSkipped {
                page,
                reason: SkipReason::NoDateColumns,
            });
            continue;
        }

        let (rows, dual_ratio) = split_if_dual(rows, options.dual_table_ratio);
        if let Some(mismatch_ratio) = dual_ratio {
            report.dual_table_pages += 1;
            sink.emit(LayoutEvent::DualTableDetected {
                page,
                mismatch_ratio,
            });
        }

        layout.transactions.extend(rows);
    }

    report.transaction_count = layout.transactions.len();
    sink.emit(LayoutEvent::ParseComplete {
        page_count: report.page_count,
        transaction_count: report.transaction_count,
    });

    Ok((layout, report))
}

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use statement_tables::Token;

pub const PAGE_HEIGHT: i64 = 842;

/// A text run placed at `x` and `y`, with `y` measured from the top of the
/// page like extracted tokens.
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub text: &'a str,
    pub x: i64,
    pub y: i64,
}

pub const fn at(text: &str, x: i64, y: i64) -> Placed<'_> {
    Placed { text, x, y }
}

fn page_operations(runs: &[Placed<'_>]) -> Vec<Operation> {
    let mut operations = Vec::new();
    for run in runs {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![run.x.into(), (PAGE_HEIGHT - run.y).into()]),
            Operation::new("Tj", vec![Object::string_literal(run.text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    operations
}

pub fn create_statement_pdf(
    path: &Path,
    pages: &[Vec<Placed<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = pages
        .iter()
        .map(|runs| page_operations(runs))
        .collect::<Vec<_>>();
    create_pdf_from_operations(path, contents)
}

pub fn create_pdf_from_operations(
    path: &Path,
    pages: Vec<Vec<Operation>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// Header plus three body rows; the third has no date and must be dropped.
pub fn single_account_page() -> Vec<Placed<'static>> {
    vec![
        at("Statement period 01/12/2025 to 31/12/2025", 10, 20),
        at("Date", 10, 50),
        at("Description", 100, 50),
        at("Amount", 300, 50),
        at("Balance", 400, 50),
        at("07/12/2025", 12, 80),
        at("Coffee Shop", 105, 80),
        at("-45.00", 310, 80),
        at("955.00", 402, 80),
        at("8 December 2025", 12, 100),
        at("Salary", 105, 100),
        at("1,200.00", 305, 100),
        at("2,155.00", 402, 100),
        at("Balance carried forward", 105, 120),
        at("2,155.00", 402, 120),
    ]
}

pub fn tokens(page_number: u32, runs: &[Placed<'_>]) -> Vec<Token> {
    runs.iter()
        .map(|run| Token::new(run.text, run.x as f64, run.y as f64, page_number))
        .collect()
}

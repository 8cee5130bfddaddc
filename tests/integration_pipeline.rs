mod common;

use std::process::Command;

use common::{at, create_pdf_from_operations, create_statement_pdf, single_account_page};
use lopdf::Object;
use lopdf::content::Operation;
use pretty_assertions::assert_eq;
use statement_tables::{
    ParseOptions, RecordingSink, SkipReason, Token, extract_tokens_from_pdf,
    extract_tokens_from_pdf_bytes, parse_pdf_statement, parse_statement_with_report,
    parse_statement_with_sink,
};
use tempfile::tempdir;

#[test]
fn extracts_tokens_with_top_down_coordinates() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tokens.pdf");
    create_statement_pdf(
        &input,
        &[vec![at("Date", 10, 50)], vec![at("Balance", 400, 70)]],
    )
    .expect("PDF fixture should be created");

    let tokens = extract_tokens_from_pdf(&input).expect("tokens should be extracted");
    assert_eq!(
        tokens,
        vec![
            Token::new("Date", 10.0, 50.0, 1),
            Token::new("Balance", 400.0, 70.0, 2),
        ]
    );
}

#[test]
fn reads_tokens_from_in_memory_pdf() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("memory.pdf");
    create_statement_pdf(&input, &[single_account_page()]).expect("PDF fixture should be created");
    let bytes = std::fs::read(&input).expect("PDF should be readable");

    let tokens = extract_tokens_from_pdf_bytes(&bytes).expect("tokens should be extracted");
    assert_eq!(tokens, common::tokens(1, &single_account_page()));

    let mut sink = RecordingSink::default();
    let layout = parse_statement_with_sink(&tokens, &ParseOptions::default(), &mut sink)
        .expect("parsing should succeed");
    assert_eq!(layout.transactions.len(), 2);
    assert_eq!(layout.transactions[1].get("description1"), Some("Salary"));
}

#[test]
fn rejects_bytes_that_are_not_a_pdf() {
    assert!(extract_tokens_from_pdf_bytes(b"not a pdf").is_err());
}

#[test]
fn follows_text_matrix_and_line_leading() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("matrix.pdf");
    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), 40.into(), 800.into()],
        ),
        Operation::new("TL", vec![12.into()]),
        Operation::new("Tj", vec![Object::string_literal("First")]),
        Operation::new("Tj", vec![Object::string_literal(" line")]),
        Operation::new("T*", vec![]),
        Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("Second"),
                Object::Integer(-250),
                Object::string_literal("line"),
            ])],
        ),
        Operation::new("ET", vec![]),
    ];
    create_pdf_from_operations(&input, vec![operations]).expect("PDF fixture should be created");

    let tokens = extract_tokens_from_pdf(&input).expect("tokens should be extracted");
    assert_eq!(
        tokens,
        vec![
            Token::new("First line", 40.0, 42.0, 1),
            Token::new("Second line", 40.0, 54.0, 1),
        ]
    );
}

#[test]
fn applies_transformation_matrix_to_text_positions() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("transformed.pdf");
    let text_at = |text: &str, x: i64, y: i64| {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    };

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()],
        ),
    ];
    operations.extend(text_at("Scaled", 20, 400));
    operations.push(Operation::new("Q", vec![]));
    operations.extend(text_at("Plain", 10, 742));
    operations.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![1.into(), 0.into(), 0.into(), (-1).into(), 0.into(), 842.into()],
        ),
    ]);
    operations.extend(text_at("Flipped", 40, 300));
    operations.push(Operation::new("Q", vec![]));
    create_pdf_from_operations(&input, vec![operations]).expect("PDF fixture should be created");

    let tokens = extract_tokens_from_pdf(&input).expect("tokens should be extracted");
    assert_eq!(
        tokens,
        vec![
            Token::new("Scaled", 40.0, 42.0, 1),
            Token::new("Plain", 10.0, 100.0, 1),
            Token::new("Flipped", 40.0, 300.0, 1),
        ]
    );
}

#[test]
fn reconstructs_transactions_from_pdf() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("statement.pdf");
    create_statement_pdf(&input, &[single_account_page()]).expect("PDF fixture should be created");

    let (layout, report) =
        parse_pdf_statement(&input, &ParseOptions::default()).expect("parsing should succeed");

    assert_eq!(report.page_count, 1);
    assert_eq!(report.transaction_count, 2);
    assert_eq!(layout.headings[&1].y, 50.0);

    let first = &layout.transactions[0];
    assert_eq!(first.get("date1"), Some("07/12/2025"));
    assert_eq!(first.get("description1"), Some("Coffee Shop"));
    assert_eq!(first.get("amount1"), Some("-45.00"));
    assert_eq!(first.get("balance1"), Some("955.00"));

    let second = &layout.transactions[1];
    assert_eq!(second.get("date1"), Some("8 December 2025"));
    assert_eq!(second.numeric("amount1"), Some(1200.0));
}

#[test]
fn merges_wrapped_header_labels() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("wrapped.pdf");
    create_statement_pdf(
        &input,
        &[vec![
            at("Transaction", 100, 40),
            at("Posting", 10, 40),
            at("Date", 10, 46),
            at("Date", 102, 46),
            at("Details", 200, 46),
            at("Balance", 400, 46),
            at("01/12/2025", 12, 80),
            at("01/12/2025", 104, 80),
            at("Card payment", 205, 80),
            at("10.00", 400, 80),
        ]],
    )
    .expect("PDF fixture should be created");

    let (layout, _) =
        parse_pdf_statement(&input, &ParseOptions::default()).expect("parsing should succeed");

    let labels = layout.headings[&1]
        .headings
        .iter()
        .map(|label| (label.text.as_str(), label.x, label.y))
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec![
            ("Posting Date", 10.0, 40.0),
            ("Transaction Date", 100.0, 40.0),
            ("Details", 200.0, 46.0),
            ("Balance", 400.0, 46.0),
        ]
    );

    let transaction = &layout.transactions[0];
    assert_eq!(transaction.get("date1"), Some("01/12/2025"));
    assert_eq!(transaction.get("date2"), Some("01/12/2025"));
    assert_eq!(transaction.get("description1"), Some("Card payment"));
}

#[test]
fn splits_two_side_by_side_tables() {
    let runs = vec![
        at("Date", 10, 50),
        at("Details", 80, 50),
        at("Amount", 200, 50),
        at("Date", 300, 50),
        at("Details", 370, 50),
        at("Amount", 490, 50),
        at("01/01/2025", 10, 80),
        at("Rent", 80, 80),
        at("500.00", 205, 80),
        at("03/01/2025", 300, 80),
        at("Salary", 370, 80),
        at("900.00", 495, 80),
        at("02/01/2025", 10, 100),
        at("Water", 80, 100),
        at("30.00", 205, 100),
        at("04/01/2025", 300, 100),
        at("Refund", 370, 100),
        at("12.00", 495, 100),
    ];
    let tokens = common::tokens(1, &runs);

    let mut sink = RecordingSink::default();
    let (layout, report) =
        parse_statement_with_report(&tokens, &ParseOptions::default(), &mut sink)
            .expect("parsing should succeed");

    assert_eq!(sink.dual_table_pages(), vec![1]);
    assert_eq!(report.dual_table_pages, 1);
    let records = layout
        .transactions
        .iter()
        .map(|record| {
            (
                record.get("date").unwrap_or_default(),
                record.get("description").unwrap_or_default(),
                record.get("amount").unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        records,
        vec![
            ("01/01/2025", "Rent", "500.00"),
            ("03/01/2025", "Salary", "900.00"),
            ("02/01/2025", "Water", "30.00"),
            ("04/01/2025", "Refund", "12.00"),
        ]
    );
}

#[test]
fn parses_each_page_with_its_own_header() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("pages.pdf");
    create_statement_pdf(
        &input,
        &[
            single_account_page(),
            vec![at("Important information about your account", 10, 60)],
            vec![
                at("Date", 40, 100),
                at("Transaction", 140, 100),
                at("Money out", 300, 100),
                at("Money in", 380, 100),
                at("Balance", 460, 100),
                at("13 Nov 24", 40, 130),
                at("Transfer", 140, 130),
                at("250.00", 385, 130),
                at("2,405.00", 460, 130),
            ],
        ],
    )
    .expect("PDF fixture should be created");

    let tokens = extract_tokens_from_pdf(&input).expect("tokens should be extracted");
    let mut sink = RecordingSink::default();
    let (layout, report) = parse_statement_with_report(&tokens, &ParseOptions::default(), &mut sink)
        .expect("parsing should succeed");

    assert_eq!(report.page_count, 3);
    assert_eq!(report.pages_with_header, 2);
    assert_eq!(sink.skipped_pages(), vec![(2, SkipReason::NoHeader)]);
    assert_eq!(layout.transactions.len(), 3);

    let last = &layout.transactions[2];
    assert_eq!(last.get("date1"), Some("13 Nov 24"));
    assert_eq!(last.get("amount1"), None);
    assert_eq!(last.get("amount2"), Some("250.00"));
    assert_eq!(last.get("balance1"), Some("2,405.00"));
}

#[test]
fn cli_writes_json_for_statement_pdf() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli.pdf");
    let output = dir.path().join("cli.json");
    create_statement_pdf(&input, &[single_account_page()]).expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_stmt2json"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(0));

    let json = std::fs::read_to_string(&output).expect("JSON should be readable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("output is JSON");
    assert_eq!(value["transactions"][0]["date1"], "07/12/2025");
    assert_eq!(value["headings"]["1"]["headings"][0]["text"], "Date");
}

#[test]
fn cli_writes_csv_from_token_dump() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("tokens.json");
    let output = dir.path().join("out.csv");
    let tokens = common::tokens(1, &single_account_page());
    std::fs::write(&input, serde_json::to_string(&tokens).expect("tokens serialize"))
        .expect("token dump should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_stmt2json"))
        .args([
            "extract",
            "--tokens",
            "--format",
            "csv",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(0));

    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date1,description1,amount1,balance1"));
    assert_eq!(lines.next(), Some("07/12/2025,Coffee Shop,-45.00,955.00"));
}

#[test]
fn cli_exits_with_code_2_when_no_transactions() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("empty.pdf");
    let output = dir.path().join("empty.json");
    create_statement_pdf(&input, &[vec![at("No table here", 10, 50)]])
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_stmt2json"))
        .args([
            "extract",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_exits_with_code_1_on_contract_violation() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("bad.json");
    std::fs::write(&input, r#"[{"text": "Date", "x": "ten", "y": 1, "page_number": 1}]"#)
        .expect("token dump should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_stmt2json"))
        .args(["extract", "--tokens", "-i", &input.to_string_lossy()])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(1));
}

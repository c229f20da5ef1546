//! Snapshot tests for whole-document layouts

use quill_formatter::{format_source, FormatConfig};

fn fmt(source: &str) -> String {
    format_source(source, &FormatConfig::default()).expect("format failed")
}

#[test]
fn test_nested_let_layout() {
    insta::assert_snapshot!("nested_let", fmt("let x = let y = 1 in y in x"));
}

#[test]
fn test_broken_invoke_layout() {
    insta::assert_snapshot!(
        "broken_invoke",
        fmt("Table.AddColumn(initialTableValue, \"ScoreColumn\", each currentRowScore * 2)")
    );
}

#[test]
fn test_section_document_layout() {
    insta::assert_snapshot!(
        "section_document",
        fmt("section s;\nTable.A = 1; // note\nTable.B = 2;")
    );
}

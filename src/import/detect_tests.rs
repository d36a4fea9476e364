#![allow(clippy::unwrap_used)]

use super::*;
use std::io::Cursor;

fn detect(name: &str, bytes: &[u8]) -> Result<Format, ImportError> {
    detect_format(name, &mut Cursor::new(bytes.to_vec()))
}

// ── Suffix policy ─────────────────────────────────────────────

#[test]
fn test_detect_csv() {
    let fmt = detect("statement.csv", b"date,amount\n").unwrap();
    assert_eq!(fmt, Format::DelimitedText { delimiter: b',' });
}

#[test]
fn test_detect_tsv() {
    let fmt = detect("statement.tsv", b"date\tamount\n").unwrap();
    assert_eq!(fmt, Format::DelimitedText { delimiter: b'\t' });
}

#[test]
fn test_detect_suffix_case_insensitive() {
    assert!(detect("STATEMENT.CSV", b"date\n").is_ok());
    assert_eq!(
        detect("Jan.XLSX", b"PK\x03\x04rest").unwrap(),
        Format::Spreadsheet
    );
}

#[test]
fn test_detect_xlsx() {
    assert_eq!(
        detect("jan.xlsx", b"PK\x03\x04\x14\x00\x06\x00").unwrap(),
        Format::Spreadsheet
    );
}

#[test]
fn test_detect_unknown_suffix() {
    let err = detect("statement.pdf", b"%PDF-1.7").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_no_suffix() {
    let err = detect("statement", b"date,amount\n").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_legacy_xls_rejected() {
    let err = detect("old.xls", OLE2_MAGIC).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

// ── Content sniffing ──────────────────────────────────────────

#[test]
fn test_detect_xlsx_name_with_text_content() {
    let err = detect("fake.xlsx", b"date,amount\n2024-01-05,1\n").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_csv_name_with_zip_content() {
    let err = detect("renamed.csv", b"PK\x03\x04\x14\x00").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_csv_name_with_ole_content() {
    let err = detect("renamed.csv", OLE2_MAGIC).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_empty_csv() {
    assert!(detect("empty.csv", b"").is_ok());
}

#[test]
fn test_detect_empty_xlsx_rejected() {
    let err = detect("empty.xlsx", b"").unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat));
}

#[test]
fn test_detect_rewinds_stream() {
    let mut cursor = Cursor::new(b"date,amount\n".to_vec());
    detect_format("a.csv", &mut cursor).unwrap();
    assert_eq!(cursor.position(), 0);
}

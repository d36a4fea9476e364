#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

fn row(cells: &[(&str, &str)]) -> RawRow {
    RawRow {
        line: 7,
        cells: cells
            .iter()
            .map(|(k, v)| (k.to_string(), Cell::Text(v.to_string())))
            .collect(),
    }
}

fn full_row() -> RawRow {
    row(&[
        ("date", "2024-01-05"),
        ("description", "Coffee"),
        ("category", "Food"),
        ("amount", "4.50"),
        ("type", "expense"),
    ])
}

fn fault_of(r: &RawRow) -> (Field, RowFault) {
    let err = normalize_row(&user(), r).unwrap_err();
    assert_eq!(err.row, 7);
    (err.field, err.fault)
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn test_normalize_full_row() {
    let txn = normalize_row(&user(), &full_row()).unwrap();
    assert_eq!(txn.user_id, user());
    assert_eq!(txn.date, "2024-01-05");
    assert_eq!(txn.description, "Coffee");
    assert_eq!(txn.category, "Food");
    assert_eq!(txn.amount, dec!(4.50));
    assert_eq!(txn.kind, TransactionType::Expense);
}

#[test]
fn test_normalize_defaults() {
    let txn = normalize_row(&user(), &row(&[("date", "2024-01-05"), ("amount", "10")])).unwrap();
    assert_eq!(txn.description, "");
    assert_eq!(txn.category, "Uncategorized");
    assert_eq!(txn.kind, TransactionType::Expense);
}

#[test]
fn test_normalize_blank_category_and_type_default() {
    let mut r = full_row();
    r.cells.insert("category".into(), Cell::Text("  ".into()));
    r.cells.insert("type".into(), Cell::Text("".into()));
    let txn = normalize_row(&user(), &r).unwrap();
    assert_eq!(txn.category, DEFAULT_CATEGORY);
    assert_eq!(txn.kind, TransactionType::Expense);
}

#[test]
fn test_normalize_description_passthrough() {
    let mut r = full_row();
    r.cells
        .insert("description".into(), Cell::Text("  STARBUCKS #12 ".into()));
    let txn = normalize_row(&user(), &r).unwrap();
    assert_eq!(txn.description, "  STARBUCKS #12 ");
}

#[test]
fn test_normalize_type_case_insensitive() {
    let mut r = full_row();
    r.cells.insert("type".into(), Cell::Text(" Income ".into()));
    let txn = normalize_row(&user(), &r).unwrap();
    assert_eq!(txn.kind, TransactionType::Income);
}

#[test]
fn test_normalize_numeric_cells() {
    let mut r = full_row();
    r.cells.insert("amount".into(), Cell::Number(-12.25));
    r.cells.insert("description".into(), Cell::Number(42.0));
    let txn = normalize_row(&user(), &r).unwrap();
    assert_eq!(txn.amount, dec!(-12.25));
    assert_eq!(txn.description, "42");
}

#[test]
fn test_normalize_date_formats() {
    for (raw, expected) in [
        ("01/05/2024", "2024-01-05"),
        ("01-05-2024", "2024-01-05"),
        ("2024/01/05", "2024-01-05"),
        ("31/01/2024", "2024-01-31"),
        ("01/15/24", "2024-01-15"),
        ("12/31/99", "1999-12-31"),
        ("2024-01-05T13:45:00", "2024-01-05"),
        ("2024-01-05 13:45:00", "2024-01-05"),
        (" 2024-01-05 ", "2024-01-05"),
    ] {
        let mut r = full_row();
        r.cells.insert("date".into(), Cell::Text(raw.into()));
        assert_eq!(normalize_row(&user(), &r).unwrap().date, expected, "{raw}");
    }
}

#[test]
fn test_each_date_format_has_its_own_input() {
    let cases = [
        ("%Y-%m-%d", "2024-01-15", "2024-01-15"),
        ("%m/%d/%Y", "01/15/2024", "2024-01-15"),
        ("%m-%d-%Y", "01-15-2024", "2024-01-15"),
        ("%m/%d/%y", "01/15/24", "2024-01-15"),
        ("%d/%m/%Y", "15/01/2024", "2024-01-15"),
        ("%Y/%m/%d", "2024/01/15", "2024-01-15"),
    ];
    assert_eq!(cases.len(), DATE_FORMATS.len());
    for (fmt, raw, expected) in cases {
        let accepted: Vec<&str> = DATE_FORMATS
            .iter()
            .copied()
            .filter(|f| parse_date_as(raw, f).is_some())
            .collect();
        assert_eq!(accepted, vec![fmt], "{raw}");
        assert_eq!(
            parse_date(raw).unwrap().format("%Y-%m-%d").to_string(),
            expected
        );
    }
}

#[test]
fn test_four_digit_formats_refuse_short_years() {
    assert_eq!(parse_date_as("01/15/24", "%m/%d/%Y"), None);
    assert_eq!(parse_date_as("24-01-05", "%Y-%m-%d"), None);
    assert_eq!(parse_date_as("0024-01-05", "%Y-%m-%d"), None);
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn test_normalize_missing_date_rejected() {
    let mut r = full_row();
    r.cells.remove("date");
    assert_eq!(fault_of(&r), (Field::Date, RowFault::Missing));
}

#[test]
fn test_normalize_blank_date_rejected() {
    let mut r = full_row();
    r.cells.insert("date".into(), Cell::Text("   ".into()));
    assert_eq!(fault_of(&r), (Field::Date, RowFault::Missing));
}

#[test]
fn test_normalize_bad_date_rejected() {
    let mut r = full_row();
    r.cells.insert("date".into(), Cell::Text("yesterday".into()));
    assert_eq!(
        fault_of(&r),
        (Field::Date, RowFault::InvalidDate("yesterday".into()))
    );
}

#[test]
fn test_normalize_two_digit_year_first_rejected() {
    let mut r = full_row();
    r.cells.insert("date".into(), Cell::Text("24-01-05".into()));
    assert_eq!(
        fault_of(&r),
        (Field::Date, RowFault::InvalidDate("24-01-05".into()))
    );
}

#[test]
fn test_normalize_non_numeric_amount_rejected() {
    let mut r = full_row();
    r.cells.insert("amount".into(), Cell::Text("abc".into()));
    assert_eq!(
        fault_of(&r),
        (Field::Amount, RowFault::InvalidAmount("abc".into()))
    );
}

#[test]
fn test_normalize_missing_amount_rejected() {
    let mut r = full_row();
    r.cells.remove("amount");
    assert_eq!(fault_of(&r), (Field::Amount, RowFault::Missing));
}

#[test]
fn test_normalize_unknown_type_rejected() {
    let mut r = full_row();
    r.cells.insert("type".into(), Cell::Text("transfer".into()));
    assert_eq!(
        fault_of(&r),
        (Field::Type, RowFault::InvalidType("transfer".into()))
    );
}

#[test]
fn test_normalize_reports_first_field_in_rule_order() {
    let r = row(&[("date", "nope"), ("amount", "abc"), ("type", "x")]);
    assert_eq!(fault_of(&r).0, Field::Date);
}

// ── Rule table ────────────────────────────────────────────────

#[test]
fn test_rules_cover_every_field_once() {
    let fields: Vec<Field> = RULES.iter().map(|r| r.field).collect();
    assert_eq!(
        fields,
        vec![
            Field::Date,
            Field::Description,
            Field::Category,
            Field::Amount,
            Field::Type
        ]
    );
}

#[test]
fn test_rules_required_fields() {
    let required: Vec<Field> = RULES
        .iter()
        .filter(|r| r.presence == Presence::Required)
        .map(|r| r.field)
        .collect();
    assert_eq!(required, vec![Field::Date, Field::Amount]);
}

// ── parse_decimal ─────────────────────────────────────────────

#[test]
fn test_parse_decimal_basic() {
    assert_eq!(parse_decimal("100.50"), Some(dec!(100.50)));
    assert_eq!(parse_decimal("-42.99"), Some(dec!(-42.99)));
    assert_eq!(parse_decimal("42"), Some(dec!(42)));
}

#[test]
fn test_parse_decimal_with_currency() {
    assert_eq!(parse_decimal("$1,234.56"), Some(dec!(1234.56)));
    assert_eq!(parse_decimal("-$99.99"), Some(dec!(-99.99)));
}

#[test]
fn test_parse_decimal_parentheses_negative() {
    assert_eq!(parse_decimal("(500.00)"), Some(dec!(-500.00)));
}

#[test]
fn test_parse_decimal_invalid() {
    assert_eq!(parse_decimal("abc"), None);
    assert_eq!(parse_decimal(""), None);
    assert_eq!(parse_decimal("$"), None);
    assert_eq!(parse_decimal("NaN"), None);
}

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::str::FromStr;

use super::error::{Field, RowError, RowFault};
use super::table::{Cell, RawRow};
use crate::models::{Transaction, TransactionType, UserId, DEFAULT_CATEGORY};

/// Tried in order. chrono's `%Y` also reads one to three digits, so
/// anything before year 1000 is refused and short years fall through to `%y`.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presence {
    Required,
    DefaultTo(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldRule {
    pub(crate) field: Field,
    pub(crate) presence: Presence,
    /// Whether a whitespace-only value is treated as if the cell were absent.
    pub(crate) blank_is_absent: bool,
}

/// How each canonical column is resolved from a raw row. Coercion happens
/// afterwards in `normalize_row`; a row reports the first failing field in
/// this order.
pub(crate) const RULES: [FieldRule; 5] = [
    FieldRule {
        field: Field::Date,
        presence: Presence::Required,
        blank_is_absent: true,
    },
    FieldRule {
        field: Field::Description,
        presence: Presence::DefaultTo(""),
        blank_is_absent: false,
    },
    FieldRule {
        field: Field::Category,
        presence: Presence::DefaultTo(DEFAULT_CATEGORY),
        blank_is_absent: true,
    },
    FieldRule {
        field: Field::Amount,
        presence: Presence::Required,
        blank_is_absent: true,
    },
    FieldRule {
        field: Field::Type,
        presence: Presence::DefaultTo("expense"),
        blank_is_absent: true,
    },
];

/// Turn one raw row into a canonical transaction owned by `user`.
pub(crate) fn normalize_row(user: &UserId, row: &RawRow) -> Result<Transaction, RowError> {
    let [date, description, category, amount, kind] =
        RULES.map(|rule| resolve(row, &rule).map_err(|fault| row_error(row, rule.field, fault)));

    let date = date?;
    let date = parse_date(&date).ok_or_else(|| {
        row_error(row, Field::Date, RowFault::InvalidDate(date.into_owned()))
    })?;
    let description = description?.into_owned();
    let category = category?.into_owned();
    let amount = amount?;
    let amount = parse_decimal(&amount).ok_or_else(|| {
        row_error(row, Field::Amount, RowFault::InvalidAmount(amount.into_owned()))
    })?;
    let kind = kind?;
    let kind = TransactionType::parse(&kind).ok_or_else(|| {
        row_error(row, Field::Type, RowFault::InvalidType(kind.into_owned()))
    })?;

    Ok(Transaction {
        user_id: user.clone(),
        date: date.format("%Y-%m-%d").to_string(),
        description,
        category,
        amount,
        kind,
    })
}

fn row_error(row: &RawRow, field: Field, fault: RowFault) -> RowError {
    RowError {
        row: row.line,
        field,
        fault,
    }
}

/// The raw text for a field after applying its presence rule.
fn resolve<'a>(row: &'a RawRow, rule: &FieldRule) -> Result<Cow<'a, str>, RowFault> {
    let value = match row.get(rule.field.column()) {
        Some(Cell::Text(s)) if rule.blank_is_absent && s.trim().is_empty() => None,
        Some(Cell::Text(s)) => Some(Cow::Borrowed(s.as_str())),
        Some(cell @ Cell::Number(_)) => Some(Cow::Owned(cell.to_text())),
        None => None,
    };
    match (value, rule.presence) {
        (Some(v), _) => Ok(v),
        (None, Presence::DefaultTo(default)) => Ok(Cow::Borrowed(default)),
        (None, Presence::Required) => Err(RowFault::Missing),
    }
}

const MIN_YEAR: i32 = 1000;

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_date_as(s, fmt))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
                .filter(|d| d.year() >= MIN_YEAR)
        })
}

fn parse_date_as(s: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, fmt)
        .ok()
        .filter(|d| d.year() >= MIN_YEAR)
}

/// Strict: anything that is not a number after stripping currency
/// punctuation is rejected rather than read as zero.
fn parse_decimal(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned = body.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    let value = Decimal::from_str(cleaned).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;

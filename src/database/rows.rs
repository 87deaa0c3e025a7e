// ABOUTME: Decoding helpers for TEXT-encoded ids, timestamps and day keys
// ABOUTME: Malformed stored values surface as storage errors rather than panics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::constants::plans::PLAN_DATE_FORMAT;
use crate::errors::{AppError, AppResult};

/// Encode an instant with fixed precision so TEXT ordering matches time ordering
pub fn encode_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_day(day: NaiveDate) -> String {
    day.format(PLAN_DATE_FORMAT).to_string()
}

pub fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::storage(format!("Invalid stored UUID '{value}': {e}")))
}

pub fn parse_optional_uuid(value: Option<String>) -> AppResult<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::storage(format!("Invalid stored timestamp '{value}': {e}")))
}

pub fn parse_optional_timestamp(value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

pub fn parse_day(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, PLAN_DATE_FORMAT)
        .map_err(|e| AppError::storage(format!("Invalid stored date '{value}': {e}")))
}

/// Parse an enum stored via `as_str`
pub fn parse_enum<T>(value: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| AppError::storage(format!("Invalid stored value: {}", e.message)))
}

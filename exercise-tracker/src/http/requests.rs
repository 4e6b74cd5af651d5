use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::dates::{from_epoch_millis, parse_date};

use super::error::ApiError;

/// A body value that may arrive as a JSON number or as text (forms always
/// send text).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct NewUserForm {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewExerciseForm {
    pub description: Option<String>,
    pub duration: Option<Scalar>,
    pub date: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
}

/// Missing or blank durations fail the same way a non-numeric one does.
pub fn parse_duration(value: Option<Scalar>) -> Result<f64, ApiError> {
    let minutes = match value {
        Some(Scalar::Number(minutes)) => minutes,
        Some(Scalar::Text(text)) if !text.trim().is_empty() => {
            text.trim().parse::<f64>().map_err(|_| {
                ApiError::InvalidInput(format!("duration is not a number: {text:?}"))
            })?
        }
        _ => return Err(ApiError::InvalidInput(String::from("duration is required"))),
    };

    if !minutes.is_finite() {
        return Err(ApiError::InvalidInput(format!(
            "duration is not a number: {minutes}"
        )));
    }
    Ok(minutes)
}

/// Resolves the optional exercise date; absent, empty or zero means now.
pub fn resolve_date(value: Option<Scalar>, now: DateTime<Utc>) -> Result<DateTime<Utc>, ApiError> {
    match value {
        None => Ok(now),
        Some(Scalar::Text(text)) if text.is_empty() => Ok(now),
        Some(Scalar::Text(text)) => Ok(parse_date(&text)?),
        Some(Scalar::Number(millis)) if millis == 0.0 => Ok(now),
        Some(Scalar::Number(millis)) => Ok(from_epoch_millis(millis)?),
    }
}

/// Empty query values count as absent.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        Some(text) if !text.is_empty() => Ok(Some(parse_date(text)?)),
        _ => Ok(None),
    }
}

/// `0` (or an empty value) means no cap; negative limits cap at their
/// absolute value.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, ApiError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    let limit: i64 = text
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("limit is not an integer: {text:?}")))?;
    if limit == 0 {
        return Ok(None);
    }
    Ok(Some(
        usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX),
    ))
}

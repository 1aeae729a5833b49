//! Validators for free-text answers
//!
//! Each validator normalizes the raw submission and either returns the value
//! to record or the corrective copy to show.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static TRACKING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{8,22}$").expect("tracking number pattern"));

static US_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("US date pattern"));

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("ISO date pattern"));

pub const CARRIERS: &[&str] = &["UPS", "USPS", "FedEx"];

const MIN_DAMAGE_DESCRIPTION: usize = 10;

/// A rejected submission: the bot reply and the new hint under the field
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: &'static str,
    pub hint: &'static str,
}

const BAD_TRACKING_NUMBER: ValidationError = ValidationError {
    message: "That number doesn't look right. Tracking numbers are 8-22 letters or digits.",
    hint: "Example: 1Z999AA10123456784",
};

const BAD_DATE_FORMAT: ValidationError = ValidationError {
    message: "Please use the MM/DD/YYYY format.",
    hint: "Example: 03/22/2024",
};

const IMPOSSIBLE_DATE: ValidationError = ValidationError {
    message: "That date does not seem valid. Try again using MM/DD/YYYY.",
    hint: "Example: 03/22/2024",
};

const FUTURE_DATE: ValidationError = ValidationError {
    message: "The date cannot be in the future.",
    hint: "Choose a date on or before today.",
};

const SHORT_DESCRIPTION: ValidationError = ValidationError {
    message: "Could you share a few more details about the damage?",
    hint: "Try adding at least 10 characters.",
};

/// Strip all whitespace (pasted numbers are often grouped) and uppercase
pub fn tracking_number(raw: &str) -> Result<String, ValidationError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !TRACKING_NUMBER_RE.is_match(&compact) {
        return Err(BAD_TRACKING_NUMBER);
    }
    Ok(compact.to_uppercase())
}

/// A real calendar date, `MM/DD/YYYY` or `YYYY-MM-DD`, no later than `today`.
/// The trimmed text is kept as entered.
pub fn expected_date(raw: &str, today: NaiveDate) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let (year, month, day) = if let Some(caps) = US_DATE_RE.captures(trimmed) {
        (caps[3].parse::<i32>(), caps[1].parse::<u32>(), caps[2].parse::<u32>())
    } else if let Some(caps) = ISO_DATE_RE.captures(trimmed) {
        (caps[1].parse::<i32>(), caps[2].parse::<u32>(), caps[3].parse::<u32>())
    } else {
        return Err(BAD_DATE_FORMAT);
    };

    let (Ok(year), Ok(month), Ok(day)) = (year, month, day) else {
        return Err(IMPOSSIBLE_DATE);
    };
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(IMPOSSIBLE_DATE)?;
    if date > today {
        return Err(FUTURE_DATE);
    }
    Ok(trimmed.to_string())
}

pub fn damage_description(raw: &str) -> Result<String, ValidationError> {
    let description = raw.trim();
    if description.chars().count() < MIN_DAMAGE_DESCRIPTION {
        return Err(SHORT_DESCRIPTION);
    }
    Ok(description.to_string())
}

/// Exact match against the supported carriers
pub fn carrier(value: &str) -> Option<&'static str> {
    CARRIERS.iter().copied().find(|carrier| *carrier == value)
}

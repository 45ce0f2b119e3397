//! Field-level validation rules
//!
//! Request payloads derive [`validator::Validate`]. The functions here are the
//! custom rules those derives call, plus the typed parses (status, priority,
//! due date) that need more than a string shape.
//!
//! Every rule runs both when a record is created and when a patch carries the
//! corresponding field. Failures are reported per field rather than on the
//! first problem.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::{ValidateLength, ValidationError, ValidationErrors};

use crate::models::task::{TaskPriority, TaskStatus};

/// Minimum title length (characters, after trimming)
pub const TITLE_MIN_LEN: u64 = 3;

/// Maximum title length (characters, after trimming)
pub const TITLE_MAX_LEN: u64 = 100;

/// Maximum description length (characters, after trimming)
pub const DESCRIPTION_MAX_LEN: u64 = 2000;

/// Minimum username length when a profile is updated
pub const USERNAME_MIN_LEN: u64 = 3;

/// A single failed field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation (wire name, e.g. `dueDate`)
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn rule_failure(message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new("invalid").with_message(message.into())
}

/// Records a failed typed parse under `field`, passing the value through on
/// success
pub fn parsed<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    result: Result<T, String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, rule_failure(message));
            None
        }
    }
}

/// Converts validator failures into itemized field errors
///
/// `field_errors()` is an unordered map, so fields are reported in `order`
/// (struct field names) and each field contributes its first failure only.
pub fn itemize(errors: &ValidationErrors, order: &[&str]) -> Vec<FieldError> {
    let by_field = errors.field_errors();

    let mut fields: Vec<&str> = by_field.keys().copied().collect();
    fields.sort_by_key(|field| {
        let rank = order.iter().position(|o| o == field).unwrap_or(order.len());
        (rank, *field)
    });

    fields
        .into_iter()
        .filter_map(|field| {
            let error = by_field.get(field)?.first()?;
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Validation failed".to_string());
            Some(FieldError::new(wire_name(field), message))
        })
        .collect()
}

/// `Ok(())` when nothing failed, otherwise the itemized failures
pub fn finish(errors: ValidationErrors, order: &[&str]) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(itemize(&errors, order))
    }
}

// Payload fields are snake_case in Rust and camelCase on the wire.
fn wire_name(field: &str) -> String {
    let mut parts = field.split('_');
    let head = parts.next().unwrap_or_default().to_string();

    parts.fold(head, |mut name, part| {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        name
    })
}

/// Title must be 3 to 100 characters once trimmed
pub fn check_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();

    if !trimmed.validate_length(Some(TITLE_MIN_LEN), None, None) {
        return Err(rule_failure(format!(
            "Title must be at least {} characters long",
            TITLE_MIN_LEN
        )));
    }
    if !trimmed.validate_length(None, Some(TITLE_MAX_LEN), None) {
        return Err(rule_failure(format!(
            "Title cannot exceed {} characters",
            TITLE_MAX_LEN
        )));
    }

    Ok(())
}

/// Description is required and capped at 2000 characters once trimmed
pub fn check_description(description: &str) -> Result<(), ValidationError> {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err(rule_failure("Please add a description"));
    }
    if !trimmed.validate_length(None, Some(DESCRIPTION_MAX_LEN), None) {
        return Err(rule_failure(format!(
            "Description cannot exceed {} characters",
            DESCRIPTION_MAX_LEN
        )));
    }

    Ok(())
}

/// The domain part of an email must contain a dot (`.+@.+\..+`)
///
/// Runs alongside the `email` rule, which accepts dotless hosts. Values
/// without an `@` are left to that rule.
pub fn check_email_domain(email: &str) -> Result<(), ValidationError> {
    match email.rsplit_once('@') {
        Some((_, domain)) if !domain.contains('.') => {
            Err(rule_failure("Please add a valid email"))
        }
        _ => Ok(()),
    }
}

/// Profile usernames must be non-blank and at least 3 characters
pub fn check_profile_username(username: &str) -> Result<(), ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(rule_failure("Username cannot be empty"));
    }
    if !trimmed.validate_length(Some(USERNAME_MIN_LEN), None, None) {
        return Err(rule_failure(format!(
            "Username must be at least {} characters long",
            USERNAME_MIN_LEN
        )));
    }

    Ok(())
}

/// Accepts an empty value (clears the number) or a plausible phone number:
/// optional leading `+`, then 7 to 15 digits with spaces, dashes or
/// parentheses as separators
pub fn check_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let allowed = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'));
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();

    if !allowed || !(7..=15).contains(&digits) {
        return Err(rule_failure("Please provide a valid phone number"));
    }

    Ok(())
}

pub fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    raw.parse::<TaskStatus>()
        .map_err(|_| "Invalid status value".to_string())
}

pub fn parse_priority(raw: &str) -> Result<TaskPriority, String> {
    raw.parse::<TaskPriority>()
        .map_err(|_| "Invalid priority value".to_string())
}

/// Day boundaries for due-date checks
///
/// "Today" is evaluated in a fixed UTC offset taken from configuration so the
/// midnight boundary does not depend on the host timezone.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Builds a calendar for an offset in minutes east of UTC
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    /// Start of the local day containing `now`, as a UTC instant
    pub fn start_of_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        self.midnight(local_date)
    }

    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN);
        // Fixed offsets have no gaps or folds, so the mapping is unique.
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }

    /// Parses a client-supplied due date
    ///
    /// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (local
    /// midnight). A blank value means "no due date".
    pub fn parse_due_date(&self, raw: &str) -> Result<Option<DateTime<Utc>>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Some(instant.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|date| Some(self.midnight(date)))
            .map_err(|_| "Invalid due date".to_string())
    }

    /// Parses a due date and rejects anything before the start of today
    pub fn validate_due_date(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, String> {
        let due = self.parse_due_date(raw)?;

        if let Some(due) = due {
            if due < self.start_of_day(now) {
                return Err("Due date cannot be in the past".to_string());
            }
        }

        Ok(due)
    }
}

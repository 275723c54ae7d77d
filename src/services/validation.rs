use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::error::ServiceError;

/// NUMERIC(20, 2): two fraction digits leave eighteen for the integer part
pub const MONEY_SCALE: u32 = 2;
const MONEY_INTEGER_DIGITS: u32 = 18;

pub const MAX_DISPLAY_NAME_LEN: usize = 200;
pub const MAX_EXTERNAL_REF_LEN: usize = 100;
pub const MAX_STATUS_LEN: usize = 50;
pub const MAX_PAYLOAD_LEN: usize = 10_000;

/// Parse a non-negative fixed-point amount given as a JSON string or number.
/// The result always carries exactly two fraction digits.
pub fn parse_money(field: &str, raw: &Value) -> Result<Decimal, ServiceError> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => return Err(ServiceError::validation(field, "is required")),
        _ => return Err(ServiceError::validation(field, "must be a decimal string or number")),
    };
    parse_money_str(field, &text)
}

pub fn parse_money_str(field: &str, text: &str) -> Result<Decimal, ServiceError> {
    let mut value = Decimal::from_str(text.trim())
        .map_err(|_| ServiceError::validation(field, format!("'{}' is not a decimal value", text)))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::validation(field, "must not be negative"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ServiceError::validation(
            field,
            format!("must have at most {} decimal places", MONEY_SCALE),
        ));
    }
    if value.trunc() >= Decimal::from(10u64.pow(MONEY_INTEGER_DIGITS)) {
        return Err(ServiceError::validation(
            field,
            format!("must have at most {} digits before the decimal point", MONEY_INTEGER_DIGITS),
        ));
    }

    value.rescale(MONEY_SCALE);
    Ok(value.abs())
}

pub fn validate_display_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("display_name", "must not be empty"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ServiceError::validation(
            "display_name",
            format!("must be at most {} characters", MAX_DISPLAY_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

/// Blank references are stored as NULL, i.e. an unlinked account
pub fn normalize_external_ref(raw: Option<String>) -> Result<Option<String>, ServiceError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_EXTERNAL_REF_LEN {
        return Err(ServiceError::validation(
            "external_ref",
            format!("must be at most {} characters", MAX_EXTERNAL_REF_LEN),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Status values are free-form; only blankness and length are checked
pub fn normalize_status(raw: Option<String>, default: &str) -> Result<String, ServiceError> {
    let status = raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string());
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(ServiceError::validation(
            "status",
            format!("must be at most {} characters", MAX_STATUS_LEN),
        ));
    }
    Ok(status)
}

pub fn validate_payload_message(raw: Option<String>) -> Result<String, ServiceError> {
    let message = raw.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(ServiceError::validation("message", "must not be empty"));
    }
    if message.chars().count() > MAX_PAYLOAD_LEN {
        return Err(ServiceError::validation(
            "message",
            format!("must be at most {} characters", MAX_PAYLOAD_LEN),
        ));
    }
    Ok(message)
}

//! Report input validation
//!
//! Every check runs before any write reaches the store; a failed check
//! leaves storage untouched.

use shared::error::{AppError, AppResult};
use shared::models::Report;

/// Maximum price per report (VND)
pub const MAX_PRICE: f64 = 1_000_000_000.0;
/// Maximum length of a note
pub const MAX_NOTE_LEN: usize = 500;
/// Maximum length of a display name
pub const MAX_NAME_LEN: usize = 200;
/// Maximum length of an image URL
pub const MAX_URL_LEN: usize = 2048;
/// Maximum length of one service label
pub const MAX_LABEL_LEN: usize = 100;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> AppResult<()> {
    require_finite(price, "price")?;
    if price <= 0.0 {
        return Err(AppError::validation(format!(
            "price must be positive, got {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "price exceeds maximum allowed ({MAX_PRICE}), got {price}"
        )));
    }
    Ok(())
}

fn validate_services(services: &[String]) -> AppResult<()> {
    if services.is_empty() {
        return Err(AppError::validation("at least one service label is required"));
    }
    for label in services {
        if label.trim().is_empty() {
            return Err(AppError::validation("service labels must not be blank"));
        }
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(AppError::validation(format!(
                "service label exceeds {MAX_LABEL_LEN} characters"
            )));
        }
    }
    Ok(())
}

fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    Ok(())
}

fn validate_optional_text(value: Option<&str>, field: &str, max_len: usize) -> AppResult<()> {
    if let Some(text) = value
        && text.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    Ok(())
}

/// Record invariants that hold at every point of the lifecycle.
///
/// Used after building a record from a draft and after applying a patch,
/// so an edit can never leave an invalid record behind.
pub fn validate_report(report: &Report) -> AppResult<()> {
    validate_price(report.price)?;
    validate_services(&report.services)?;
    validate_required_text(&report.employee_name, "employeeName", MAX_NAME_LEN)?;
    validate_optional_text(report.partner_name.as_deref(), "partnerName", MAX_NAME_LEN)?;
    validate_optional_text(report.note.as_deref(), "note", MAX_NOTE_LEN)?;
    validate_optional_text(report.image_url.as_deref(), "imageUrl", MAX_URL_LEN)?;
    Ok(())
}

/// Creation-time invariants: everything from [`validate_report`] plus the
/// photo policy. Edits may clear the image later; creation may not skip it.
pub fn validate_new_report(report: &Report) -> AppResult<()> {
    validate_report(report)?;
    match report.image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(()),
        _ => Err(AppError::validation("an image is required when submitting a report")),
    }
}

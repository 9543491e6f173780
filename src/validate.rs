//! Synchronous validation run at the mutation entry points, before any store
//! call. A side that fails to parse skips its check rather than failing it —
//! partially filled forms only trip the rules that actually apply.

use crate::error::ValidationError;
use crate::model::dates::parse_date;

/// Reject a blank required field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// The end date must not precede the start date.
pub fn check_range(start: &str, end: &str) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) {
        if end < start {
            return Err(ValidationError::EndBeforeStart);
        }
    }
    Ok(())
}

/// A completion date must not fall after the end date.
pub fn check_completed(completed: &str, end: &str) -> Result<(), ValidationError> {
    if let (Some(completed), Some(end)) = (parse_date(completed), parse_date(end)) {
        if completed > end {
            return Err(ValidationError::CompletedAfterEnd);
        }
    }
    Ok(())
}

/// A child's range must lie within its parent's range. Only enforced when the
/// parent carries both dates.
pub fn check_within_parent(
    child_start: &str,
    child_end: &str,
    parent_start: &str,
    parent_end: &str,
) -> Result<(), ValidationError> {
    let (Some(parent_start), Some(parent_end)) = (parse_date(parent_start), parse_date(parent_end))
    else {
        return Ok(());
    };
    if let Some(start) = parse_date(child_start) {
        if start < parent_start {
            return Err(ValidationError::OutsideParentRange);
        }
    }
    if let Some(end) = parse_date(child_end) {
        if end > parent_end {
            return Err(ValidationError::OutsideParentRange);
        }
    }
    Ok(())
}

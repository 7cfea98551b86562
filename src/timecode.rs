//! `MM:SS` / `HH:MM:SS` time codes.
//!
//! Parsing is permissive: anything that is not two or three integer fields
//! separated by `:` parses to zero rather than failing.

/// Parse a time code into whole seconds.
///
/// Two fields are `minutes:seconds`, three are `hours:minutes:seconds`.
/// Negative fields are accepted as-is, so callers must range-check the
/// result themselves.
pub fn parse(text: &str) -> i64 {
    let fields: Option<Vec<i64>> = text
        .split(':')
        .map(|field| field.trim().parse::<i64>().ok())
        .collect();

    let total = match fields.as_deref() {
        Some([minutes, seconds]) => total_seconds(0, *minutes, *seconds),
        Some([hours, minutes, seconds]) => total_seconds(*hours, *minutes, *seconds),
        _ => None,
    };
    total.unwrap_or(0)
}

fn total_seconds(hours: i64, minutes: i64, seconds: i64) -> Option<i64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// Format whole seconds as `MM:SS`, or `HH:MM:SS` from one hour upwards.
pub fn format(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Canonical form of a well-formed, non-negative time code.
///
/// Returns `None` for text that [`parse`] would only accept through its
/// zero fallback, and for negative fields.
pub fn canonicalize(text: &str) -> Option<String> {
    let fields = text
        .split(':')
        .map(|field| field.trim().parse::<u32>().ok())
        .collect::<Option<Vec<u32>>>()?;

    let total = match fields.as_slice() {
        [minutes, seconds] => total_seconds(0, (*minutes).into(), (*seconds).into())?,
        [hours, minutes, seconds] => total_seconds((*hours).into(), (*minutes).into(), (*seconds).into())?,
        _ => return None,
    };

    Some(format(total as u64))
}

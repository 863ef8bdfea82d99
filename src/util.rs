use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::DEFAULT_LANGUAGE;

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

// Language codes are interpolated into SPARQL filters, so anything that
// fails validation falls back to the default instead of passing through.
pub(crate) fn normalize_language(input: Option<&str>) -> String {
    let value = match input {
        Some(value) => value.trim().to_lowercase(),
        None => return DEFAULT_LANGUAGE.to_string(),
    };
    if value.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }

    let mut segments = value.split('-');
    let primary = segments.next().unwrap_or_default();
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_lowercase()) {
        return DEFAULT_LANGUAGE.to_string();
    }
    for segment in segments {
        if !(2..=8).contains(&segment.len())
            || !segment.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return DEFAULT_LANGUAGE.to_string();
        }
    }
    value
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Parse `--timeout` values like "90", "30s", "5m", "1h" or "500ms".
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("expected a number with an optional unit, got {s:?}"));
    }
    let n: u64 = digits.parse().map_err(|_| format!("duration out of range: {s:?}"))?;

    let duration = match unit.trim() {
        "ms" => Duration::from_millis(n),
        "" | "s" | "sec" | "secs" => Duration::from_secs(n),
        "m" | "min" | "mins" => Duration::from_secs(n * 60),
        "h" | "hr" | "hrs" => Duration::from_secs(n * 3600),
        other => return Err(format!("unknown duration unit {other:?} (use ms, s, m or h)")),
    };
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;

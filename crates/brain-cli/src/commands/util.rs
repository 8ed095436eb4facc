//! Formatting shared by the command outputs.

use chrono::{DateTime, Local};

/// Formats a currency amount with an explicit sign, e.g. `+$20.00`.
pub fn format_money(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let sign = if amount < 0.0 { '-' } else { '+' };
    format!("{sign}${:.2}", amount.abs())
}

/// Formats minutes with one decimal, e.g. `12.5m`.
/// Non-finite values render as `0.0m`.
pub fn format_minutes(minutes: f64) -> String {
    let minutes = if minutes.is_finite() { minutes } else { 0.0 };
    format!("{minutes:.1}m")
}

/// Formats epoch milliseconds in local time with a `chrono` pattern.
pub fn format_local(ms: i64, pattern: &str) -> Option<String> {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format(pattern).to_string())
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "filled is rounded and bounded to 0..=10"
)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !max.is_finite() || !value.is_finite() {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = (value / max).max(0.0);
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Writes a section heading underlined to its width.
pub fn heading(output: &mut String, title: &str) {
    use std::fmt::Write;

    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();
}

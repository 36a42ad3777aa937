//! Time estimate parsing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static ESTIMATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*(w|d|h|m|s)$").expect("invalid estimate regex")
});

/// Parse an estimate such as `2h`, `1.5d` or `30m` into seconds.
///
/// A week is seven days. Fractions of a second are dropped.
pub fn parse_time_estimate(estimate: &str) -> Option<u64> {
    let normalized = estimate.trim().to_lowercase();
    let Some(caps) = ESTIMATE.captures(&normalized) else {
        warn!("Invalid time format '{estimate}'. Use a format like '2h', '1d', '30m' or '1w'");
        return None;
    };

    let value: f64 = caps[1].parse().ok()?;
    let factor: u64 = match &caps[2] {
        "w" => 7 * 24 * 60 * 60,
        "d" => 24 * 60 * 60,
        "h" => 60 * 60,
        "m" => 60,
        _ => 1,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let seconds = (value * factor as f64) as u64;
    Some(seconds)
}

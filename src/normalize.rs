//! Value conversions.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static GRACE_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<n>\d+)\s*(?P<unit>day|hour|minute|second)s?$")
        .expect("valid grace period regex")
});

/// Multiplies a raw value by a unit multiplier, saturating on overflow.
#[must_use]
pub const fn scale(value: u64, multiplier: u64) -> u64 {
    value.saturating_mul(multiplier)
}

/// Converts a quota grace state to a number.
///
/// | state          | value           |
/// |----------------|-----------------|
/// | `none`         | `0`             |
/// | `expired`      | `1`             |
/// | `N day(s)`     | `86400 * N + 1` |
/// | `N hour(s)`    | `3600 * N + 1`  |
/// | `N minute(s)`  | `60 * N + 1`    |
/// | `N second(s)`  | `N + 1`         |
///
/// Anything else is logged and treated like `expired`.
#[must_use]
pub fn grace(state: &str) -> u64 {
    let state = state.trim();

    match state {
        "none" => return 0,
        "expired" => return 1,
        _ => {}
    }

    let seconds = GRACE_PERIOD.captures(state).and_then(|caps| {
        let n = caps["n"].parse::<u64>().ok()?;

        let unit = match &caps["unit"] {
            "day" => 86_400,
            "hour" => 3_600,
            "minute" => 60,
            _ => 1,
        };

        n.checked_mul(unit)?.checked_add(1)
    });

    seconds.unwrap_or_else(|| {
        warn!(state, "unrecognized grace state, treating as expired");
        1
    })
}

//! MML numerals: plain decimal (`12`) or `$`-prefixed hexadecimal (`$0C`).

use std::sync::LazyLock;

use regex::Regex;

/// Whole-token numeral. Decimal wins for a leading digit; hex needs the `$`.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?:(\d+)|\$([0-9A-Fa-f]+))$").expect("valid regex"));

/// Render a value the way MML source writes it: `$1F` or `31`.
pub fn format(value: u32, as_hex: bool) -> String {
    if as_hex {
        return format!("${value:X}");
    }
    return value.to_string();
}

/// Parse a decimal or `$hex` numeral. Returns `None` for anything else,
/// including values that overflow `u32`.
pub fn parse(text: &str) -> Option<u32> {
    let captures = NUMERAL.captures(text.trim())?;
    if let Some(decimal) = captures.get(1) {
        return decimal.as_str().parse().ok();
    }
    let hex = captures.get(2)?;
    return u32::from_str_radix(hex.as_str(), 16).ok();
}

use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

pub const NOT_AVAILABLE: &str = "N/A";

/// Formats `value` with a fixed number of decimals, or "N/A".
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{value:.decimals$}"),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

pub fn or_not_available<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |value| value.to_string())
}

/// Parses strings such as `"42.5%"` into a `0..=1` fraction.
pub fn parse_percentage(value: &str) -> Option<f32> {
    let number = value.trim().trim_end_matches('%').trim();
    let parsed = number.parse::<f32>().ok()?;
    parsed
        .is_finite()
        .then(|| (parsed / 100.0).clamp(0.0, 1.0))
}

/// Deterministic pseudo-random point in `-1..=1` on both axes.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

use crate::error::{AppError, AppResult};
use serde::Serialize;

/// A named "last N seconds" window offered as a one-click time filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePreset {
    pub key: &'static str,
    pub label: &'static str,
    pub seconds: u64,
}

pub const TIME_RANGE_PRESETS: [TimePreset; 5] = [
    TimePreset { key: "15m", label: "Last 15 minutes", seconds: 900 },
    TimePreset { key: "1h", label: "Last hour", seconds: 3_600 },
    TimePreset { key: "6h", label: "Last 6 hours", seconds: 21_600 },
    TimePreset { key: "24h", label: "Last day", seconds: 86_400 },
    TimePreset { key: "7d", label: "Last 7 days", seconds: 604_800 },
];

pub fn find_preset(key: &str) -> AppResult<&'static TimePreset> {
    TIME_RANGE_PRESETS
        .iter()
        .find(|p| p.key == key)
        .ok_or_else(|| AppError::UnknownPreset(key.to_string()))
}

/// Reverse lookup used to show which preset a stored window came from.
pub fn preset_for_seconds(seconds: u64) -> Option<&'static TimePreset> {
    TIME_RANGE_PRESETS.iter().find(|p| p.seconds == seconds)
}

//! Display-ready statistics derived from fetched data.
//!
//! Everything here is pure: no I/O, and the current time is always passed in.

use super::LanguageBreakdown;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use palette::Srgb;
use std::collections::{BTreeMap, HashMap};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;
const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Palette used for label colors.
pub const PALETTE: [Srgb<u8>; 10] = [
    Srgb::new(0x31, 0x78, 0xc6), // blue
    Srgb::new(0xde, 0xa5, 0x84), // peach
    Srgb::new(0x56, 0x3d, 0x7c), // purple
    Srgb::new(0xf1, 0xe0, 0x5a), // yellow
    Srgb::new(0x35, 0x72, 0xa5), // steel
    Srgb::new(0xe3, 0x4c, 0x26), // orange
    Srgb::new(0x89, 0xe0, 0x51), // green
    Srgb::new(0x70, 0x15, 0x16), // maroon
    Srgb::new(0x00, 0xad, 0xd8), // cyan
    Srgb::new(0xb0, 0x72, 0x19), // bronze
];

/// Share of total bytes per language, in percent.
///
/// Languages with zero bytes are left out. When the total is zero the result is empty.
#[expect(clippy::cast_precision_loss, reason = "byte counts comfortably fit an f64 mantissa for display")]
#[must_use]
pub fn percentages(breakdown: &LanguageBreakdown) -> BTreeMap<String, f64> {
    let total = breakdown.total_bytes();
    if total == 0 {
        return BTreeMap::new();
    }

    breakdown
        .iter()
        .filter(|&(_, bytes)| bytes > 0)
        .map(|(name, bytes)| (name.to_string(), bytes as f64 * 100.0 / total as f64))
        .collect()
}

/// Granularity of a [`RelativeAge`], smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl AgeUnit {
    const fn name(self, count: u64) -> &'static str {
        let singular = count == 1;
        match self {
            Self::Seconds if singular => "second",
            Self::Seconds => "seconds",
            Self::Minutes if singular => "minute",
            Self::Minutes => "minutes",
            Self::Hours if singular => "hour",
            Self::Hours => "hours",
            Self::Days if singular => "day",
            Self::Days => "days",
            Self::Months if singular => "month",
            Self::Months => "months",
            Self::Years if singular => "year",
            Self::Years => "years",
        }
    }
}

/// A coarse human-relative age such as "3 days ago".
///
/// Ordering compares the unit first, then the count, so an older timestamp never orders
/// below a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativeAge {
    pub unit: AgeUnit,
    pub count: u64,
}

impl RelativeAge {
    /// Age of `timestamp` as seen from `now`. Timestamps after `now` count as zero seconds old.
    #[must_use]
    pub fn between(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = u64::try_from((now - timestamp).num_seconds()).unwrap_or(0);

        let (unit, divisor) = if seconds >= SECONDS_PER_YEAR {
            (AgeUnit::Years, SECONDS_PER_YEAR)
        } else if seconds >= SECONDS_PER_MONTH {
            (AgeUnit::Months, SECONDS_PER_MONTH)
        } else if seconds >= SECONDS_PER_DAY {
            (AgeUnit::Days, SECONDS_PER_DAY)
        } else if seconds >= SECONDS_PER_HOUR {
            (AgeUnit::Hours, SECONDS_PER_HOUR)
        } else if seconds >= SECONDS_PER_MINUTE {
            (AgeUnit::Minutes, SECONDS_PER_MINUTE)
        } else {
            (AgeUnit::Seconds, 1)
        };

        Self {
            unit,
            count: seconds / divisor,
        }
    }
}

impl Display for RelativeAge {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} ago", self.count, self.unit.name(self.count))
    }
}

/// Human-relative age of `timestamp` as seen from `now`, e.g. "3 days ago".
#[must_use]
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    RelativeAge::between(timestamp, now).to_string()
}

/// Assigns stable palette colors to labels.
///
/// Lookups are memoized for the lifetime of the computer. Entries are never evicted; the
/// cache grows with the number of distinct labels seen, which in practice is a few dozen
/// language names.
#[derive(Debug, Clone, Default)]
pub struct StatsComputer {
    colors: HashMap<String, Srgb<u8>>,
}

impl StatsComputer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `label`, picked by the sum of its UTF-16 code units modulo the palette size.
    pub fn color_for(&mut self, label: &str) -> Srgb<u8> {
        if let Some(color) = self.colors.get(label) {
            return *color;
        }

        let color = palette_color(label);
        let _ = self.colors.insert(label.to_string(), color);
        color
    }

    /// Number of labels memoized so far.
    #[must_use]
    pub fn cached_labels(&self) -> usize {
        self.colors.len()
    }
}

fn palette_color(label: &str) -> Srgb<u8> {
    let sum: u64 = label.encode_utf16().map(u64::from).sum();
    #[expect(clippy::cast_possible_truncation, reason = "the remainder is below the palette length")]
    let index = (sum % PALETTE.len() as u64) as usize;
    PALETTE[index]
}

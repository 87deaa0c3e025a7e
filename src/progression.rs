// ABOUTME: Pure progression rules: level from points, hunter classes and calendar day keys
// ABOUTME: Shared by the ledger service, account snapshots and plan lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Progression math
//!
//! Level is always a function of points: `floor(points / 100) + 1`. The
//! storage layer recomputes it in the same statement that changes points, and
//! [`level_for_points`] is the same formula for code that needs it in memory.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ledger::{POINTS_PER_CURRENCY_UNIT, POINTS_PER_LEVEL};

/// Level for a point balance
#[must_use]
pub const fn level_for_points(points: i64) -> i64 {
    let points = if points < 0 { 0 } else { points };
    points / POINTS_PER_LEVEL + 1
}

/// Currency value of a point balance, for display only
#[must_use]
pub fn currency_value(points: i64) -> f64 {
    points as f64 / POINTS_PER_CURRENCY_UNIT as f64
}

/// Narrative class derived from level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HunterClass {
    /// Levels 1-9
    Rookie,
    /// Levels 10-19
    Hunter,
    /// Levels 20-29
    Knight,
    /// Levels 30-39
    #[serde(rename = "Elite Knight")]
    EliteKnight,
    /// Levels 40-49
    Ranger,
    /// Levels 50-59
    Assassin,
    /// Levels 60-69
    Mage,
    /// Levels 70-79
    Archmage,
    /// Levels 80-89
    Monarch,
    /// Level 90 and beyond
    Ruler,
}

impl HunterClass {
    /// Human readable class name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Rookie => "Rookie",
            Self::Hunter => "Hunter",
            Self::Knight => "Knight",
            Self::EliteKnight => "Elite Knight",
            Self::Ranger => "Ranger",
            Self::Assassin => "Assassin",
            Self::Mage => "Mage",
            Self::Archmage => "Archmage",
            Self::Monarch => "Monarch",
            Self::Ruler => "Ruler",
        }
    }
}

impl Display for HunterClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.display_name())
    }
}

/// Classify a level into its hunter class
#[must_use]
pub const fn classify(level: i64) -> HunterClass {
    match level {
        i64::MIN..=9 => HunterClass::Rookie,
        10..=19 => HunterClass::Hunter,
        20..=29 => HunterClass::Knight,
        30..=39 => HunterClass::EliteKnight,
        40..=49 => HunterClass::Ranger,
        50..=59 => HunterClass::Assassin,
        60..=69 => HunterClass::Mage,
        70..=79 => HunterClass::Archmage,
        80..=89 => HunterClass::Monarch,
        _ => HunterClass::Ruler,
    }
}

/// Calendar day of an instant in the configured offset
#[must_use]
pub fn day_key(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// The calendar day before `day`
#[must_use]
pub fn previous_day(day: NaiveDate) -> NaiveDate {
    day.checked_sub_signed(Duration::days(1)).unwrap_or(day)
}

/// Whether `last` falls on the same calendar day as `now`
#[must_use]
pub fn is_same_day(last: Option<DateTime<Utc>>, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    last.is_some_and(|last| day_key(last, offset) == day_key(now, offset))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(10_050), 101);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(1), HunterClass::Rookie);
        assert_eq!(classify(9), HunterClass::Rookie);
        assert_eq!(classify(10), HunterClass::Hunter);
        assert_eq!(classify(35), HunterClass::EliteKnight);
        assert_eq!(classify(89), HunterClass::Monarch);
        assert_eq!(classify(90), HunterClass::Ruler);
        assert_eq!(classify(500), HunterClass::Ruler);
        assert_eq!(classify(35).to_string(), "Elite Knight");
    }

    #[test]
    fn test_same_day_respects_offset() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        let next_morning = Utc.with_ymd_and_hms(2025, 3, 2, 1, 0, 0).unwrap();

        assert!(!is_same_day(Some(late), next_morning, utc));
        // 04:30 and 06:30 on March 2nd in IST
        assert!(is_same_day(Some(late), next_morning, ist));
        assert!(!is_same_day(None, next_morning, utc));
    }

    #[test]
    fn test_currency_value() {
        assert!((currency_value(5000) - 50.0).abs() < f64::EPSILON);
        assert!((currency_value(150) - 1.5).abs() < f64::EPSILON);
    }
}

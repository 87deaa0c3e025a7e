// ABOUTME: Workout plan text parser turning "- " bullet lines into structured exercises
// ABOUTME: Extracts point tags, sets, reps and durations from free-form plan text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Workout plan parsing
//!
//! Plans are authored as free text. A line starting with `- ` is an exercise:
//!
//! ```text
//! - Push-ups [20pts] (3x15)
//! - Plank (3x 45s)
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::ledger::MAX_QUEST_POINTS;
use crate::constants::plans::{DEFAULT_EXERCISE_POINTS, DEFAULT_SETS};

static POINTS_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[(\d+)pts\]").ok());

static SETS_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)x").ok());

static REPS_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"x(\d+)").ok());

static DURATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+s").ok());

const BULLET: &str = "- ";
const UNKNOWN_EXERCISE: &str = "Unknown Exercise";

/// One exercise extracted from a workout plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExercise {
    /// Exercise name without the point tag
    pub name: String,
    /// Points the exercise is worth
    pub points: i64,
    /// Number of sets
    pub sets: u32,
    /// Repetitions per set, absent for timed exercises
    pub reps: Option<u32>,
    /// Duration token such as `45s`
    pub duration: Option<String>,
}

/// Parse every exercise line of a workout plan
#[must_use]
pub fn parse_workout_plan(text: &str) -> Vec<ParsedExercise> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| line.starts_with(BULLET))
        .map(parse_exercise_line)
        .collect()
}

/// Sum of the points of every parsed exercise
#[must_use]
pub fn total_points(exercises: &[ParsedExercise]) -> i64 {
    exercises
        .iter()
        .map(|exercise| exercise.points)
        .fold(0, i64::saturating_add)
}

fn parse_exercise_line(line: &str) -> ParsedExercise {
    let body = line.replace(BULLET, "");
    let raw_name = body.split('(').next().unwrap_or_default().trim();

    // Oversized tags, including ones that overflow i64, count as the award cap
    let points = POINTS_TAG
        .as_ref()
        .and_then(|re| re.captures(raw_name))
        .and_then(|caps| caps.get(1))
        .map_or(DEFAULT_EXERCISE_POINTS, |tag| {
            tag.as_str()
                .parse::<i64>()
                .map_or(MAX_QUEST_POINTS, |points| points.min(MAX_QUEST_POINTS))
        });
    let cleaned = POINTS_TAG
        .as_ref()
        .map_or_else(|| raw_name.to_owned(), |re| re.replacen(raw_name, 1, "").into_owned());
    let cleaned = cleaned.trim();

    ParsedExercise {
        name: if cleaned.is_empty() {
            UNKNOWN_EXERCISE.to_owned()
        } else {
            cleaned.to_owned()
        },
        points,
        sets: capture_number(&SETS_PATTERN, line).unwrap_or(DEFAULT_SETS),
        reps: capture_number(&REPS_PATTERN, line).filter(|reps| *reps > 0),
        duration: DURATION_PATTERN
            .as_ref()
            .and_then(|re| re.find(line))
            .map(|m| m.as_str().to_owned()),
    }
}

fn capture_number<T: std::str::FromStr>(pattern: &LazyLock<Option<Regex>>, haystack: &str) -> Option<T> {
    pattern
        .as_ref()?
        .captures(haystack)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_exercise() {
        let exercises = parse_workout_plan("- Push-ups [20pts] (3x15)");
        assert_eq!(
            exercises,
            vec![ParsedExercise {
                name: "Push-ups".into(),
                points: 20,
                sets: 3,
                reps: Some(15),
                duration: None,
            }]
        );
    }

    #[test]
    fn test_defaults_for_untagged_timed_exercise() {
        let exercises = parse_workout_plan("- Plank (hold 45s)");
        assert_eq!(exercises.len(), 1);
        let plank = &exercises[0];
        assert_eq!(plank.name, "Plank");
        assert_eq!(plank.points, 10);
        assert_eq!(plank.sets, 3);
        assert_eq!(plank.reps, None);
        assert_eq!(plank.duration.as_deref(), Some("45s"));
    }

    #[test]
    fn test_only_bullet_lines_are_exercises() {
        let plan = "Warm up first\n- Squats (4x10)\n  - indented note\n\n- Lunges [15pts] (2x0)\r\nCool down";
        let exercises = parse_workout_plan(plan);
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].sets, 4);
        assert_eq!(exercises[1].name, "Lunges");
        assert_eq!(exercises[1].reps, None);
        assert_eq!(total_points(&exercises), 25);
    }

    #[test]
    fn test_oversized_point_tags_are_capped() {
        let plan = "- A [9000000000000000000pts] (3x10)\n\
                    - B [9000000000000000000pts] (3x10)\n\
                    - C [99999999999999999999999pts] (3x10)";
        let exercises = parse_workout_plan(plan);
        assert!(exercises.iter().all(|e| e.points == MAX_QUEST_POINTS));
        assert_eq!(exercises[2].name, "C");
        assert_eq!(total_points(&exercises), 3 * MAX_QUEST_POINTS);
    }

    #[test]
    fn test_total_points_saturates() {
        let huge = ParsedExercise {
            name: "Huge".into(),
            points: i64::MAX,
            sets: 1,
            reps: None,
            duration: None,
        };
        assert_eq!(total_points(&[huge.clone(), huge]), i64::MAX);
    }

    #[test]
    fn test_empty_name_falls_back() {
        let exercises = parse_workout_plan("- (3x10)");
        assert_eq!(exercises[0].name, "Unknown Exercise");
    }
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The SM-2 (SuperMemo 2) scheduling engine.
//!
//! Everything here is a pure function of its arguments: the reference date
//! is passed in rather than read from the clock.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::types::card_state::CardState;
use crate::types::date::Date;

pub type EaseFactor = f64;
pub type Interval = u32;

/// The ease factor of a card that has never been reviewed.
pub const INITIAL_EASE_FACTOR: EaseFactor = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: EaseFactor = 1.3;

/// Reviews graded below this are lapses.
const PASSING_QUALITY: u8 = 3;

const MAX_QUALITY: u8 = 5;

/// How well the user recalled a card, from 0 (blackout) to 5 (perfect).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quality(u8);

impl Quality {
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether a review of this quality resets the learning sequence.
    pub fn is_lapse(self) -> bool {
        self.0 < PASSING_QUALITY
    }
}

impl TryFrom<i64> for Quality {
    type Error = ScheduleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=MAX_QUALITY as i64).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ScheduleError::InvalidQuality(value))
        }
    }
}

impl From<Quality> for i64 {
    fn from(q: Quality) -> i64 {
        q.0 as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// The quality score was outside `[0, 5]`.
    InvalidQuality(i64),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::InvalidQuality(q) => write!(f, "quality must be 0-5, got {q}"),
        }
    }
}

impl Error for ScheduleError {}

/// The ease factor after a review, computed from the ease factor before it.
pub fn new_ease_factor(ef: EaseFactor, q: Quality) -> EaseFactor {
    let d: f64 = (MAX_QUALITY - q.value()) as f64;
    let ef = ef + (0.1 - d * (0.08 + d * 0.02));
    if ef < MIN_EASE_FACTOR {
        MIN_EASE_FACTOR
    } else {
        ef
    }
}

/// The interval after a successful review. `repetitions` is the already
/// incremented count; `interval` and `ef` are the values before the review.
pub fn success_interval(repetitions: u32, interval: Interval, ef: EaseFactor) -> Interval {
    match repetitions {
        0 | 1 => 1,
        2 => 6,
        // Truncation, not rounding.
        _ => (interval as f64 * ef).trunc() as Interval,
    }
}

/// Compute the scheduling state that results from reviewing a card.
///
/// `repetitions`, `ease_factor` and `interval` describe the card before the
/// review, `today` is the review date. Fails only when `quality` is not in
/// `[0, 5]`.
pub fn schedule(
    quality: i64,
    repetitions: u32,
    ease_factor: EaseFactor,
    interval: Interval,
    today: Date,
) -> Result<CardState, ScheduleError> {
    let q: Quality = Quality::try_from(quality)?;
    let (repetitions, interval): (u32, Interval) = if q.is_lapse() {
        (0, 1)
    } else {
        let repetitions = repetitions.saturating_add(1);
        (
            repetitions,
            success_interval(repetitions, interval, ease_factor),
        )
    };
    let ease_factor: EaseFactor = new_ease_factor(ease_factor, q);
    let due_date: Date = today.add_days(interval);
    Ok(CardState {
        interval,
        ease_factor,
        repetitions,
        due_date,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_quality_range() {
        for q in 0..=5i64 {
            assert_eq!(Quality::try_from(q).unwrap().value() as i64, q);
        }
        assert_eq!(
            Quality::try_from(-1i64),
            Err(ScheduleError::InvalidQuality(-1))
        );
        assert_eq!(Quality::try_from(6i64), Err(ScheduleError::InvalidQuality(6)));
    }

    #[test]
    fn test_quality_lapse_threshold() {
        assert!(Quality::try_from(0i64).unwrap().is_lapse());
        assert!(Quality::try_from(2i64).unwrap().is_lapse());
        assert!(!Quality::try_from(3i64).unwrap().is_lapse());
        assert!(!Quality::try_from(5i64).unwrap().is_lapse());
    }

    #[test]
    fn test_quality_serde() {
        let q: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert_eq!(serde_json::to_string(&q).unwrap(), "4");
        assert!(serde_json::from_str::<Quality>("7").is_err());
    }

    /// Scenario: a brand new card answered perfectly.
    #[test]
    fn test_first_perfect_review() {
        let result = schedule(5, 0, 2.5, 0, date(2024, 1, 1)).unwrap();
        assert_eq!(result.repetitions, 1);
        assert_eq!(result.interval, 1);
        assert_eq!(result.due_date.to_string(), "2024-01-02");
        assert!(approx_eq(result.ease_factor, 2.6));
    }

    /// Scenario: feeding the first result back in with another perfect review.
    #[test]
    fn test_second_perfect_review() {
        let first = schedule(5, 0, 2.5, 0, date(2024, 1, 1)).unwrap();
        let second = schedule(
            5,
            first.repetitions,
            first.ease_factor,
            first.interval,
            date(2024, 1, 2),
        )
        .unwrap();
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval, 6);
        assert_eq!(second.due_date.to_string(), "2024-01-08");
        assert!(approx_eq(second.ease_factor, 2.7));
    }

    /// Scenario: a mature card is forgotten.
    #[test]
    fn test_lapse_of_mature_card() {
        let result = schedule(1, 5, 2.0, 30, date(2024, 6, 1)).unwrap();
        assert_eq!(result.repetitions, 0);
        assert_eq!(result.interval, 1);
        assert_eq!(result.due_date.to_string(), "2024-06-02");
        assert!(approx_eq(result.ease_factor, 1.46));
    }

    #[test]
    fn test_lapse_resets_regardless_of_prior_state() {
        let today = date(2024, 3, 10);
        for q in 0..3 {
            for (reps, ef, interval) in [(0, 2.5, 0), (1, 1.3, 1), (7, 2.9, 120)] {
                let result = schedule(q, reps, ef, interval, today).unwrap();
                assert_eq!(result.repetitions, 0);
                assert_eq!(result.interval, 1);
            }
        }
    }

    #[test]
    fn test_success_staging() {
        let today = date(2024, 3, 10);
        for q in 3..=5 {
            let first = schedule(q, 0, 2.5, 0, today).unwrap();
            assert_eq!((first.repetitions, first.interval), (1, 1));
            let second = schedule(q, 1, 2.5, 1, today).unwrap();
            assert_eq!((second.repetitions, second.interval), (2, 6));
        }
    }

    #[test]
    fn test_mature_interval_uses_prior_values_and_truncates() {
        let today = date(2024, 3, 10);
        // 6 * 2.5 = 15
        let result = schedule(4, 2, 2.5, 6, today).unwrap();
        assert_eq!(result.repetitions, 3);
        assert_eq!(result.interval, 15);
        // 15 * 2.36 = 35.4, truncated; the ease drop from quality 3 must not
        // feed into the interval.
        let result = schedule(3, 3, 2.36, 15, today).unwrap();
        assert_eq!(result.interval, 35);
        assert!(approx_eq(result.ease_factor, 2.22));
        // 7 * 1.3 = 9.1
        let result = schedule(5, 10, 1.3, 7, today).unwrap();
        assert_eq!(result.interval, 9);
    }

    #[test]
    fn test_interval_property_over_grid() {
        let today = date(2024, 3, 10);
        for q in 3..=5 {
            for reps in 2..6 {
                for interval in [1, 6, 13, 40, 365] {
                    for ef in [1.3, 1.75, 2.5, 3.1] {
                        let result = schedule(q, reps, ef, interval, today).unwrap();
                        assert_eq!(result.interval, (interval as f64 * ef).floor() as u32);
                    }
                }
            }
        }
    }

    #[test]
    fn test_ease_factor_deltas() {
        let expected = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (q, delta) in expected.iter().enumerate() {
            let result = schedule(q as i64, 3, 2.5, 10, date(2024, 1, 1)).unwrap();
            assert!(approx_eq(result.ease_factor, 2.5 + delta));
        }
    }

    #[test]
    fn test_ease_factor_floor_under_repeated_failure() {
        let mut state = CardState::new(date(2024, 1, 1));
        for _ in 0..50 {
            state = schedule(
                0,
                state.repetitions,
                state.ease_factor,
                state.interval,
                state.due_date,
            )
            .unwrap();
            assert!(state.ease_factor >= MIN_EASE_FACTOR);
        }
        assert_eq!(state.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_ease_factor_never_below_floor() {
        for q in 0..=5i64 {
            for ef in [1.3, 1.31, 1.5, 2.0, 2.5] {
                let result = schedule(q, 2, ef, 6, date(2024, 1, 1)).unwrap();
                assert!(result.ease_factor >= MIN_EASE_FACTOR);
            }
        }
    }

    #[test]
    fn test_due_date_is_today_plus_interval() {
        let today = date(2024, 2, 27);
        let result = schedule(5, 2, 2.5, 6, today).unwrap();
        assert_eq!(result.interval, 15);
        assert_eq!(result.due_date, date(2024, 3, 13));
    }

    #[test]
    fn test_invalid_quality() {
        let today = date(2024, 1, 1);
        assert_eq!(
            schedule(6, 0, 2.5, 0, today),
            Err(ScheduleError::InvalidQuality(6))
        );
        assert_eq!(
            schedule(-3, 0, 2.5, 0, today),
            Err(ScheduleError::InvalidQuality(-3))
        );
    }

    #[test]
    fn test_deterministic() {
        let today = date(2024, 5, 5);
        let a = schedule(4, 3, 2.18, 17, today).unwrap();
        let b = schedule(4, 3, 2.18, 17, today).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ease_factor.to_bits(), b.ease_factor.to_bits());
    }
}

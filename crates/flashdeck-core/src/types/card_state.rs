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

use serde::Deserialize;
use serde::Serialize;

use crate::sm2::EaseFactor;
use crate::sm2::INITIAL_EASE_FACTOR;
use crate::sm2::Interval;
use crate::sm2::ScheduleError;
use crate::sm2::schedule;
use crate::types::date::Date;

/// The scheduling state of a card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    /// Days from the last review until the card is due.
    pub interval: Interval,
    /// How fast intervals grow. Never below 1.3.
    pub ease_factor: EaseFactor,
    /// Consecutive successful reviews since the last lapse.
    pub repetitions: u32,
    /// The card is shown again on or after this date.
    pub due_date: Date,
}

impl CardState {
    /// The state of a card created on `today`: due immediately.
    pub fn new(today: Date) -> Self {
        Self {
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            repetitions: 0,
            due_date: today,
        }
    }

    pub fn is_new(&self) -> bool {
        self.repetitions == 0 && self.interval == 0
    }

    pub fn is_due(&self, today: Date) -> bool {
        self.due_date <= today
    }

    /// The state after reviewing this card on `today` with the given quality.
    pub fn review(&self, quality: i64, today: Date) -> Result<CardState, ScheduleError> {
        schedule(
            quality,
            self.repetitions,
            self.ease_factor,
            self.interval,
            today,
        )
    }
}

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

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::Datelike;
use chrono::Days;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;

/// A calendar date, serialized as `YYYY-MM-DD`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(naive_date: NaiveDate) -> Self {
        Self(naive_date)
    }

    #[cfg(feature = "clock")]
    pub fn today() -> Self {
        Self(chrono::Local::now().naive_local().date())
    }

    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Days since the common era, with 0001-01-01 as day 1. Orders the same
    /// way as the dates themselves, at any year.
    pub fn day_number(self) -> i32 {
        self.0.num_days_from_ce()
    }

    pub fn from_day_number(days: i32) -> Option<Self> {
        NaiveDate::from_num_days_from_ce_opt(days).map(Self)
    }

    /// The date `days` days after this one. Saturates at the largest
    /// representable date.
    pub fn add_days(self, days: u32) -> Self {
        Self(
            self.0
                .checked_add_days(Days::new(days.into()))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    /// The date `days` days before this one.
    pub fn sub_days(self, days: u32) -> Self {
        Self(
            self.0
                .checked_sub_days(Days::new(days.into()))
                .unwrap_or(NaiveDate::MIN),
        )
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for Date {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|_| ErrorReport::new(format!("invalid date: {}", value)))?;
        Ok(Date(date))
    }
}

impl From<Date> for String {
    fn from(date: Date) -> String {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_serialize() -> Fallible<()> {
        let serialized = serde_json::to_string(&date(2024, 1, 2))?;
        assert_eq!(serialized, "\"2024-01-02\"");
        Ok(())
    }

    #[test]
    fn test_deserialize() -> Fallible<()> {
        let parsed: Date = serde_json::from_str("\"2024-01-02\"")?;
        assert_eq!(parsed, date(2024, 1, 2));
        Ok(())
    }

    #[test]
    fn test_invalid() {
        let result = Date::try_from("2024-13-01".to_string());
        assert_eq!(result, Err(ErrorReport::new("invalid date: 2024-13-01")));
    }

    #[test]
    fn test_day_arithmetic() {
        assert_eq!(date(2024, 12, 31).add_days(1), date(2025, 1, 1));
        assert_eq!(date(2024, 2, 28).add_days(1), date(2024, 2, 29));
        assert_eq!(date(2024, 3, 1).sub_days(7), date(2024, 2, 23));
        assert_eq!(date(2024, 3, 1).add_days(0), date(2024, 3, 1));
        assert_eq!(date(2024, 3, 1).add_days(u32::MAX).into_inner(), NaiveDate::MAX);
    }

    #[test]
    fn test_day_number() {
        assert_eq!(date(1, 1, 1).day_number(), 1);
        let d = date(2024, 2, 29);
        assert_eq!(Date::from_day_number(d.day_number()), Some(d));
        assert_eq!(d.add_days(10).day_number(), d.day_number() + 10);
        assert_eq!(Date::from_day_number(i32::MAX), None);
    }

    #[test]
    fn test_day_number_order_past_year_9999() {
        // Five-digit years render with a sign, so their strings sort first.
        let near = date(2024, 1, 1);
        let far = date(22588, 7, 17);
        assert!(far.to_string() < near.to_string());
        assert!(far.day_number() > near.day_number());
    }

    #[test]
    fn test_string_order_matches_date_order() {
        let a = date(2024, 9, 30);
        let b = date(2024, 10, 1);
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }
}

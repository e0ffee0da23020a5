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
use std::path::Path;

use clap::ValueEnum;
use flashdeck_core::Date;

use crate::db::Database;
use crate::error::Fallible;
use crate::types::Stats;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum StatsFormat {
    /// Human-readable summary.
    Text,
    /// The same object `GET /stats` returns.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(database: &Path, format: StatsFormat) -> Fallible<()> {
    let db = Database::open(database)?;
    let stats = db.stats(Date::today())?;
    println!("{}", render_stats(&stats, format)?);
    Ok(())
}

fn render_stats(stats: &Stats, format: StatsFormat) -> Fallible<String> {
    match format {
        StatsFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        StatsFormat::Text => {
            let lines = [
                format!("Decks:            {}", stats.total_decks),
                format!("Cards:            {}", stats.total_cards),
                format!("Due today:        {}", stats.due_today),
                format!("Reviews (7 days): {}", stats.reviews_last_week),
                format!("Average quality:  {:.2}", stats.avg_quality),
            ];
            Ok(lines.join("\n"))
        }
    }
}

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

use std::error::Error;
use std::path::Path;

use flashdeck_core::CardState;
use flashdeck_core::Date;
use flashdeck_core::ErrorReport;
use flashdeck_core::Quality;
use flashdeck_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Type;

use crate::error::Fallible;
use crate::types::Card;
use crate::types::CardId;
use crate::types::Deck;
use crate::types::DeckId;
use crate::types::SearchHit;
use crate::types::Stats;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS decks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL,
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        interval INTEGER NOT NULL DEFAULT 0,
        ease_factor REAL NOT NULL DEFAULT 2.5,
        repetitions INTEGER NOT NULL DEFAULT 0,
        due_date INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        quality INTEGER NOT NULL CHECK (quality BETWEEN 0 AND 5),
        timestamp TEXT NOT NULL,
        FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
    CREATE INDEX IF NOT EXISTS idx_cards_due_date ON cards(due_date);
    CREATE INDEX IF NOT EXISTS idx_reviews_card_id ON reviews(card_id);
";

const DECK_COLUMNS: &str = "id, name, description, created_at, updated_at";

const CARD_COLUMNS: &str = "id, deck_id, front, back, tags, interval, ease_factor, repetitions, due_date, created_at, updated_at";

/// The number of cards returned by a due-cards query when no limit is given.
pub const DEFAULT_DUE_LIMIT: usize = 20;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `path`, creating the file and schema if needed.
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened database at {}", path.display());
        Ok(Self { conn })
    }

    // Decks.

    pub fn create_deck(&self, name: &str, description: &str, now: Timestamp) -> Fallible<DeckId> {
        let now = now.to_string();
        self.conn.execute(
            "INSERT INTO decks (name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, description, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_decks(&self) -> Fallible<Vec<Deck>> {
        let sql = format!("SELECT {DECK_COLUMNS} FROM decks ORDER BY name, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let decks = stmt
            .query_map([], deck_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decks)
    }

    pub fn get_deck(&self, deck_id: DeckId) -> Fallible<Option<Deck>> {
        let sql = format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1");
        let deck = self
            .conn
            .query_row(&sql, params![deck_id], deck_from_row)
            .optional()?;
        Ok(deck)
    }

    /// Update the given fields of a deck. Returns false if the deck does not
    /// exist.
    pub fn update_deck(
        &self,
        deck_id: DeckId,
        name: Option<&str>,
        description: Option<&str>,
        now: Timestamp,
    ) -> Fallible<bool> {
        let changed = self.conn.execute(
            "UPDATE decks
             SET name = COALESCE(?1, name),
                 description = COALESCE(?2, description),
                 updated_at = ?3
             WHERE id = ?4",
            params![name, description, now.to_string(), deck_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a deck together with its cards and their reviews.
    pub fn delete_deck(&self, deck_id: DeckId) -> Fallible<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
        Ok(changed > 0)
    }

    // Cards.

    /// Add a card to a deck. The card is due on the day it is created.
    /// Returns `None` if the deck does not exist.
    pub fn create_card(
        &self,
        deck_id: DeckId,
        front: &str,
        back: &str,
        tags: &[String],
        now: Timestamp,
    ) -> Fallible<Option<CardId>> {
        if self.get_deck(deck_id)?.is_none() {
            return Ok(None);
        }
        let state = CardState::new(now.date());
        let tags = serde_json::to_string(tags)?;
        let now = now.to_string();
        self.conn.execute(
            "INSERT INTO cards (deck_id, front, back, tags, interval, ease_factor, repetitions, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                deck_id,
                front,
                back,
                tags,
                state.interval,
                state.ease_factor,
                state.repetitions,
                state.due_date.day_number(),
                now
            ],
        )?;
        Ok(Some(self.conn.last_insert_rowid()))
    }

    pub fn get_card(&self, card_id: CardId) -> Fallible<Option<Card>> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1");
        let card = self
            .conn
            .query_row(&sql, params![card_id], card_from_row)
            .optional()?;
        Ok(card)
    }

    pub fn cards_in_deck(&self, deck_id: DeckId) -> Fallible<Vec<Card>> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params![deck_id], card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Update the content of a card. Scheduling state is untouched. Returns
    /// false if the card does not exist.
    pub fn update_card(
        &self,
        card_id: CardId,
        front: Option<&str>,
        back: Option<&str>,
        tags: Option<&[String]>,
        now: Timestamp,
    ) -> Fallible<bool> {
        let tags: Option<String> = tags.map(serde_json::to_string).transpose()?;
        let changed = self.conn.execute(
            "UPDATE cards
             SET front = COALESCE(?1, front),
                 back = COALESCE(?2, back),
                 tags = COALESCE(?3, tags),
                 updated_at = ?4
             WHERE id = ?5",
            params![front, back, tags, now.to_string(), card_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a card together with its reviews.
    pub fn delete_card(&self, card_id: CardId) -> Fallible<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
        Ok(changed > 0)
    }

    // Scheduling state.

    pub fn card_state(&self, card_id: CardId) -> Fallible<Option<CardState>> {
        Ok(load_state(&self.conn, card_id)?)
    }

    pub fn save_card_state(
        &self,
        card_id: CardId,
        state: &CardState,
        now: Timestamp,
    ) -> Fallible<bool> {
        Ok(save_state(&self.conn, card_id, state, now)?)
    }

    /// Review a card: load its state, run the scheduler, and save the result,
    /// all in one transaction. Returns `None` if the card does not exist.
    ///
    /// This does not log the review; see [`Database::record_review`].
    pub fn review_card(
        &mut self,
        card_id: CardId,
        quality: Quality,
        now: Timestamp,
    ) -> Fallible<Option<CardState>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(state) = load_state(&tx, card_id)? else {
            return Ok(None);
        };
        let next: CardState = state.review(quality.into(), now.date())?;
        save_state(&tx, card_id, &next, now)?;
        tx.commit()?;
        Ok(Some(next))
    }

    /// Append an entry to the review log.
    pub fn record_review(&self, card_id: CardId, quality: Quality, now: Timestamp) -> Fallible<()> {
        self.conn.execute(
            "INSERT INTO reviews (card_id, quality, timestamp) VALUES (?1, ?2, ?3)",
            params![card_id, quality.value(), now.to_string()],
        )?;
        Ok(())
    }

    pub fn review_count(&self, card_id: CardId) -> Fallible<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM reviews WHERE card_id = ?1",
            params![card_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Queries.

    /// Cards in a deck that are due on or before `today`, earliest first.
    pub fn due_cards(&self, deck_id: DeckId, today: Date, limit: usize) -> Fallible<Vec<Card>> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE deck_id = ?1 AND due_date <= ?2
             ORDER BY due_date, id
             LIMIT ?3"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params![deck_id, today.day_number(), limit], card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Search cards by a substring of their front or back, and by tag. Empty
    /// filters match everything.
    pub fn search_cards(&self, query: &str, tag: &str) -> Fallible<Vec<SearchHit>> {
        let mut sql = String::from(
            "SELECT c.id, c.deck_id, d.name, c.front, c.back, c.tags
             FROM cards c
             JOIN decks d ON c.deck_id = d.id
             WHERE 1 = 1",
        );
        let mut args: Vec<String> = Vec::new();
        if !query.is_empty() {
            sql.push_str(" AND (c.front LIKE ?1 ESCAPE '\\' OR c.back LIKE ?1 ESCAPE '\\')");
            args.push(like_pattern(query));
        }
        if !tag.is_empty() {
            let n = args.len() + 1;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM json_each(c.tags) t WHERE t.value = ?{n})"
            ));
            args.push(tag.to_string());
        }
        sql.push_str(" ORDER BY c.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(SearchHit {
                    id: row.get(0)?,
                    deck_id: row.get(1)?,
                    deck_name: row.get(2)?,
                    front: row.get(3)?,
                    back: row.get(4)?,
                    tags: tags_from_row(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    /// Every tag used by any card, sorted and de-duplicated.
    pub fn all_tags(&self) -> Fallible<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT t.value FROM cards c, json_each(c.tags) t ORDER BY t.value",
        )?;
        let tags = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    pub fn stats(&self, today: Date) -> Fallible<Stats> {
        let count = |sql: &str, args: &[&dyn rusqlite::ToSql]| -> rusqlite::Result<i64> {
            self.conn.query_row(sql, args, |row| row.get(0))
        };
        let total_cards = count("SELECT COUNT(*) FROM cards", &[])?;
        let total_decks = count("SELECT COUNT(*) FROM decks", &[])?;
        let due_today = count(
            "SELECT COUNT(*) FROM cards WHERE due_date <= ?1",
            &[&today.day_number()],
        )?;
        let reviews_last_week = count(
            "SELECT COUNT(*) FROM reviews WHERE timestamp >= ?1",
            &[&today.sub_days(7).to_string()],
        )?;
        let avg_quality: Option<f64> =
            self.conn
                .query_row("SELECT AVG(quality) FROM reviews", [], |row| row.get(0))?;
        let avg_quality = avg_quality.map(|q| (q * 100.0).round() / 100.0).unwrap_or(0.0);
        Ok(Stats {
            total_cards,
            total_decks,
            due_today,
            reviews_last_week,
            avg_quality,
        })
    }
}

fn load_state(conn: &Connection, card_id: CardId) -> rusqlite::Result<Option<CardState>> {
    conn.query_row(
        "SELECT interval, ease_factor, repetitions, due_date FROM cards WHERE id = ?1",
        params![card_id],
        |row| {
            Ok(CardState {
                interval: row.get(0)?,
                ease_factor: row.get(1)?,
                repetitions: row.get(2)?,
                due_date: date_from_row(row, 3)?,
            })
        },
    )
    .optional()
}

fn save_state(
    conn: &Connection,
    card_id: CardId,
    state: &CardState,
    now: Timestamp,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE cards
         SET interval = ?1, ease_factor = ?2, repetitions = ?3, due_date = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            state.interval,
            state.ease_factor,
            state.repetitions,
            state.due_date.day_number(),
            now.to_string(),
            card_id
        ],
    )?;
    Ok(changed > 0)
}

fn deck_from_row(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp_from_row(row, 3)?,
        updated_at: timestamp_from_row(row, 4)?,
    })
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        tags: tags_from_row(row, 4)?,
        state: CardState {
            interval: row.get(5)?,
            ease_factor: row.get(6)?,
            repetitions: row.get(7)?,
            due_date: date_from_row(row, 8)?,
        },
        created_at: timestamp_from_row(row, 9)?,
        updated_at: timestamp_from_row(row, 10)?,
    })
}

fn tags_from_row(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(idx, Type::Text, e))
}

/// Due dates are stored as day numbers: text would misorder years past 9999.
fn date_from_row(row: &Row, idx: usize) -> rusqlite::Result<Date> {
    let days: i32 = row.get(idx)?;
    Date::from_day_number(days).ok_or_else(|| {
        let e = ErrorReport::new(format!("day number out of range: {days}"));
        conversion_error(idx, Type::Integer, e)
    })
}

fn timestamp_from_row(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    let text: String = row.get(idx)?;
    Timestamp::try_from(text).map_err(|e| conversion_error(idx, Type::Text, e))
}

fn conversion_error(
    idx: usize,
    ty: Type,
    e: impl Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

/// A `LIKE` pattern matching `s` anywhere, with wildcards in `s` escaped.
fn like_pattern(s: &str) -> String {
    let mut pattern = String::from("%");
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

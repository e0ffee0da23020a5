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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use flashdeck_core::Timestamp;

use crate::cmd::serve::error::ApiError;
use crate::db::Database;

/// Where handlers get the current time from.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    System,
    /// Always returns the same instant. Used by tests.
    Fixed(Timestamp),
}

impl Clock {
    pub fn now(self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            Clock::Fixed(ts) => ts,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub db: Arc<Mutex<Database>>,
    pub clock: Clock,
    /// Default page size of the due-cards query.
    pub due_limit: usize,
}

impl ServerState {
    pub fn new(db: Database, clock: Clock, due_limit: usize) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            clock,
            due_limit,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db.lock().map_err(|_| {
            log::error!("Database mutex poisoned");
            ApiError::persistence("internal server error")
        })
    }
}

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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::db::DEFAULT_DUE_LIMIT;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

const DEFAULT_DATABASE: &str = "flashcards.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// The contents of a TOML config file. Every key is optional.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub due_limit: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Fallible<Self> {
        let text = read_to_string(path).map_err(|e| {
            ErrorReport::new(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line or through the environment. These take
/// precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub due_limit: Option<usize>,
}

/// Fully resolved settings.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    pub due_limit: usize,
}

impl Settings {
    pub fn resolve(config_path: Option<&Path>, overrides: Overrides) -> Fallible<Self> {
        let file = match config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let settings = Self::merge(file, overrides);
        if settings.due_limit == 0 {
            return fail("due_limit must be at least 1");
        }
        Ok(settings)
    }

    fn merge(file: ConfigFile, overrides: Overrides) -> Self {
        Settings {
            database: overrides
                .database
                .or(file.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            host: overrides
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            due_limit: overrides
                .due_limit
                .or(file.due_limit)
                .unwrap_or(DEFAULT_DUE_LIMIT),
        }
    }
}

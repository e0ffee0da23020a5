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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;

use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::cmd::serve::state::Clock;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::config::Overrides;
use crate::config::Settings;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the study API over HTTP.
    Serve {
        #[command(flatten)]
        store: StoreArgs,
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long, env = "FLASHDECK_HOST")]
        host: Option<String>,
        /// The port to use for the web server. Default is 8000.
        #[arg(long, env = "FLASHDECK_PORT")]
        port: Option<u16>,
        /// Default number of cards a study request returns. Default is 20.
        #[arg(long)]
        due_limit: Option<usize>,
    },
    /// Print collection statistics.
    Stats {
        #[command(flatten)]
        store: StoreArgs,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to the SQLite database. Created if missing. Default is flashcards.db.
    #[arg(long, env = "FLASHDECK_DATABASE")]
    database: Option<PathBuf>,
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            store,
            host,
            port,
            due_limit,
        } => {
            let overrides = Overrides {
                database: store.database,
                host,
                port,
                due_limit,
            };
            let settings = Settings::resolve(store.config.as_deref(), overrides)?;
            let config = ServerConfig {
                database: settings.database,
                host: settings.host,
                port: settings.port,
                due_limit: settings.due_limit,
                clock: Clock::System,
            };
            start_server(config).await
        }
        Command::Stats { store, format } => {
            let overrides = Overrides {
                database: store.database,
                ..Overrides::default()
            };
            let settings = Settings::resolve(store.config.as_deref(), overrides)?;
            print_stats(&settings.database, format)
        }
    }
}

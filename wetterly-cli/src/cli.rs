use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text, validator::Validation};
use wetterly_core::{
    Capacity, Config, HistoryError, HistoryStore, client::client_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wetterly", version, about = "Current weather for any city")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and history size.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name. When omitted, pick one of the recent searches.
        city: Option<String>,
    },

    /// List recent searches, most recent first.
    History {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Show { city } => show(&config, city).await?,
            Command::History { clear } => {
                let history = config.open_history()?;
                if clear {
                    history.clear();
                    println!("Search history cleared.");
                } else {
                    print!("{}", render::history(&history.entries()));
                }
            }
        }

        Ok(())
    }
}

async fn show(config: &Config, city: Option<String>) -> anyhow::Result<()> {
    let client = client_from_config(config)?;
    let history = config.open_history()?;

    let place = match city {
        Some(city) => {
            match history.record(&city) {
                Ok(_) => {}
                Err(HistoryError::BlankQuery) => bail!("City name must not be empty."),
                Err(e) => return Err(e.into()),
            }
            city.trim().to_string()
        }
        // Picking a recent search does not reorder the history.
        None => pick_recent(&history)?,
    };

    log::info!("Looking up weather for '{place}'");

    match client.fetch(&place).await {
        Ok(reading) => {
            print!("{}", render::card(&reading));
            Ok(())
        }
        Err(e) => {
            log::debug!("Lookup for '{place}' failed: {e:?}");
            bail!("{}", e.user_message())
        }
    }
}

fn pick_recent(history: &HistoryStore) -> anyhow::Result<String> {
    let entries = history.entries();
    if entries.is_empty() {
        bail!("No recent searches yet.\nHint: run `wetterly show <CITY>`.");
    }

    let choice = Select::new("Recent searches:", entries.entries().to_vec())
        .prompt()
        .context("No city selected")?;

    Ok(choice)
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let has_key = config.api_key.is_some();
    let prompt = if has_key {
        "OpenWeather API key (leave empty to keep the current one):"
    } else {
        "OpenWeather API key:"
    };

    let api_key = Password::new(prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    } else if !has_key {
        bail!("An API key is required.");
    }

    let current = config.history.max_entries.to_string();
    let answer = Text::new("How many recent searches should be kept? (number or \"unbounded\")")
        .with_default(&current)
        .with_validator(|input: &str| {
            Ok(match Capacity::try_from(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;

    config.history.max_entries = Capacity::try_from(answer.as_str())?;
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use forecast_core::{Config, Dashboard, LocationQuery, ViewState};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Saved weather forecasts dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Save a location (or refresh it if already saved).
    #[command(group(ArgGroup::new("location").required(true).args(["city", "zip", "lat"])))]
    Add {
        /// City name, e.g. "London".
        #[arg(long)]
        city: Option<String>,

        /// ZIP / postal code.
        #[arg(long)]
        zip: Option<String>,

        /// ISO country code qualifying --zip.
        #[arg(long, requires = "zip")]
        country: Option<String>,

        /// Latitude, used with --lon.
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, used with --lat.
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Remove a saved location by key, e.g. "city-london".
    Remove { key: String },

    /// List saved locations.
    List {
        /// Case-insensitive filter on name, country, description or temperature.
        #[arg(long, short)]
        search: Option<String>,

        /// 1-based page number.
        #[arg(long, short, default_value_t = 1)]
        page: usize,
    },

    /// Refresh every saved location now.
    Refresh,

    /// Keep refreshing on a timer until interrupted.
    Watch,
}

impl Command {
    fn location_query(
        city: Option<String>,
        zip: Option<String>,
        country: Option<String>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> LocationQuery {
        match (city, zip) {
            (Some(city), _) => LocationQuery::city(city),
            (None, Some(zip)) => LocationQuery::zip(zip, country),
            (None, None) => LocationQuery::coords(lat, lon),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        tracing::debug!(command = ?self.command, "running command");
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Add { city, zip, country, lat, lon } => {
                let dashboard = Dashboard::from_config(&config)?;
                let query = Command::location_query(city, zip, country, lat, lon);
                let result = dashboard.store().add(&query).await;

                render::print_notifications(&dashboard.notifications().drain());
                if let Ok(entry) = &result {
                    render::print_entries(std::slice::from_ref(entry));
                }
                Ok(exit_code(result.is_ok()))
            }
            Command::Remove { key } => {
                let dashboard = Dashboard::from_config(&config)?;
                dashboard.store().remove(key.trim());
                render::print_notifications(&dashboard.notifications().drain());
                Ok(ExitCode::SUCCESS)
            }
            Command::List { search, page } => {
                let dashboard = Dashboard::from_config(&config)?;
                let items = dashboard.store().items();

                let mut view = ViewState::with_page_size(config.page_size());
                view.set_term(search.unwrap_or_default());
                view.set_page(page);
                let page = view.render(&items);

                render::print_page(&page);
                Ok(ExitCode::SUCCESS)
            }
            Command::Refresh => {
                let dashboard = Dashboard::from_config(&config)?;
                let result = dashboard.store().refresh_all(true).await;

                render::print_notifications(&dashboard.notifications().drain());
                let ok = result.map(|r| r.is_success()).unwrap_or(false);
                Ok(exit_code(ok))
            }
            Command::Watch => watch(&config).await,
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<ExitCode> {
    let key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(key.trim().to_string());
    config.save()?;
    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(ExitCode::SUCCESS)
}

async fn watch(config: &Config) -> anyhow::Result<ExitCode> {
    let mut dashboard = Dashboard::from_config(config)?;
    dashboard.start().await;

    render::print_entries(&dashboard.store().items());
    println!(
        "Refreshing every {}s. Press Ctrl-C to stop.",
        config.refresh_interval().as_secs()
    );

    let mut poll = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                let notes = dashboard.notifications().drain();
                if !notes.is_empty() {
                    render::print_notifications(&notes);
                    render::print_entries(&dashboard.store().items());
                }
            }
        }
    }

    dashboard.shutdown().await;
    Ok(ExitCode::SUCCESS)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

//! # SPLASH Dashboard Entry Point
//!
//! Drives one dashboard session from the command line: load the baseline
//! forecast, optionally switch site, move sliders and submit an adjusted
//! forecast, then print the resulting charts as ASCII or JSON.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use clap::{builder::PossibleValuesParser, Parser};
use log::debug;
use splash_lib::{
    api::HttpSource,
    config::Config,
    renderer::{ascii_feature, ascii_legend, ascii_overtopping},
    session::{DashboardUpdate, Session, UiEvent, DEFAULT_SITE_LABEL, SITE_LABELS},
    SliderKind,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "splash-dashboard",
    version,
    about = "Wave overtopping forecasts for Dawlish and Penzance",
    allow_negative_numbers = true
)]
struct Cli {
    /// Site dropdown option, e.g. "Penzance" or "Dawlish Storm Bert - overtopping"
    #[arg(
        long,
        default_value = DEFAULT_SITE_LABEL,
        value_parser = PossibleValuesParser::new(SITE_LABELS)
    )]
    site: String,

    /// Submit the slider values as an adjusted forecast
    #[arg(long)]
    submit: bool,

    /// Significant wave height adjustment (%)
    #[arg(long)]
    sig_wave_height: Option<i32>,

    /// Freeboard adjustment (%)
    #[arg(long)]
    freeboard: Option<i32>,

    /// Mean wave period adjustment (%)
    #[arg(long)]
    mean_wave_period: Option<i32>,

    /// Mean wave direction adjustment (degrees)
    #[arg(long)]
    mean_wave_dir: Option<i32>,

    /// Wind speed adjustment (%)
    #[arg(long)]
    wind_speed: Option<i32>,

    /// Wind direction adjustment (degrees)
    #[arg(long)]
    wind_direction: Option<i32>,

    /// Print the dashboard update as JSON instead of ASCII charts
    #[arg(long)]
    json: bool,

    /// Settings file; defaults to the one selected by SPLASH_ENV
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn slider_values(&self) -> Vec<(SliderKind, i32)> {
        [
            (SliderKind::SignificantWaveHeight, self.sig_wave_height),
            (SliderKind::Freeboard, self.freeboard),
            (SliderKind::MeanWavePeriod, self.mean_wave_period),
            (SliderKind::MeanWaveDirection, self.mean_wave_dir),
            (SliderKind::WindSpeed, self.wind_speed),
            (SliderKind::WindDirection, self.wind_direction),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.map(|v| (kind, v)))
        .collect()
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_ascii(update: &DashboardUpdate) {
    println!("{}", update.site_label);
    if let Some(range) = update.forecast_range {
        println!(
            "Forecast {} to {}",
            range.start.format("%d %b %Y"),
            range.end.format("%d %b %Y")
        );
    }
    println!();
    for chart in &update.overtopping {
        println!("{}", ascii_overtopping(chart));
    }
    for chart in &update.features {
        println!("{}", ascii_feature(chart));
    }
    println!("{}", ascii_legend(&update.legend));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    init_logging(config.app.debug);

    let source = HttpSource::new(Duration::from_secs(config.app.request_timeout_secs))
        .context("failed to build HTTP client")?;
    let mut session = Session::new(config, source);

    let mut busy = session.subscribe_busy();
    tokio::spawn(async move {
        while busy.changed().await.is_ok() {
            if *busy.borrow_and_update() {
                debug!("Fetching forecast...");
            }
        }
    });

    let mut update = session
        .load()
        .await
        .context("failed to load the baseline forecast")?;

    if cli.site != DEFAULT_SITE_LABEL {
        if let Some(next) = session
            .dispatch(UiEvent::SiteSelected(cli.site.clone()))
            .await
            .with_context(|| format!("failed to load forecast for '{}'", cli.site))?
        {
            update = next;
        }
    }

    for (kind, value) in cli.slider_values() {
        session.dispatch(UiEvent::SliderDragged(kind, value)).await?;
    }

    if cli.submit {
        if let Some(next) = session
            .dispatch(UiEvent::SubmitClicked)
            .await
            .context("failed to submit the adjusted forecast")?
        {
            update = next;
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&update)?);
    } else {
        print_ascii(&update);
        for slider in session.sliders().iter() {
            if slider.value != slider.default {
                println!("{}: {}{}", slider.kind.label(), slider.value, slider.unit());
            }
        }
    }

    Ok(())
}

mod colors;
mod config;
mod error;
mod help;
mod loader;
mod record;
mod render;
mod scene;
mod settings;
mod snapshot;
mod terminal;
mod timefmt;
mod tooltip;
mod view;

use clap::{Parser, Subcommand};
use config::{EmptySnapshotPolicy, ExportConfig, MapConfig, SliderConfig};
use error::AppError;
use loader::{LoadOptions, LoadReport};
use record::RadiusScale;
use settings::Settings;
use snapshot::SnapshotIndex;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slicktrack")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "Terminal viewer for oil spill trajectory simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: <config dir>/slicktrack/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Field delimiter of the input table
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// IANA zone used for display times
    #[arg(long, global = true)]
    display_tz: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every observation of the trajectory on one map
    Map {
        /// Trajectory table (DateTime, Latitude, Longitude, Radius, Thickness, Mass)
        file: PathBuf,

        /// Print the map to stdout (no interactive display)
        #[arg(short, long)]
        print: bool,

        /// Print width in columns
        #[arg(long)]
        width: Option<u16>,

        /// Print height in rows
        #[arg(long)]
        height: Option<u16>,

        /// Key polling interval in seconds
        #[arg(short, long, default_value = "0.05")]
        time: f32,
    },

    /// Step through the trajectory in time with a slider
    Slider {
        /// Trajectory table (DateTime, Latitude, Longitude, Radius, Thickness, Mass)
        file: PathBuf,

        /// Hide the mean trajectory path
        #[arg(long)]
        no_overlay: bool,

        /// Keep showing the last snapshot when the slider lands on no data
        #[arg(short, long)]
        keep_previous: bool,

        /// Key polling interval in seconds
        #[arg(short, long, default_value = "0.05")]
        time: f32,
    },

    /// Write every slider frame to a JSON scene file
    Export {
        /// Trajectory table (DateTime, Latitude, Longitude, Radius, Thickness, Mass)
        file: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Leave the mean trajectory path out of the scene
        #[arg(long)]
        no_overlay: bool,

        /// Frames with no data repeat the last snapshot that had data
        #[arg(short, long)]
        keep_previous: bool,
    },

    /// List the observations recorded at one display time
    Snapshot {
        /// Trajectory table (DateTime, Latitude, Longitude, Radius, Thickness, Mass)
        file: PathBuf,

        /// Display time, e.g. "2018-11-30 00:00"
        label: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "slicktrack=debug" } else { "slicktrack=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the table and index it with the given marker scale
fn load_index(
    file: &Path,
    settings: &Settings,
    cli: &Cli,
    scale: f64,
) -> Result<(SnapshotIndex, LoadReport), AppError> {
    let time = settings.time_normalizer(cli.display_tz.as_deref());
    let options = LoadOptions {
        delimiter: settings.delimiter(cli.delimiter),
    };
    let loaded = loader::load_file(file, &options, &time)?;
    let index = SnapshotIndex::build(loaded.records, time, RadiusScale::new(scale));
    let span_hours = match (index.first_instant(), index.last_instant()) {
        (Some(first), Some(last)) => (last - first).num_minutes() as f64 / 60.0,
        _ => 0.0,
    };
    tracing::info!(
        records = index.len(),
        snapshots = index.keys().count(),
        span_hours,
        zone = time.display_zone().name(),
        "index built"
    );
    Ok((index, loaded.report))
}

fn slider_config(settings: &Settings, no_overlay: bool, keep_previous: bool, time_step: f32) -> SliderConfig {
    SliderConfig {
        scale: settings.view.slider_scale,
        padding: settings.view.padding,
        bucket_hours: settings.view.bucket_hours,
        show_overlay: settings.view.show_overlay && !no_overlay,
        empty_policy: if keep_previous {
            EmptySnapshotPolicy::KeepPrevious
        } else {
            settings.view.empty_policy
        },
        slider: settings.slider_spec(),
        time_step,
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let settings = Settings::load(cli.config.as_deref());

    match &cli.command {
        Commands::Map {
            file,
            print,
            width,
            height,
            time,
        } => {
            let config = MapConfig {
                scale: settings.view.map_scale,
                padding: settings.view.padding,
                print: *print,
                width: *width,
                height: *height,
                time_step: *time,
            };
            let (index, _) = load_index(file, &settings, cli, config.scale)?;
            render::map::run(&index, &config)?;
        }
        Commands::Slider {
            file,
            no_overlay,
            keep_previous,
            time,
        } => {
            let config = slider_config(&settings, *no_overlay, *keep_previous, *time);
            let (index, _) = load_index(file, &settings, cli, config.scale)?;
            render::slider::run(&index, &config)?;
        }
        Commands::Export {
            file,
            output,
            no_overlay,
            keep_previous,
        } => {
            let config = ExportConfig {
                view: slider_config(&settings, *no_overlay, *keep_previous, 0.0),
                output: output.clone(),
            };
            let (index, report) = load_index(file, &settings, cli, config.view.scale)?;
            if let Some(scene) = scene::build_scene(&index, &config.view, &report) {
                scene
                    .write_to_file(&config.output)
                    .map_err(|source| AppError::Export {
                        path: config.output.clone(),
                        source,
                    })?;
                tracing::info!(
                    path = %config.output.display(),
                    frames = scene.frames.len(),
                    "scene written"
                );
            }
        }
        Commands::Snapshot { file, label } => {
            let (index, _) = load_index(file, &settings, cli, settings.view.slider_scale)?;
            let found = index.lookup_label(label)?;
            println!("{} blobs at {}", found.len(), label.trim());
            for rec in found {
                println!("{}", tooltip::lines(rec, &tooltip::SLIDER_TOOLTIP).join("  "));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("slicktrack: {e}");
            ExitCode::FAILURE
        }
    }
}

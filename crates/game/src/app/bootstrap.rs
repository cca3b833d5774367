use std::fs;
use std::path::{Path, PathBuf};

use geocoin_engine::{
    resolve_app_paths, ConfirmationProvider, FileStore, GameConfig, GameStateController,
    KeyValueStore, LatLng, MemoryStore, ScriptedPositions, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::cli::CliOptions;
use super::commands::parse_script_commands;
use super::prompt::{stdio_prompt, FixedReply};
use super::sensor::{parse_sensor_samples, SensorFeed};

pub(crate) enum CommandInput {
    Interactive,
    Script(Vec<String>),
}

pub(crate) struct AppWiring {
    pub(crate) controller: GameStateController<Box<dyn KeyValueStore>>,
    pub(crate) confirmation: Box<dyn ConfirmationProvider>,
    pub(crate) input: CommandInput,
    pub(crate) sensor: Option<SensorFeed>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to read {what} file {path}: {source}")]
    ReadFile {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sensor file {path}: {reason}")]
    SensorFile {
        path: PathBuf,
        reason: String,
    },
}

pub(crate) fn build_app(options: CliOptions) -> Result<AppWiring, BootstrapError> {
    info!("=== GeoCoin Startup ===");
    let config = GameConfig::from_env().map_err(StartupError::from)?;
    info!(
        tile_width = config.tile_width,
        visible_radius = config.visible_radius,
        spawn_probability = config.spawn_probability,
        origin_lat = config.origin.lat,
        origin_lng = config.origin.lng,
        "config_resolved"
    );

    let persistence: Box<dyn KeyValueStore> = if options.in_memory {
        info!("persistence_in_memory");
        Box::new(MemoryStore::new())
    } else {
        let app_paths = resolve_app_paths()?;
        info!(save_dir = %app_paths.save_dir.display(), "persistence_on_disk");
        Box::new(FileStore::new(app_paths.save_dir))
    };

    let input = match &options.script {
        Some(path) => CommandInput::Script(load_script(path)?),
        None => CommandInput::Interactive,
    };

    let sensor = match &options.sensor {
        Some(path) => {
            let samples = load_sensor_samples(path)?;
            info!(sample_count = samples.len(), "position_sensor_started");
            Some(SensorFeed::spawn(
                ScriptedPositions::new(samples),
                options.sensor_interval,
            ))
        }
        None => None,
    };

    let confirmation: Box<dyn ConfirmationProvider> =
        match (options.assume_yes, &input) {
            (true, _) => Box::new(FixedReply(true)),
            (false, CommandInput::Script(_)) => Box::new(FixedReply(false)),
            (false, CommandInput::Interactive) => stdio_prompt(),
        };

    Ok(AppWiring {
        controller: GameStateController::new(config, persistence),
        confirmation,
        input,
        sensor,
    })
}

fn load_script(path: &Path) -> Result<Vec<String>, BootstrapError> {
    let content = read_input_file("script", path)?;
    Ok(parse_script_commands(&content))
}

fn load_sensor_samples(path: &Path) -> Result<Vec<LatLng>, BootstrapError> {
    let content = read_input_file("sensor", path)?;
    parse_sensor_samples(&content).map_err(|reason| BootstrapError::SensorFile {
        path: path.to_path_buf(),
        reason,
    })
}

fn read_input_file(what: &'static str, path: &Path) -> Result<String, BootstrapError> {
    fs::read_to_string(path).map_err(|source| BootstrapError::ReadFile {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn script_file_is_split_into_command_lines() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("walk.txt");
        fs::write(&path, "# warm up\nnorth\n\nlook\nquit\n").expect("write");

        let lines = load_script(&path).expect("script");
        assert_eq!(lines, vec!["north", "look", "quit"]);
    }

    #[test]
    fn sensor_file_errors_name_the_file() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("gps.txt");
        fs::write(&path, "36.9895,-122.0628\nsomewhere\n").expect("write");

        let err = load_sensor_samples(&path).expect_err("bad sample");
        assert!(matches!(err, BootstrapError::SensorFile { .. }));
        assert!(err.to_string().contains("gps.txt"));
    }

    #[test]
    fn missing_script_reports_read_failure() {
        let temp = TempDir::new().expect("temp");
        let err = load_script(&temp.path().join("absent.txt")).expect_err("missing");
        assert!(matches!(err, BootstrapError::ReadFile { what: "script", .. }));
    }
}

use std::path::PathBuf;
use std::time::Duration;

pub(crate) const DEFAULT_SENSOR_INTERVAL_MS: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliOptions {
    pub(crate) script: Option<PathBuf>,
    pub(crate) sensor: Option<PathBuf>,
    pub(crate) sensor_interval: Duration,
    pub(crate) in_memory: bool,
    pub(crate) assume_yes: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            script: None,
            sensor: None,
            sensor_interval: Duration::from_millis(DEFAULT_SENSOR_INTERVAL_MS),
            in_memory: false,
            assume_yes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliAction {
    Run(CliOptions),
    Help,
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliAction, String> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "--script" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --script".to_string())?;
                options.script = Some(PathBuf::from(value));
                index += 2;
            }
            "--sensor" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --sensor".to_string())?;
                options.sensor = Some(PathBuf::from(value));
                index += 2;
            }
            "--sensor-interval-ms" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --sensor-interval-ms".to_string())?;
                let millis = value.parse::<u64>().map_err(|_| {
                    format!("invalid --sensor-interval-ms value '{value}' (expected u64)")
                })?;
                options.sensor_interval = Duration::from_millis(millis);
                index += 2;
            }
            "--memory" => {
                options.in_memory = true;
                index += 1;
            }
            "--yes" => {
                options.assume_yes = true;
                index += 1;
            }
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
    }
    Ok(CliAction::Run(options))
}

pub(crate) fn usage_text() -> String {
    [
        "geocoin - walk the grid, collect coins from caches",
        "",
        "Usage:",
        "  geocoin [--script <file>] [--sensor <file>] [--sensor-interval-ms <u64>] [--memory] [--yes]",
        "",
        "Options:",
        "  --script <file>            read commands from a file instead of stdin",
        "  --sensor <file>            replay 'lat,lng' position samples from a file",
        "  --sensor-interval-ms <u64> delay between position samples (default 0)",
        "  --memory                   do not read or write the save file",
        "  --yes                      confirm reset without asking",
        "",
        "Environment:",
        "  GEOCOIN_ROOT               directory holding saves/ (default: current dir)",
        "  GEOCOIN_TILE_WIDTH, GEOCOIN_VISIBLE_RADIUS, GEOCOIN_SPAWN_PROBABILITY, GEOCOIN_ORIGIN",
        "  RUST_LOG                   log filter (default: info)",
    ]
    .join("\n")
}

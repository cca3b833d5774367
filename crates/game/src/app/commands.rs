use std::fmt;

use geocoin_engine::{Coin, Direction};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GameCommand {
    Step(Direction),
    Goto { lat: f64, lng: f64 },
    Look,
    Collect { i: i32, j: i32, coin: Coin },
    Deposit { i: i32, j: i32 },
    Inventory,
    Save,
    Reset,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: &'static str,
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.usage.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{} (usage: {})", self.reason, self.usage)
        }
    }
}

struct CommandSpec {
    name: &'static str,
    args: &'static str,
    help: &'static str,
}

const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        name: "north|south|east|west",
        args: "",
        help: "Move one tile",
    },
    CommandSpec {
        name: "goto",
        args: "<lat:f64> <lng:f64>",
        help: "Jump to a coordinate (position sample)",
    },
    CommandSpec {
        name: "look",
        args: "",
        help: "List caches around the player",
    },
    CommandSpec {
        name: "collect",
        args: "<i:i32> <j:i32> <serial:u32|i:j#serial>",
        help: "Take a coin from the cache at (i,j)",
    },
    CommandSpec {
        name: "deposit",
        args: "<i:i32> <j:i32>",
        help: "Put the most recent coin into the cache at (i,j)",
    },
    CommandSpec {
        name: "inventory",
        args: "",
        help: "List held coins",
    },
    CommandSpec {
        name: "save",
        args: "",
        help: "Persist the game now",
    },
    CommandSpec {
        name: "reset",
        args: "",
        help: "Return all coins and restart at the origin",
    },
    CommandSpec {
        name: "status",
        args: "",
        help: "Show location and coin totals",
    },
    CommandSpec {
        name: "help",
        args: "",
        help: "List commands",
    },
    CommandSpec {
        name: "quit",
        args: "",
        help: "Exit",
    },
];

pub(crate) fn help_lines() -> Vec<String> {
    COMMAND_SPECS
        .iter()
        .map(|spec| {
            if spec.args.is_empty() {
                format!("{} - {}", spec.name, spec.help)
            } else {
                format!("{} {} - {}", spec.name, spec.args, spec.help)
            }
        })
        .collect()
}

fn usage_for(name: &str) -> &'static str {
    COMMAND_SPECS
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.args)
        .unwrap_or("")
}

/// Parses one input line; `Ok(None)` for blank lines and `#` comments.
pub(crate) fn parse_command_line(line: &str) -> Result<Option<GameCommand>, CommandParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut tokens = trimmed.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_ascii_lowercase();
    let args = tokens.collect::<Vec<_>>();

    if let Ok(direction) = name.parse::<Direction>() {
        expect_arg_count(&name, &args, 0)?;
        return Ok(Some(GameCommand::Step(direction)));
    }

    let command = match name.as_str() {
        "goto" => {
            expect_arg_count(&name, &args, 2)?;
            GameCommand::Goto {
                lat: parse_arg(&name, "lat", args[0])?,
                lng: parse_arg(&name, "lng", args[1])?,
            }
        }
        "collect" => {
            expect_arg_count(&name, &args, 3)?;
            let i = parse_arg(&name, "i", args[0])?;
            let j = parse_arg(&name, "j", args[1])?;
            let coin = parse_coin(i, j, args[2]).ok_or_else(|| CommandParseError {
                reason: format!("invalid coin '{}'", args[2]),
                usage: usage_for("collect"),
            })?;
            GameCommand::Collect { i, j, coin }
        }
        "deposit" => {
            expect_arg_count(&name, &args, 2)?;
            GameCommand::Deposit {
                i: parse_arg(&name, "i", args[0])?,
                j: parse_arg(&name, "j", args[1])?,
            }
        }
        "look" => no_args(&name, &args, GameCommand::Look)?,
        "inventory" | "inv" => no_args(&name, &args, GameCommand::Inventory)?,
        "save" => no_args(&name, &args, GameCommand::Save)?,
        "reset" => no_args(&name, &args, GameCommand::Reset)?,
        "status" => no_args(&name, &args, GameCommand::Status)?,
        "help" => no_args(&name, &args, GameCommand::Help)?,
        "quit" | "exit" => no_args(&name, &args, GameCommand::Quit)?,
        other => {
            return Err(CommandParseError {
                reason: format!("unknown command '{other}' (try 'help')"),
                usage: "",
            })
        }
    };
    Ok(Some(command))
}

/// Non-comment, non-blank lines of a command script.
pub(crate) fn parse_script_commands(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Accepts a bare serial (coin minted at `(i, j)`) or the `i:j#serial` form.
fn parse_coin(i: i32, j: i32, raw: &str) -> Option<Coin> {
    if let Ok(serial) = raw.parse::<u32>() {
        return Some(Coin { i, j, serial });
    }
    let (origin, serial) = raw.split_once('#')?;
    let (coin_i, coin_j) = origin.split_once(':')?;
    Some(Coin {
        i: coin_i.parse().ok()?,
        j: coin_j.parse().ok()?,
        serial: serial.parse().ok()?,
    })
}

fn no_args(
    name: &str,
    args: &[&str],
    command: GameCommand,
) -> Result<GameCommand, CommandParseError> {
    expect_arg_count(name, args, 0)?;
    Ok(command)
}

fn expect_arg_count(name: &str, args: &[&str], expected: usize) -> Result<(), CommandParseError> {
    if args.len() == expected {
        return Ok(());
    }
    Err(CommandParseError {
        reason: format!("{name} takes {expected} argument(s), got {}", args.len()),
        usage: usage_for(name),
    })
}

fn parse_arg<T: std::str::FromStr>(
    name: &str,
    arg_name: &str,
    raw: &str,
) -> Result<T, CommandParseError> {
    raw.parse::<T>().map_err(|_| CommandParseError {
        reason: format!("invalid {arg_name} '{raw}'"),
        usage: usage_for(name),
    })
}

use std::io::{self, Write};
use std::process::ExitCode;

use geocoin_engine::KeyValueStore;
use tracing::{error, info};

use super::bootstrap::{AppWiring, CommandInput};
use super::sensor::SensorFeed;
use super::session::{Flow, Session};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        controller,
        confirmation,
        input,
        sensor,
    } = app;
    let mut session = Session::new(controller, confirmation, io::stdout());
    match drive(&mut session, input, sensor) {
        Ok(()) => {
            match session.controller().total_coins() {
                Ok(total_coins) => info!(total_coins, "session_finished"),
                Err(err) => error!(error = %err, "session_total_unavailable"),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn drive<S: KeyValueStore, W: Write>(
    session: &mut Session<S, W>,
    input: CommandInput,
    sensor: Option<SensorFeed>,
) -> io::Result<()> {
    session.start()?;
    let mut lines = command_lines(input);
    loop {
        if let Some(feed) = &sensor {
            for sample in feed.pending() {
                session.handle_position(sample)?;
            }
        }
        let Some(line) = lines.next_line()? else {
            break;
        };
        if session.handle_line(&line)? == Flow::Quit {
            return Ok(());
        }
    }

    if let Some(feed) = sensor {
        for sample in feed.drain() {
            session.handle_position(sample)?;
        }
    }
    Ok(())
}

enum CommandLines {
    Interactive,
    Script(std::vec::IntoIter<String>),
}

fn command_lines(input: CommandInput) -> CommandLines {
    match input {
        CommandInput::Interactive => CommandLines::Interactive,
        CommandInput::Script(lines) => CommandLines::Script(lines.into_iter()),
    }
}

impl CommandLines {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        match self {
            Self::Script(lines) => Ok(lines.next()),
            Self::Interactive => {
                let mut stdout = io::stdout();
                write!(stdout, "> ")?;
                stdout.flush()?;
                // Locked per call; the reset prompt reads from the same stdin.
                let mut line = String::new();
                if io::stdin().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
            }
        }
    }
}

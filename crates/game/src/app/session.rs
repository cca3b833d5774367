use std::io::{self, Write};

use geocoin_engine::{
    ConfirmationProvider, ControllerError, GameStateController, KeyValueStore, LatLng,
    LoadOutcome, VisibleCache,
};
use tracing::warn;

use super::commands::{help_lines, parse_command_line, GameCommand};
use super::render::{cache_lines, format_location, inventory_line, status_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Routes parsed commands and sensor samples into the controller and writes the
/// textual view to `out`.
pub(crate) struct Session<S, W> {
    controller: GameStateController<S>,
    confirmation: Box<dyn ConfirmationProvider>,
    out: W,
}

impl<S: KeyValueStore, W: Write> Session<S, W> {
    pub(crate) fn new(
        controller: GameStateController<S>,
        confirmation: Box<dyn ConfirmationProvider>,
        out: W,
    ) -> Self {
        Self {
            controller,
            confirmation,
            out,
        }
    }

    pub(crate) fn controller(&self) -> &GameStateController<S> {
        &self.controller
    }

    pub(crate) fn start(&mut self) -> io::Result<()> {
        let message = match self.controller.load() {
            LoadOutcome::Fresh => "new game".to_string(),
            LoadOutcome::Restored { cache_count } => {
                format!("resumed game ({cache_count} known caches)")
            }
            LoadOutcome::Discarded => "saved game unreadable; new game".to_string(),
        };
        writeln!(
            self.out,
            "{message} at {}",
            format_location(self.controller.player().location())
        )?;
        let visible = self.controller.refresh_visible();
        self.report_visible(visible)
    }

    pub(crate) fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match parse_command_line(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(Flow::Continue),
            Err(error) => {
                writeln!(self.out, "error: {error}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub(crate) fn handle_position(&mut self, location: LatLng) -> io::Result<()> {
        writeln!(self.out, "sensor: {}", format_location(location))?;
        let visible = self.controller.handle_position(location);
        self.report_visible(visible)
    }

    fn execute(&mut self, command: GameCommand) -> io::Result<Flow> {
        match command {
            GameCommand::Step(direction) => match self.controller.handle_step(direction) {
                Ok(visible) => {
                    writeln!(
                        self.out,
                        "moved {direction} to {}",
                        format_location(self.controller.player().location())
                    )?;
                    self.write_caches(&visible)?;
                }
                Err(error) => self.report_error(&error)?,
            },
            GameCommand::Goto { lat, lng } => {
                let location = LatLng { lat, lng };
                match self.controller.handle_position(location) {
                    Ok(visible) => {
                        writeln!(self.out, "moved to {}", format_location(location))?;
                        self.write_caches(&visible)?;
                    }
                    Err(error) => self.report_error(&error)?,
                }
            }
            GameCommand::Look => {
                let visible = self.controller.refresh_visible();
                self.report_visible(visible)?;
            }
            GameCommand::Collect { i, j, coin } => match self.controller.collect_coin(i, j, coin) {
                Ok(coin) => writeln!(self.out, "collected {coin} from {i},{j}")?,
                Err(error) => self.report_error(&error)?,
            },
            GameCommand::Deposit { i, j } => match self.controller.deposit_coin(i, j) {
                Ok(Some(coin)) => writeln!(self.out, "deposited {coin} into {i},{j}")?,
                Ok(None) => writeln!(self.out, "inventory is empty")?,
                Err(error) => self.report_error(&error)?,
            },
            GameCommand::Inventory => {
                let line = inventory_line(self.controller.player());
                writeln!(self.out, "{line}")?;
            }
            GameCommand::Save => match self.controller.save() {
                Ok(()) => writeln!(self.out, "saved")?,
                Err(error) => self.report_error(&error)?,
            },
            GameCommand::Reset => {
                let held = self.controller.player().inventory().len();
                match self
                    .controller
                    .reset_confirmed(self.confirmation.as_mut())
                {
                    Ok(true) => {
                        writeln!(
                            self.out,
                            "reset: {held} coin(s) returned, back at {}",
                            format_location(self.controller.player().location())
                        )?;
                    }
                    Ok(false) => writeln!(self.out, "reset cancelled")?,
                    Err(error) => self.report_error(&error)?,
                }
            }
            GameCommand::Status => match self.controller.total_coins() {
                Ok(total) => {
                    let line = status_line(
                        self.controller.player(),
                        total,
                        self.controller.state().store.len(),
                    );
                    writeln!(self.out, "{line}")?;
                }
                Err(error) => self.report_error(&error)?,
            },
            GameCommand::Help => {
                for line in help_lines() {
                    writeln!(self.out, "{line}")?;
                }
            }
            GameCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn report_visible(
        &mut self,
        visible: Result<Vec<VisibleCache>, ControllerError>,
    ) -> io::Result<()> {
        match visible {
            Ok(visible) => self.write_caches(&visible),
            Err(error) => self.report_error(&error),
        }
    }

    fn write_caches(&mut self, visible: &[VisibleCache]) -> io::Result<()> {
        for line in cache_lines(visible) {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn report_error(&mut self, error: &ControllerError) -> io::Result<()> {
        warn!(error = %error, "command_failed");
        writeln!(self.out, "error: {error}")
    }
}

use std::collections::VecDeque;

use crate::world::LatLng;

/// Gate for destructive actions such as a game reset.
pub trait ConfirmationProvider {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> ConfirmationProvider for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Stream of position samples; `None` ends the stream.
pub trait PositionSource {
    fn next_position(&mut self) -> Option<LatLng>;
}

#[derive(Debug, Default, Clone)]
pub struct ScriptedPositions {
    samples: VecDeque<LatLng>,
}

impl ScriptedPositions {
    pub fn new(samples: impl IntoIterator<Item = LatLng>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl PositionSource for ScriptedPositions {
    fn next_position(&mut self) -> Option<LatLng> {
        self.samples.pop_front()
    }
}

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use geocoin_engine::{LatLng, PositionSource};
use tracing::{debug, warn};

/// Background position feed. Samples are produced on their own thread and
/// handed to the main loop through a channel so handlers stay serialized.
pub(crate) struct SensorFeed {
    receiver: Receiver<LatLng>,
    worker: Option<JoinHandle<()>>,
}

impl SensorFeed {
    pub(crate) fn spawn<P>(mut source: P, interval: Duration) -> Self
    where
        P: PositionSource + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("position-sensor".to_string())
            .spawn(move || {
                while let Some(sample) = source.next_position() {
                    if sender.send(sample).is_err() {
                        break;
                    }
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                }
                debug!("position_sensor_finished");
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(error = %error, "position_sensor_spawn_failed");
                None
            }
        };
        Self { receiver, worker }
    }

    /// Samples that have already arrived, without blocking.
    pub(crate) fn pending(&self) -> Vec<LatLng> {
        self.receiver.try_iter().collect()
    }

    /// Blocks until the sensor thread finishes, returning every remaining sample.
    pub(crate) fn drain(mut self) -> Vec<LatLng> {
        let samples = self.receiver.iter().collect();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        samples
    }
}

pub(crate) fn parse_sensor_samples(content: &str) -> Result<Vec<LatLng>, String> {
    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_no = index + 1;
        let (lat, lng) = trimmed
            .split_once(',')
            .ok_or_else(|| format!("line {line_no}: expected 'lat,lng', got '{trimmed}'"))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("line {line_no}: invalid latitude '{}'", lat.trim()))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("line {line_no}: invalid longitude '{}'", lng.trim()))?;
        let sample = LatLng { lat, lng };
        if !sample.is_finite() {
            return Err(format!(
                "line {line_no}: coordinates must be finite, got '{trimmed}'"
            ));
        }
        samples.push(sample);
    }
    Ok(samples)
}

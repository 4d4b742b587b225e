use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bevy_utils::tracing::{debug, warn};

use crate::transport::ToSim;

/// Background timer for real-time mode: sends `Heartbeat` into the
/// simulation's inbound queue every interval. It touches no simulation state.
///
/// Stops when dropped or when the inbound queue is closed.
pub struct Metronome {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Metronome {
    pub fn start(tx: Sender<ToSim>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("metronome".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    if flag.load(Ordering::Relaxed) {
                        break;
                    }
                    if tx.send(ToSim::Heartbeat).is_err() {
                        debug!("inbound queue closed, metronome exiting");
                        break;
                    }
                }
            });
        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("failed to start metronome thread: {}", err);
                None
            }
        };
        Self { stop, handle }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("metronome thread panicked");
            }
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

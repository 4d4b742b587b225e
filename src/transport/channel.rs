//! In-process event transport between the simulation and presentation sides.
//!
//! Both directions are unbounded `std::sync::mpsc` channels. A failed send
//! means the other side hung up: it is logged and the event is dropped.
//!
//! The simulation side may feed its own inbox (heartbeats), but it only holds
//! a weak handle to the presentation side's sender. Once the presentation side
//! is gone its inbox disconnects, unless a running timer still holds a sender.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bevy_utils::tracing::warn;

use crate::transport::events::{ToSim, ToUi};

/// Sending half of one direction.
#[derive(Debug)]
pub struct Outbox<E> {
    tx: Arc<Sender<E>>,
    side: &'static str,
}

impl<E> Clone for Outbox<E> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            side: self.side,
        }
    }
}

impl<E: std::fmt::Debug> Outbox<E> {
    /// Returns false when the receiver is gone.
    pub fn send(&self, event: E) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!(side = self.side, event = ?err.0, "peer hung up, event dropped");
                false
            }
        }
    }
}

/// One side of the transport: sends `S`, receives `R`.
#[derive(Debug)]
pub struct Endpoint<S, R> {
    outbox: Outbox<S>,
    inbox: Receiver<R>,
    loopback: Weak<Sender<R>>,
}

pub type SimEndpoint = Endpoint<ToUi, ToSim>;
pub type UiEndpoint = Endpoint<ToSim, ToUi>;

/// Create the connected simulation and presentation endpoints.
#[must_use]
pub fn pair() -> (SimEndpoint, UiEndpoint) {
    let (to_sim_tx, to_sim_rx) = mpsc::channel();
    let (to_ui_tx, to_ui_rx) = mpsc::channel();
    let to_sim_tx = Arc::new(to_sim_tx);
    let sim = Endpoint {
        outbox: Outbox {
            tx: Arc::new(to_ui_tx),
            side: "sim",
        },
        inbox: to_sim_rx,
        loopback: Arc::downgrade(&to_sim_tx),
    };
    let ui = Endpoint {
        outbox: Outbox {
            tx: to_sim_tx,
            side: "ui",
        },
        inbox: to_ui_rx,
        loopback: Weak::new(),
    };
    (sim, ui)
}

impl<S: std::fmt::Debug, R> Endpoint<S, R> {
    pub fn send(&self, event: S) -> bool {
        self.outbox.send(event)
    }

    pub fn outbox(&self) -> Outbox<S> {
        self.outbox.clone()
    }

    /// Blocking receive. `None` once every sender is gone.
    pub fn recv(&self) -> Option<R> {
        self.inbox.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<R, RecvTimeoutError> {
        self.inbox.recv_timeout(timeout)
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<R> {
        self.inbox.try_recv().ok()
    }

    /// Everything queued right now.
    #[must_use]
    pub fn drain(&self) -> Vec<R> {
        let mut out = Vec::new();
        while let Some(event) = self.try_recv() {
            out.push(event);
        }
        out
    }

    /// A sender into this endpoint's own inbox, for timers that feed the
    /// inbound queue. `None` on the presentation side, and on the simulation
    /// side once the presentation side has dropped every outbox.
    ///
    /// The returned sender keeps the inbox open for as long as it lives.
    pub fn loopback(&self) -> Option<Sender<R>> {
        self.loopback.upgrade().map(|tx| Sender::clone(&tx))
    }

    pub fn into_parts(self) -> (Outbox<S>, Receiver<R>) {
        (self.outbox, self.inbox)
    }
}

//! Text input collaborator.
//!
//! Lines of user input arrive over a channel, either from a script given on
//! the command line or from a background thread reading stdin. Lines are
//! only consumed while [`InputState::active`] is set; the stage observers
//! switch it off while loading so queued input waits instead of being lost.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use log::{debug, warn};
use std::io::BufRead;

#[derive(Resource, Debug)]
pub struct InputState {
    /// Whether input is currently accepted.
    pub active: bool,
    rx_lines: Receiver<String>,
    closed: bool,
}

impl InputState {
    pub fn from_receiver(rx_lines: Receiver<String>) -> Self {
        Self {
            active: false,
            rx_lines,
            closed: false,
        }
    }

    /// Input made of a fixed list of commands.
    pub fn scripted(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let (tx, rx) = unbounded();
        for line in lines {
            let _ = tx.send(line.into());
        }
        Self::from_receiver(rx)
    }

    /// Parse a comma-separated script such as `play,play,end:20720`.
    pub fn from_script(script: &str) -> Self {
        Self::scripted(
            script
                .split(',')
                .map(str::trim)
                .filter(|command| !command.is_empty()),
        )
    }

    /// Read lines from stdin on a background thread.
    pub fn stdin() -> Self {
        let (tx, rx) = unbounded();
        let spawned = std::thread::Builder::new()
            .name("stdin-input".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("[input] stdin read failed: {}", e);
                            break;
                        }
                    }
                }
                debug!("[input] stdin closed");
            });
        if let Err(e) = spawned {
            warn!("[input] could not spawn stdin reader: {}", e);
        }
        Self::from_receiver(rx)
    }

    /// Next pending line, if any.
    pub fn next_line(&mut self) -> Option<String> {
        match self.rx_lines.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    /// The source is closed and every line has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.closed
    }
}

//! Timer-driven scheduler for monitoring and playback.
//!
//! Two independent periodic timers are the only sources of concurrent
//! access to shared run state: a short-interval monitor timer and a
//! longer playback tick timer. Each firing operates on snapshot copies
//! and publishes its result through a message-passing channel; nothing
//! else mutates shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::PlaybackState;
use crate::monitor::{ProgressMonitor, ProgressSnapshot};

use super::engine::PlaybackEngine;

/// Snapshot of the playback clock published after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackUpdate {
    /// Virtual time after the tick.
    pub clock: DateTime<Utc>,
    /// Engine state after the tick.
    pub state: PlaybackState,
}

/// Events published by the scheduler's timers.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A monitor sample.
    Progress(ProgressSnapshot),
    /// A playback tick result.
    Playback(PlaybackUpdate),
}

/// Owns the timer threads for one session.
pub struct Scheduler {
    tx: Sender<SchedulerEvent>,
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler and the receiving end of its event channel.
    pub fn new() -> (Self, Receiver<SchedulerEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                tx,
                stop: Arc::new(AtomicBool::new(false)),
                handles: Vec::new(),
            },
            rx,
        )
    }

    /// Start the monitor timer.
    pub fn start_monitor(&mut self, monitor: Arc<ProgressMonitor>, interval: Duration) {
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        let handle = std::thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let snapshot = monitor.sample();
                if tx.send(SchedulerEvent::Progress(snapshot)).is_err() {
                    break;
                }
                std::thread::sleep(interval);
            }
        });
        self.handles.push(handle);
    }

    /// Start the playback tick timer.
    pub fn start_playback(&mut self, engine: Arc<Mutex<PlaybackEngine>>, interval: Duration) {
        let tx = self.tx.clone();
        let stop = self.stop.clone();
        let handle = std::thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(interval);
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                let outcome = engine.lock().tick();
                let update = PlaybackUpdate {
                    clock: outcome.clock,
                    state: outcome.state,
                };
                if tx.send(SchedulerEvent::Playback(update)).is_err() {
                    break;
                }
                if outcome.state == PlaybackState::Complete {
                    break;
                }
            }
        });
        self.handles.push(handle);
    }

    /// Stop both timers and wait for them to exit.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

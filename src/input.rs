//! Real-time host: stdin keys plus idle timeouts.
//!
//! A dedicated thread reads stdin one line at a time and publishes keys on a
//! [`Topic`]. The control thread drains that topic through [`KeyboardTicks`],
//! which produces a `Timeout` tick every `poll` interval when no key is
//! waiting.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use spin_sleep::SpinSleeper;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::bus::Topic;
use crate::scheduler::{Key, Tick, TickSource};
use crate::timer::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    Quit,
}

/// Maps one stdin line to an input. Blank lines are ignored.
pub fn parse_line(line: &str) -> Option<Input> {
    let raw = line.trim_end_matches(['\r', '\n']);
    if raw == "\t" {
        return Some(Input::Key(Key::Toggle));
    }
    let word = raw.trim();
    if word.is_empty() {
        return None;
    }
    let key = match word.to_ascii_lowercase().as_str() {
        "w" | "up" => Key::Up,
        "s" | "down" => Key::Down,
        "a" | "left" => Key::Left,
        "d" | "right" => Key::Right,
        "t" | "tab" => Key::Toggle,
        "q" | "quit" => return Some(Input::Quit),
        _ => Key::Other(word.to_string()),
    };
    Some(Input::Key(key))
}

/// Publishes keys read from `reader` until it ends or a quit line arrives.
/// Quit clears `running`; end of input only stops key delivery.
pub fn read_keys<R: BufRead>(reader: R, keys: &Topic<Key>, running: &AtomicBool) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Key input failed; continuing without keys");
                return;
            }
        };
        match parse_line(&line) {
            Some(Input::Quit) => {
                info!("Quit requested");
                running.store(false, Ordering::Relaxed);
                return;
            }
            Some(Input::Key(key)) => {
                if !keys.publish(key) {
                    debug!("No control loop subscribed; key dropped");
                }
            }
            None => {}
        }
    }
    info!("Key input closed; continuing without keys");
}

/// Tick source for the control thread.
pub struct KeyboardTicks {
    keys: broadcast::Receiver<Arc<Key>>,
    clock: Clock,
    running: Arc<AtomicBool>,
    sleeper: SpinSleeper,
    poll: Duration,
}

impl KeyboardTicks {
    pub fn new(keys: &Topic<Key>, clock: Clock, running: Arc<AtomicBool>, poll: Duration) -> Self {
        Self {
            keys: keys.subscribe(),
            clock,
            running,
            sleeper: SpinSleeper::new(1_000),
            poll,
        }
    }
}

impl TickSource for KeyboardTicks {
    fn next_event(&mut self) -> Option<Tick> {
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return None;
            }
            match self.keys.try_recv() {
                Ok(key) => return Some(Tick::key(self.clock.now(), (*key).clone())),
                Err(TryRecvError::Empty) => {
                    self.sleeper.sleep(self.poll);
                    return Some(Tick::timeout(self.clock.now()));
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Control loop fell behind; key presses dropped");
                }
                Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

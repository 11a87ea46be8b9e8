//! The control loop.
//!
//! One thread owns the robot and the outbound socket. Each delivered event
//! (a key press or an idle timeout) is one tick; on every tick four
//! independent timers are polled:
//!
//! | timer  | rate  | action                                               |
//! |--------|-------|------------------------------------------------------|
//! | status | 1 Hz  | print sensor + waypoint lines, sample the laser      |
//! | laser  | 15 Hz | sample the laser (skipped on ticks where status ran) |
//! | frame  | 20 Hz | refresh the robot, emit a tag datagram               |
//! | auto   | 20 Hz | one autonomous policy step (autonomous mode only)    |
//!
//! The laser timer is only polled when the status timer did not fire, and
//! the auto timer only while autonomous; an unpolled timer keeps its phase.

use std::fmt;

use tagsim_navigation::{AutoPolicy, MoveCommand, select_target};
use tagsim_protocol::TagEncoder;
use tracing::{debug, info, warn};

use crate::blackboard::{Blackboard, snapshot};
use crate::config::RateSettings;
use crate::robot::RobotSim;
use crate::timer::Timer;
use crate::transport::TagSink;

/// Keys the host delivers. Anything that is not a move or the toggle is `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Toggle,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    KeyDown(Key),
    Timeout,
}

/// One delivery from the host: what happened and when (seconds since start).
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub at: f64,
    pub event: Event,
}

impl Tick {
    pub fn timeout(at: f64) -> Self {
        Self {
            at,
            event: Event::Timeout,
        }
    }

    pub fn key(at: f64, key: Key) -> Self {
        Self {
            at,
            event: Event::KeyDown(key),
        }
    }
}

/// Host event delivery. `None` means the host is shutting down.
pub trait TickSource {
    fn next_event(&mut self) -> Option<Tick>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Manual,
    Autonomous,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Manual => Mode::Autonomous,
            Mode::Autonomous => Mode::Manual,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::Autonomous => write!(f, "autonomous"),
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum KeyOutcome {
    /// The tick carried no key.
    #[default]
    NoKey,
    Moved(MoveCommand),
    /// A move key arrived in autonomous mode.
    Dropped,
    Toggled(Mode),
    /// Not ours; left to the host.
    PassedThrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub sensor_line: String,
    pub waypoint_line: String,
    pub laser_line: String,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub status: Option<StatusReport>,
    /// The 15 Hz laser timer fired (not counting the status timer's sample).
    pub laser_sampled: bool,
    /// A datagram was handed to the sink successfully.
    pub frame_emitted: bool,
    pub auto_step: Option<MoveCommand>,
    pub key: KeyOutcome,
}

pub struct Scheduler<S: TagSink> {
    robot: RobotSim,
    policy: AutoPolicy,
    encoder: TagEncoder,
    sink: S,
    blackboard: Blackboard,
    mode: Mode,
    status_timer: Timer,
    laser_timer: Timer,
    frame_timer: Timer,
    auto_timer: Timer,
    send_failures: u64,
    encode_failures: u64,
}

/// Repeated failures are logged loudly on the first occurrence and every
/// 100th after that; the rest go to `debug`.
fn is_loud_failure(count: u64) -> bool {
    count == 1 || count % 100 == 0
}

impl<S: TagSink> Scheduler<S> {
    pub fn new(
        robot: RobotSim,
        policy: AutoPolicy,
        encoder: TagEncoder,
        sink: S,
        blackboard: Blackboard,
        rates: &RateSettings,
    ) -> Self {
        Self {
            robot,
            policy,
            encoder,
            sink,
            blackboard,
            mode: Mode::Manual,
            status_timer: Timer::from_hz(rates.status_hz),
            laser_timer: Timer::from_hz(rates.laser_hz),
            frame_timer: Timer::from_hz(rates.frame_hz),
            auto_timer: Timer::from_hz(rates.auto_hz),
            send_failures: 0,
            encode_failures: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn robot(&self) -> &RobotSim {
        &self.robot
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    pub fn encode_failures(&self) -> u64 {
        self.encode_failures
    }

    /// Drives the loop until the source signals shutdown. Returns the number
    /// of ticks processed.
    pub fn run<T: TickSource>(&mut self, source: &mut T) -> u64 {
        info!(mode = %self.mode, "Control loop started");
        let mut ticks = 0;
        while let Some(tick) = source.next_event() {
            self.on_tick(&tick);
            ticks += 1;
        }
        info!(
            ticks,
            mode = %self.mode(),
            send_failures = self.send_failures(),
            encode_failures = self.encode_failures(),
            pose = %self.robot().pose(),
            "Control loop stopped"
        );
        ticks
    }

    pub fn on_tick(&mut self, tick: &Tick) -> TickReport {
        let now = tick.at;
        let mut report = TickReport::default();

        if self.status_timer.fire(now) {
            report.status = Some(self.show_status(now));
        } else if self.laser_timer.fire(now) {
            self.robot.log_laser_value(now);
            report.laser_sampled = true;
        }

        if self.frame_timer.fire(now) {
            report.frame_emitted = self.emit_tag_message(now);
        }

        if self.mode == Mode::Autonomous && self.auto_timer.fire(now) {
            report.auto_step = Some(self.auto_step());
        }

        if let Event::KeyDown(key) = &tick.event {
            report.key = self.handle_key(key);
        }
        report
    }

    fn show_status(&mut self, now: f64) -> StatusReport {
        let snap = snapshot(&self.blackboard);
        let report = StatusReport {
            sensor_line: snap.sensor_line(),
            waypoint_line: snap.waypoint_line(),
            laser_line: self.robot.log_laser_value(now),
        };
        info!("{}", report.sensor_line);
        info!("{}", report.waypoint_line);
        info!("{}", report.laser_line);
        report
    }

    fn emit_tag_message(&mut self, now: f64) -> bool {
        self.robot.refresh_state();
        let payload = match self.encoder.encode(&self.robot.pose(), now) {
            Ok(payload) => payload,
            Err(e) => {
                self.encode_failures += 1;
                let failures = self.encode_failures;
                if is_loud_failure(failures) {
                    warn!(error = %e, failures, "Could not encode tag message");
                } else {
                    debug!(error = %e, failures, "Could not encode tag message");
                }
                return false;
            }
        };
        match self.sink.send(&payload) {
            Ok(_) => true,
            Err(e) => {
                self.send_failures += 1;
                let failures = self.send_failures;
                if is_loud_failure(failures) {
                    warn!(error = %e, failures, "Tag message send failed");
                } else {
                    debug!(error = %e, failures, "Tag message send failed");
                }
                false
            }
        }
    }

    fn auto_step(&mut self) -> MoveCommand {
        let snap = snapshot(&self.blackboard);
        let target = snap.waypoints.as_ref().and_then(|w| select_target(&w.points));
        let command = self.policy.step(&self.robot.pose(), target);
        self.robot.apply(command);
        command
    }

    fn handle_key(&mut self, key: &Key) -> KeyOutcome {
        if *key == Key::Toggle {
            self.mode = self.mode.toggled();
            info!("(say) toggle autonomous mode {}", if self.mode == Mode::Autonomous { "on" } else { "off" });
            return KeyOutcome::Toggled(self.mode);
        }
        let (command, label) = match key {
            Key::Up => (MoveCommand::MoveY(1.0), "up"),
            Key::Down => (MoveCommand::MoveY(-1.0), "down"),
            Key::Left => (MoveCommand::MoveX(-1.0), "left"),
            Key::Right => (MoveCommand::MoveX(1.0), "right"),
            Key::Other(name) => {
                info!("(say) unhandled key {}", name);
                return KeyOutcome::PassedThrough;
            }
            Key::Toggle => return KeyOutcome::PassedThrough,
        };
        if self.mode == Mode::Autonomous {
            debug!(key = label, "Move key ignored in autonomous mode");
            return KeyOutcome::Dropped;
        }
        self.robot.apply(command);
        info!("(say) Move {}", label);
        KeyOutcome::Moved(command)
    }
}

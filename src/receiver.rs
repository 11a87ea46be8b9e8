//! Inbound coordinator stream.
//!
//! Keeps a TCP connection to the coordinator open, decodes each line, and
//! swaps the result into the blackboard. Nothing here is fatal: a failed
//! connect or a dropped stream is logged and retried with exponential
//! backoff, and a malformed line is skipped. Readers keep seeing the last
//! good snapshot meanwhile.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, info, warn};

use tagsim_protocol::decode_update;

use crate::blackboard::{Blackboard, apply_update};
use crate::config::NetworkSettings;
use crate::timer::Clock;

/// Shortest delay between reconnect attempts.
const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Doubling reconnect delay, capped at `max` and never below 1 ms.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(MIN_BACKOFF);
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Connects to `addr` and feeds the blackboard until `running` is cleared.
pub async fn run_receiver(
    addr: SocketAddr,
    bb: Blackboard,
    clock: Clock,
    settings: NetworkSettings,
    running: Arc<AtomicBool>,
) {
    info!(%addr, "Coordinator receiver started");
    let mut backoff = Backoff::new(
        Duration::from_millis(settings.backoff_initial_ms),
        Duration::from_millis(settings.backoff_max_ms),
    );

    while running.load(Ordering::Relaxed) {
        match time::timeout(settings.connect_timeout(), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                info!(%addr, "Connected to coordinator stream");
                backoff.reset();
                match read_updates(stream, &bb, &clock).await {
                    Ok(accepted) => warn!(%addr, accepted, "Coordinator closed the stream"),
                    Err(e) => warn!(%addr, error = %e, "Coordinator stream failed"),
                }
            }
            Ok(Err(e)) => warn!(%addr, error = %e, "Could not connect to coordinator"),
            Err(_) => warn!(%addr, timeout = ?settings.connect_timeout(), "Timed out connecting to coordinator"),
        }

        let delay = backoff.next_delay();
        debug!(?delay, "Reconnecting after backoff");
        time::sleep(delay).await;
    }
    info!("Coordinator receiver stopped");
}

/// Reads newline-delimited updates until end of stream. Returns how many
/// lines were accepted.
pub async fn read_updates<R>(reader: R, bb: &Blackboard, clock: &Clock) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut accepted = 0;
    while let Some(segment) = segments.next_segment().await? {
        let Ok(line) = std::str::from_utf8(&segment) else {
            debug!(len = segment.len(), "Discarding non-UTF-8 coordinator line");
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_update(line) {
            Ok(update) => {
                apply_update(bb, update, clock.now());
                accepted += 1;
            }
            Err(e) => debug!(error = %e, line, "Discarding malformed coordinator line"),
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::snapshot;
    use tagsim_navigation::WorldPoint;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(350));
        assert_eq!(backoff.next_delay(), Duration::from_millis(350));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_backoff_still_waits_and_grows() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_millis(5));
        let delays: Vec<Duration> = (0..4).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1),
                Duration::from_millis(2),
                Duration::from_millis(4),
                Duration::from_millis(5),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_updates_skips_malformed_lines() {
        let bb = Blackboard::default();
        let clock = Clock::start();
        let input: &[u8] = b"{\"f\": 10, \"b\": 20}\ngarbage\n\n\xff\xfe\n{\"f\": 3}\n{\"w\": [[1, 2], [3, 4]]}\n";

        let accepted = read_updates(input, &bb, &clock).await.unwrap();
        assert_eq!(accepted, 2);

        let snap = snapshot(&bb);
        let sensor = snap.sensor.unwrap();
        assert_eq!((sensor.front, sensor.back), (10.0, 20.0));
        assert_eq!(
            snap.waypoints.as_ref().unwrap().points,
            vec![WorldPoint::new(1.0, 2.0), WorldPoint::new(3.0, 4.0)]
        );
    }

    #[tokio::test]
    async fn test_malformed_line_keeps_previous_snapshot() {
        let bb = Blackboard::default();
        let clock = Clock::start();
        read_updates(&b"{\"f\": 5, \"b\": 6}\n"[..], &bb, &clock).await.unwrap();
        let before = snapshot(&bb);

        let accepted = read_updates(&b"{\"f\": oops}\n"[..], &bb, &clock).await.unwrap();
        assert_eq!(accepted, 0);
        assert_eq!(*snapshot(&bb), *before);
    }

    #[tokio::test]
    async fn test_receiver_reconnects_after_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let bb = Blackboard::default();
        let running = Arc::new(AtomicBool::new(true));
        let settings = NetworkSettings {
            backoff_initial_ms: 10,
            backoff_max_ms: 20,
            ..NetworkSettings::default()
        };

        let task = tokio::spawn(run_receiver(
            addr,
            Arc::clone(&bb),
            Clock::start(),
            settings,
            Arc::clone(&running),
        ));

        // First connection: one sensor reading, then hang up
        let (mut first, _) = listener.accept().await.unwrap();
        first.write_all(b"{\"f\": 1, \"b\": 2}\n").await.unwrap();
        drop(first);

        // Second connection: a waypoint push
        let (mut second, _) = time::timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        second.write_all(b"{\"w\": [[7, 8]]}\n").await.unwrap();

        let deadline = time::Instant::now() + Duration::from_secs(5);
        loop {
            let snap = snapshot(&bb);
            if snap.waypoints.is_some() {
                assert_eq!(snap.sensor.unwrap().front, 1.0);
                assert_eq!(snap.waypoints.as_ref().unwrap().points, vec![WorldPoint::new(7.0, 8.0)]);
                break;
            }
            assert!(time::Instant::now() < deadline, "waypoints never arrived");
            time::sleep(Duration::from_millis(10)).await;
        }

        running.store(false, Ordering::Relaxed);
        task.abort();
    }
}

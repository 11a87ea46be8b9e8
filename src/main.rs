mod blackboard; // latest coordinator snapshot
mod bus; // key topic between stdin and the control thread
mod config;
mod error;
mod input;
mod receiver;
mod robot;
mod scheduler;
mod timer;
mod transport;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tagsim_navigation::AutoPolicy;
use tagsim_protocol::TagEncoder;

use blackboard::Blackboard;
use bus::Topic;
use config::{Settings, load_settings};
use input::{KeyboardTicks, read_keys};
use receiver::run_receiver;
use robot::RobotSim;
use scheduler::{Key, Scheduler};
use timer::Clock;
use transport::{UdpTagSink, resolve};

const KEY_QUEUE_DEPTH: usize = 16;

/// Simulated robot that streams fiducial tag detections to a coordinator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Coordinator host (overrides `network.host`)
    host: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_deref(), args.host.as_deref())?;

    match run(settings).await {
        Ok(()) => {
            info!("Tag simulator stopped.");
            Ok(())
        }
        Err(e) => {
            error!("Tag simulator failed: {:?}", e);
            Err(e)
        }
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let net = &settings.network;
    let tag_addr = resolve(&net.host, net.tag_port)?;
    let waypoint_addr = resolve(&net.host, net.waypoint_port)?;
    let sink = UdpTagSink::bind(tag_addr)?;

    let walls = settings.arena.segments()?;
    let robot = RobotSim::from_settings(&settings.robot, walls)?;
    let policy = AutoPolicy::new(
        robot.step_size(),
        settings.autonomy.max_steps,
        settings.autonomy.arrival_tolerance,
    )?;
    let encoder = TagEncoder::new(settings.robot.tag_id, settings.robot.tag_size, &settings.arena.corner_tags)?;

    info!("Tag simulator talking to {}", net.host);
    info!("  tag detections  -> udp {}", sink.dest());
    info!("  sensor/waypoint <- tcp {}", waypoint_addr);
    info!("Keys: w/s/a/d move, t toggles autonomous mode, q quits");

    let bb: Blackboard = Arc::default();
    let clock = Clock::start();
    let running = Arc::new(AtomicBool::new(true));
    let keys: Topic<Key> = Topic::new(KEY_QUEUE_DEPTH);

    info!("Spawning coordinator receiver...");
    let receiver = tokio::spawn(run_receiver(
        waypoint_addr,
        Arc::clone(&bb),
        clock,
        net.clone(),
        Arc::clone(&running),
    ));

    // Blocking stdin reads stay off the runtime so shutdown never waits on them
    info!("Spawning key input thread...");
    std::thread::Builder::new().name("keys".into()).spawn({
        let keys = keys.clone();
        let running = Arc::clone(&running);
        move || read_keys(io::stdin().lock(), &keys, &running)
    })?;

    info!("Spawning control thread...");
    let control = std::thread::Builder::new().name("control".into()).spawn({
        let mut ticks = KeyboardTicks::new(
            &keys,
            clock,
            Arc::clone(&running),
            Duration::from_millis(settings.rates.poll_ms),
        );
        let mut scheduler = Scheduler::new(robot, policy, encoder, sink, Arc::clone(&bb), &settings.rates);
        move || scheduler.run(&mut ticks)
    })?;
    let mut control_done = tokio::task::spawn_blocking(move || control.join());

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Ctrl-C received, shutting down..."),
                Err(e) => warn!("Could not listen for Ctrl-C ({}), shutting down", e),
            }
            None
        }
        joined = &mut control_done => Some(joined),
    };

    running.store(false, Ordering::Relaxed);
    let joined = match finished {
        Some(joined) => joined,
        None => control_done.await,
    };
    receiver.abort();

    match joined {
        Ok(Ok(ticks)) => {
            info!(ticks, "Control thread finished.");
            Ok(())
        }
        Ok(Err(_)) => Err(anyhow::anyhow!("control thread panicked")),
        Err(e) => Err(anyhow::anyhow!("control thread could not be joined: {}", e)),
    }
}

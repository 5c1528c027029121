//! gati-sim - run a demo routine against a simulated drivetrain
//!
//! Loads a TOML file holding the engine sections plus a `[sim]` section,
//! drives a square, a spline and a timed pause, and logs statistics and the
//! motion profile at the end. Simulated time advances by a fixed period per
//! tick unless `--realtime` is given.

mod config;
mod error;
mod noise;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use gati::plugins::{PoseLock, StatTracker};
use gati::sim::SimulatedRobot;
use gati::{
    Circle, Engine, Listener, ListenerMode, ManualClock, PointXY, PointXYZ, Rectangle, Zone,
};
use tracing::{info, warn};

use config::SimFileConfig;
use error::Result;
use noise::NoisyOdometry;

/// Run the gati demo routine on a simulated robot
#[derive(Parser, Debug)]
#[command(name = "gati-sim")]
#[command(about = "Simulated drivetrain runner for the gati motion core")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "configs/sim.toml")]
    config: PathBuf,

    /// Save the movement recording to this TOML file
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Pace ticks on the wall clock instead of simulated time
    #[arg(long)]
    realtime: bool,

    /// Give up after this many seconds of engine time
    #[arg(long, default_value_t = 60)]
    timeout_s: u64,

    /// Override the noise seed (0 = entropy)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gati=info".parse().unwrap())
                .add_directive("gati_sim=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        info!("Loading configuration from {:?}", args.config);
        SimFileConfig::load(&args.config)?
    } else {
        warn!("{:?} not found, using default configuration", args.config);
        SimFileConfig::default()
    };
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }
    if args.record.is_some() {
        config.gati.engine.record_movement = true;
    }
    config.gati.engine.profile_motion = true;

    let sim = config.sim.clone();
    let robot = SimulatedRobot::with_step(sim.start(), sim.units_per_tick, sim.degrees_per_tick);
    let odometry = NoisyOdometry::new(
        robot.odometry(),
        sim.seed,
        sim.position_noise_stddev,
        sim.heading_noise_stddev,
    );

    let mut engine = if args.realtime {
        if config.gati.engine.tick_interval_ms == 0 {
            config.gati.engine.tick_interval_ms = sim.tick_period_ms;
        }
        info!("Pacing ticks at {} ms", config.gati.engine.tick_interval_ms);
        Engine::with_config(robot.drive(), odometry, config.gati)?
    } else {
        let clock = ManualClock::new();
        let mut engine =
            Engine::with_config(robot.drive(), odometry, config.gati)?.with_clock(clock.shared());
        let period = sim.tick_period_ms;
        engine.on_tick(move |_| clock.advance(period));
        engine
    };

    info!(
        "Simulated robot at {} ({} units/tick, {}°/tick)",
        robot.pose(),
        sim.units_per_tick,
        sim.degrees_per_tick
    );

    let stats = StatTracker::new();
    let stat_handle = stats.handle();
    engine.load_plugin(stats)?;

    // Re-anchor odometry whenever the robot crosses back into the home pad
    let homed = Rc::new(Cell::new(false));
    let home_flag = homed.clone();
    engine.load_plugin(PoseLock::new("home", PointXYZ::ZERO, move |_| {
        home_flag.get()
    }))?;

    setup_field(&mut engine, homed)?;
    register_routine(&mut engine)?;

    let ids = engine.follow_group("demo")?;
    let pause = engine
        .task_builder()
        .min_ms(500)
        .on_finish(|| info!("Pause complete"))
        .build()?;
    engine.follow_trajectory(pause);
    engine.go_to(PointXYZ::ZERO)?;
    info!("Queued {} routine steps", ids.len() + 2);

    let outcome = engine.tick_until_idle(Duration::from_secs(args.timeout_s));
    if outcome.timed_out() {
        warn!("Routine timed out after {} ticks", outcome.ticks());
        engine.clear();
    } else {
        info!("Routine finished in {} ticks", outcome.ticks());
    }

    let s = stat_handle.snapshot();
    info!(
        "Stats: {} ticks, {} followers started, {} finished, {} zone enters, {} zone exits",
        s.ticks, s.followers_started, s.followers_finished, s.zone_enters, s.zone_exits
    );
    if let Some(profile) = engine.profile() {
        info!(
            "Profile: distance {:.2}, max speed {:.2}/s, max turn {:.1}°/s, max accel {:.2}/s²",
            profile.distance, profile.max_speed, profile.max_angular_speed, profile.max_acceleration
        );
    }
    info!("Final pose {} (true pose {})", engine.position(), robot.pose());

    if let Some(path) = args.record
        && let Some(recording) = engine.take_recording()
    {
        recording.save(&path)?;
        info!(
            "Saved {} samples ({} ms) to {:?}",
            recording.len(),
            recording.duration_ms(),
            path
        );
    }

    engine.teardown();
    Ok(())
}

/// Zones and listeners for the demo field.
fn setup_field(engine: &mut Engine, homed: Rc<Cell<bool>>) -> Result<()> {
    let entered = homed.clone();
    engine.add_zone(
        "home",
        Zone::builder(Circle::new(PointXY::ZERO, 0.5)?)
            .on_enter(move |_| entered.set(true))
            .on_exit(move |_| homed.set(false))
            .build(),
    )?;
    engine.add_zone(
        "checkpoint",
        Zone::builder(Circle::new(PointXY::new(10.0, 10.0), 1.5)?)
            .on_enter(|ctx| info!("Checkpoint reached at {} ms", ctx.now_ms))
            .build(),
    )?;
    engine.add_zone(
        "pillar",
        Zone::builder(Rectangle::centered(PointXY::new(5.0, 5.0), 2.0, 2.0)?)
            .solid(true)
            .on_enter(|ctx| warn!("Drove into pillar at {}", ctx.pose))
            .build(),
    )?;

    engine.add_listener(
        Listener::new(|ctx| ctx.pose.x > 15.0, |ctx| info!("Past x=15 at {}", ctx.pose))
            .named("far_side")
            .mode(ListenerMode::NewlyMet)
            .cooldown_ms(1000),
    )?;
    Ok(())
}

/// Square around the pillar followed by a spline back across the field.
fn register_routine(engine: &mut Engine) -> Result<()> {
    let corners = [
        ("corner_a", PointXYZ::new(10.0, 0.0, 90.0)),
        ("corner_b", PointXYZ::new(10.0, 10.0, 180.0)),
        ("corner_c", PointXYZ::new(0.0, 10.0, 270.0)),
    ];
    for (name, target) in corners {
        let t = engine.point_builder(target).build()?;
        engine.add_trajectory("demo", name, t)?;
    }

    let sweep = engine
        .spline_builder()
        .add_point(PointXYZ::new(0.0, 10.0, 0.0), 0.6)
        .add_point(PointXYZ::new(10.0, 14.0, 0.0), 0.8)
        .add_point(PointXYZ::new(20.0, 10.0, 0.0), 0.5)
        .step(0.5)
        .build()?;
    engine.add_trajectory("demo", "sweep", sweep)?;
    Ok(())
}

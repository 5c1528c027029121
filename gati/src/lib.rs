//! # Gati: Motion Execution for Mobile Robots
//!
//! Turns declarative path descriptions into one robot-relative velocity
//! command per control cycle, and provides the scheduling and event
//! infrastructure scripted autonomous routines hook into.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use gati::{Engine, PointXYZ};
//! use gati::sim::SimulatedRobot;
//!
//! let robot = SimulatedRobot::new(PointXYZ::ZERO);
//! let mut engine = Engine::new(robot.drive(), robot.odometry());
//!
//! engine.go_to(PointXYZ::new(10.0, 10.0, 90.0))?;
//! let outcome = engine.tick_until_idle(Duration::from_secs(5));
//! println!("arrived after {} ticks at {}", outcome.ticks(), engine.position());
//! # Ok::<(), gati::ConfigError>(())
//! ```
//!
//! ## Coordinate Frame
//!
//! - Headings are degrees in [0, 360), counter-clockwise positive, 0° along +X.
//! - Field-relative translations are converted to robot-relative by rotating
//!   by the negative current heading before they reach the drive.
//! - Translation components handed to the drive are clamped to [-1, 1].
//!
//! ## Architecture
//!
//! ```text
//!   registry ──► Trajectory ──► Follower ──► Executor ──► Drive
//!                                               ▲
//!   Odometry ──► pose ──► Scheduler, ZoneProcessor, ListenerManager
//!                                               │
//!                       PluginManager hooks around every phase
//! ```
//!
//! - [`geometry`]: angles, points, poses and translations
//! - [`trajectory`]: point, spline, multi-segment and task trajectories
//! - [`follower`] / [`control`]: per-tick pursuit with pluggable turn control
//! - [`executor`]: one-at-a-time follower queue
//! - [`zone`]: shapes and enter/exit/while-inside events
//! - [`scheduler`], [`listener`]: condition-gated tasks and bindings
//! - [`plugin`], [`plugins`]: lifecycle hooks and bundled plugins
//! - [`engine`]: the façade and the fixed tick order

pub mod clock;
pub mod config;
pub mod context;
pub mod control;
pub mod engine;
pub mod error;
pub mod executor;
pub mod follower;
pub mod geometry;
pub mod listener;
pub mod plugin;
pub mod plugins;
pub mod recording;
pub mod registry;
pub mod robot;
pub mod scheduler;
pub mod sim;
pub mod trajectory;
pub mod wait;
pub mod zone;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::GatiConfig;
pub use context::{PluginContext, TickContext};
pub use engine::{Engine, TickOutcome};
pub use error::{ConfigError, GatiError, LookupError, Result};
pub use executor::ExecutorStep;
pub use follower::{Follower, FollowerOutput, GenericFollower};
pub use geometry::{Angle, PointXY, PointXYZ, Translation};
pub use listener::{Listener, ListenerMode};
pub use plugin::{FollowerInfo, Plugin};
pub use robot::{Drive, Odometry};
pub use scheduler::{ScheduledTask, Task, TaskOutcome};
pub use trajectory::{
    MultiSegmentTrajectory, PointTrajectory, SplineTrajectory, TaskTrajectory, Trajectory,
};
pub use zone::{Circle, Polygon, Rectangle, Shape, Zone};

//! Integration tests for gati against the simulated robot
//!
//! Every engine here runs on a [`ManualClock`] advanced by a fixed step at
//! the end of each tick, so runs are deterministic and timeouts are counted
//! in ticks rather than wall time.
//!
//! ```bash
//! cargo test -p gati --test integration
//! ```

mod properties;
mod routines;

use std::cell::Cell;
use std::rc::Rc;

use gati::sim::SimulatedRobot;
use gati::{Engine, GatiConfig, ManualClock, PointXYZ, TickContext};

/// Engine clock advance per tick (ms)
pub const TICK_MS: u64 = 10;

/// Engine wired to a simulated robot and a manual clock.
pub struct Rig {
    pub engine: Engine,
    pub robot: SimulatedRobot,
    pub clock: ManualClock,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(PointXYZ::ZERO, GatiConfig::default())
    }

    pub fn at(start: PointXYZ) -> Self {
        Self::with_config(start, GatiConfig::default())
    }

    pub fn with_config(start: PointXYZ, config: GatiConfig) -> Self {
        let robot = SimulatedRobot::new(start);
        let clock = ManualClock::new();
        let mut engine = Engine::with_config(robot.drive(), robot.odometry(), config)
            .expect("valid config")
            .with_clock(clock.shared());
        let c = clock.clone();
        engine.on_tick(move |_| c.advance(TICK_MS));
        Self {
            engine,
            robot,
            clock,
        }
    }

    /// Run exactly `ticks` ticks.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.engine.tick();
        }
    }
}

/// Shared counter and a callback that bumps it.
pub fn counter() -> (Rc<Cell<u32>>, impl FnMut(&TickContext) + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, move |_: &TickContext| c.set(c.get() + 1))
}

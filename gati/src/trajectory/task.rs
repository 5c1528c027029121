//! Non-motion work in the motion queue.

use std::fmt;

use tracing::debug;

use super::{DoneLatch, Trajectory};
use crate::clock::{SharedClock, SystemClock};
use crate::error::ConfigError;
use crate::geometry::PointXYZ;

type Callback = Box<dyn FnMut()>;
type Predicate = Box<dyn FnMut() -> bool>;

/// A trajectory that holds the robot still while callbacks run.
///
/// Lifecycle:
///
/// 1. `initial` runs on the first tick.
/// 2. `during` runs on every tick until the task is finished.
/// 3. `on_finish` runs once, on the tick completion is detected.
///
/// The task is finished when `max_ms` has elapsed, or when at least `min_ms`
/// has elapsed and the `is_finished` predicate returns true. Without a
/// predicate the task finishes as soon as `min_ms` has elapsed.
pub struct TaskTrajectory {
    initial: Option<Callback>,
    during: Option<Callback>,
    on_finish: Option<Callback>,
    is_finished: Option<Predicate>,
    min_ms: u64,
    max_ms: Option<u64>,
    clock: SharedClock,
    started_at: Option<u64>,
    done: DoneLatch,
}

impl TaskTrajectory {
    /// Start a builder.
    pub fn builder() -> TaskTrajectoryBuilder {
        TaskTrajectoryBuilder::new()
    }

    /// Milliseconds since the first tick, or `None` if not started.
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.started_at
            .map(|start| self.clock.now_ms().saturating_sub(start))
    }

    fn start_if_needed(&mut self) -> u64 {
        if let Some(start) = self.started_at {
            return start;
        }
        let now = self.clock.now_ms();
        self.started_at = Some(now);
        if let Some(initial) = self.initial.as_mut() {
            initial();
        }
        now
    }

    fn evaluate(&mut self) -> bool {
        let start = self.start_if_needed();
        let elapsed = self.clock.now_ms().saturating_sub(start);
        if self.max_ms.is_some_and(|max| elapsed >= max) {
            debug!("task reached max duration after {} ms", elapsed);
            return true;
        }
        if elapsed < self.min_ms {
            return false;
        }
        match self.is_finished.as_mut() {
            Some(predicate) => predicate(),
            None => true,
        }
    }
}

impl Trajectory for TaskTrajectory {
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ {
        self.start_if_needed();
        if !self.done.is_set()
            && let Some(during) = self.during.as_mut()
        {
            during();
        }
        current
    }

    fn is_done(&mut self, _current: PointXYZ) -> bool {
        if self.done.is_set() {
            return true;
        }
        if self.evaluate() {
            self.done.set();
            if let Some(on_finish) = self.on_finish.as_mut() {
                on_finish();
            }
        }
        self.done.is_set()
    }

    fn speed(&mut self, _current: PointXYZ) -> f64 {
        0.0
    }

    fn describe(&self) -> String {
        match self.max_ms {
            Some(max) => format!("task[{}..{} ms]", self.min_ms, max),
            None => format!("task[{}.. ms]", self.min_ms),
        }
    }
}

impl fmt::Debug for TaskTrajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTrajectory")
            .field("min_ms", &self.min_ms)
            .field("max_ms", &self.max_ms)
            .field("started_at", &self.started_at)
            .field("done", &self.done.is_set())
            .finish()
    }
}

/// Builder for [`TaskTrajectory`].
pub struct TaskTrajectoryBuilder {
    initial: Option<Callback>,
    during: Option<Callback>,
    on_finish: Option<Callback>,
    is_finished: Option<Predicate>,
    min_ms: u64,
    max_ms: Option<u64>,
    clock: Option<SharedClock>,
}

impl Default for TaskTrajectoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTrajectoryBuilder {
    pub fn new() -> Self {
        Self {
            initial: None,
            during: None,
            on_finish: None,
            is_finished: None,
            min_ms: 0,
            max_ms: None,
            clock: None,
        }
    }

    pub fn initial(mut self, f: impl FnMut() + 'static) -> Self {
        self.initial = Some(Box::new(f));
        self
    }

    pub fn during(mut self, f: impl FnMut() + 'static) -> Self {
        self.during = Some(Box::new(f));
        self
    }

    pub fn on_finish(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    pub fn is_finished(mut self, f: impl FnMut() -> bool + 'static) -> Self {
        self.is_finished = Some(Box::new(f));
        self
    }

    /// Minimum run time before the predicate is consulted.
    pub fn min_ms(mut self, ms: u64) -> Self {
        self.min_ms = ms;
        self
    }

    /// Hard upper bound on run time.
    pub fn max_ms(mut self, ms: u64) -> Self {
        self.max_ms = Some(ms);
        self
    }

    /// Time source. Defaults to a fresh [`SystemClock`].
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build. Fails if `min_ms > max_ms`.
    pub fn build(self) -> Result<TaskTrajectory, ConfigError> {
        if let Some(max) = self.max_ms
            && self.min_ms > max
        {
            return Err(ConfigError::InvalidDuration {
                min_ms: self.min_ms,
                max_ms: max,
            });
        }
        Ok(TaskTrajectory {
            initial: self.initial,
            during: self.during,
            on_finish: self.on_finish,
            is_finished: self.is_finished,
            min_ms: self.min_ms,
            max_ms: self.max_ms,
            clock: self.clock.unwrap_or_else(SystemClock::shared),
            started_at: None,
            done: DoneLatch::new(),
        })
    }
}

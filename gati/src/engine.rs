//! The engine façade: owns the robot capabilities and runs the tick loop.
//!
//! # Tick order
//!
//! ```text
//! 1. pre-tick   plugins.pre_tick -> pose refresh -> scheduler -> zones
//! 2. executor   active follower -> drive.set_translation
//! 3. on-tick    plugins.on_tick -> recorder/profiler -> listeners -> callbacks
//! 4. post-tick  plugins.post_tick
//! ```
//!
//! The engine is single threaded and spawns nothing. Scripted routines call
//! [`Engine::tick`] in their own loop, or use the blocking `tick_*` helpers.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::config::GatiConfig;
use crate::control::ProportionalController;
use crate::context::{PluginContext, TickContext};
use crate::error::{ConfigError, LookupError};
use crate::executor::{Executor, ExecutorStep};
use crate::follower::{Follower, GenericFollower};
use crate::geometry::{PointXYZ, Translation};
use crate::listener::{Listener, ListenerManager};
use crate::plugin::{Plugin, PluginManager};
use crate::recording::{MotionProfile, MotionProfiler, MovementRecorder, MovementRecording};
use crate::registry::TrajectoryRegistry;
use crate::robot::{Drive, Odometry};
use crate::scheduler::{ScheduledTask, Scheduler};
use crate::trajectory::{PointTrajectoryBuilder, SplineBuilder, TaskTrajectoryBuilder, Trajectory};
use crate::wait;
use crate::zone::{Zone, ZoneProcessor};

type TickCallback = Box<dyn FnMut(&TickContext)>;

/// How a blocking tick helper returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The awaited condition was reached.
    Completed {
        /// Ticks run by the helper
        ticks: u64,
    },
    /// The timeout elapsed first. In-flight followers stay active.
    TimedOut {
        /// Ticks run by the helper
        ticks: u64,
    },
}

impl TickOutcome {
    pub fn ticks(self) -> u64 {
        match self {
            Self::Completed { ticks } | Self::TimedOut { ticks } => ticks,
        }
    }

    pub fn timed_out(self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Motion-execution engine.
pub struct Engine {
    drive: Box<dyn Drive>,
    odometry: Box<dyn Odometry>,
    clock: SharedClock,
    config: GatiConfig,

    executor: Executor,
    scheduler: Scheduler,
    zones: ZoneProcessor,
    listeners: ListenerManager,
    plugins: PluginManager,
    registry: TrajectoryRegistry,
    callbacks: Vec<TickCallback>,

    recorder: Option<MovementRecorder>,
    profiler: Option<MotionProfiler>,
    ticks: u64,
}

impl Engine {
    /// Engine with the default configuration and the system clock.
    pub fn new(drive: impl Drive + 'static, odometry: impl Odometry + 'static) -> Self {
        Self::build(
            Box::new(drive),
            Box::new(odometry),
            GatiConfig::default(),
            SystemClock::shared(),
        )
    }

    /// Engine with a validated configuration and the system clock.
    pub fn with_config(
        drive: impl Drive + 'static,
        odometry: impl Odometry + 'static,
        config: GatiConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            Box::new(drive),
            Box::new(odometry),
            config,
            SystemClock::shared(),
        ))
    }

    /// Replace the time source. Intended for construction time, before any
    /// listener or task trajectory captures the clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    fn build(
        drive: Box<dyn Drive>,
        odometry: Box<dyn Odometry>,
        config: GatiConfig,
        clock: SharedClock,
    ) -> Self {
        let recorder = config
            .engine
            .record_movement
            .then(|| MovementRecorder::new(config.engine.record_interval_ms));
        let profiler = config.engine.profile_motion.then(MotionProfiler::new);
        Self {
            drive,
            odometry,
            clock,
            executor: Executor::new(config.engine.stop_on_finish),
            scheduler: Scheduler::new(),
            zones: ZoneProcessor::new(config.zones.swept_detection),
            listeners: ListenerManager::new(),
            plugins: PluginManager::new(),
            registry: TrajectoryRegistry::new(),
            callbacks: Vec::new(),
            recorder,
            profiler,
            ticks: 0,
            config,
        }
    }

    /// Run one tick in the fixed phase order.
    pub fn tick(&mut self) -> ExecutorStep {
        self.ticks += 1;
        let now = self.clock.now_ms();
        let active = self.executor.is_active();
        let mut ctx = PluginContext::new(self.odometry.as_mut(), now, self.ticks);

        // Pre-tick
        self.plugins.pre_tick(&mut ctx);
        let pose = ctx.refresh_pose();
        let tick = ctx.tick_context(active);
        self.scheduler.tick(&tick);
        self.zones.update(&tick, &mut self.plugins, &mut ctx);

        // Executor
        let step = self
            .executor
            .tick(pose, self.drive.as_mut(), &mut self.plugins, &mut ctx);

        // On-tick
        self.plugins.on_tick(&mut ctx);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(now, pose, self.drive.translation());
        }
        if let Some(profiler) = self.profiler.as_mut() {
            profiler.update(now, pose);
        }
        self.listeners.tick(&tick);
        for callback in &mut self.callbacks {
            callback(&tick);
        }

        // Post-tick
        self.plugins.post_tick(&mut ctx);
        step
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Drive to `target` with the configured speed and tolerances.
    pub fn go_to(&mut self, target: PointXYZ) -> Result<u64, ConfigError> {
        let trajectory = self.config.point_builder(target).build()?;
        Ok(self.follow_trajectory(trajectory))
    }

    /// Queue a trajectory behind the generic follower with the configured
    /// turn controller. Returns the follower's sequence id.
    pub fn follow_trajectory(&mut self, trajectory: impl Trajectory + 'static) -> u64 {
        self.follow_boxed(Box::new(trajectory))
    }

    /// Queue an already boxed trajectory. Returns the follower's sequence id.
    pub fn follow_boxed(&mut self, trajectory: Box<dyn Trajectory>) -> u64 {
        let turn = match self.config.follower.turn.build() {
            Ok(turn) => turn,
            // Unreachable for engine configs, which are validated on construction
            Err(e) => {
                warn!("turn controller rejected ({}), using the default", e);
                Box::new(ProportionalController::default())
            }
        };
        let follower = GenericFollower::new(trajectory, turn);
        self.executor.push(Box::new(follower))
    }

    /// Queue trajectories to run one after another.
    pub fn follow_trajectories(&mut self, trajectories: Vec<Box<dyn Trajectory>>) -> Vec<u64> {
        trajectories
            .into_iter()
            .map(|t| self.follow_boxed(t))
            .collect()
    }

    /// Queue a custom follower.
    pub fn follow_with(&mut self, follower: Box<dyn Follower>) -> u64 {
        self.executor.push(follower)
    }

    /// Queue a fresh instance of a registered trajectory.
    pub fn follow_named(&mut self, name: &str) -> Result<u64, LookupError> {
        let trajectory = self.registry.get(name)?;
        Ok(self.follow_boxed(trajectory))
    }

    /// Queue a fresh instance of every trajectory registered under `group`,
    /// in insertion order. Unknown groups fail with near-match suggestions.
    pub fn follow_group(&mut self, group: &str) -> Result<Vec<u64>, LookupError> {
        let trajectories = self.registry.group(group)?;
        Ok(self.follow_trajectories(trajectories))
    }

    /// Register a named trajectory for [`follow_named`](Self::follow_named).
    pub fn add_trajectory<T>(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        trajectory: T,
    ) -> Result<(), ConfigError>
    where
        T: Trajectory + Clone + 'static,
    {
        self.registry.add_trajectory(group, name, trajectory)
    }

    /// Point trajectory builder seeded with the configured defaults.
    pub fn point_builder(&self, target: PointXYZ) -> PointTrajectoryBuilder {
        self.config.point_builder(target)
    }

    /// Spline builder seeded with the configured defaults.
    pub fn spline_builder(&self) -> SplineBuilder {
        self.config.spline_builder()
    }

    /// Task trajectory builder bound to the engine clock.
    pub fn task_builder(&self) -> TaskTrajectoryBuilder {
        TaskTrajectoryBuilder::new().clock(self.clock.clone())
    }

    /// Field-relative manual command, rotated into the robot frame by the
    /// current heading. Ignored (returns false) while a follower is active.
    pub fn drive_absolute(&mut self, translation: Translation) -> bool {
        let heading = self.odometry.position().z;
        self.drive_relative(translation.to_relative(heading))
    }

    /// Robot-relative manual command, clamped before it reaches the drive.
    /// Ignored (returns false) while a follower is active.
    pub fn drive_relative(&mut self, translation: Translation) -> bool {
        if self.executor.is_active() {
            debug!("manual drive ignored while a follower is active");
            return false;
        }
        self.drive.set_translation(translation.clamped());
        true
    }

    // ------------------------------------------------------------------
    // Zones, tasks, listeners, plugins
    // ------------------------------------------------------------------

    pub fn add_zone(&mut self, name: impl Into<String>, zone: Zone) -> Result<(), ConfigError> {
        self.zones.add(name, zone)
    }

    pub fn remove_zone(&mut self, name: &str) -> Option<Zone> {
        self.zones.remove(name)
    }

    pub fn queue_task(&mut self, task: impl ScheduledTask + 'static) {
        self.scheduler.push(Box::new(task));
    }

    /// Register a listener; relative expirations start now.
    pub fn add_listener(&mut self, listener: Listener) -> Result<(), ConfigError> {
        self.listeners.add(listener, self.clock.now_ms())
    }

    pub fn remove_listener(&mut self, name: &str) -> bool {
        self.listeners.remove(name)
    }

    /// Load a plugin, running its load hook. Plugins run in load order.
    pub fn load_plugin(&mut self, plugin: impl Plugin + 'static) -> Result<(), ConfigError> {
        let mut ctx = PluginContext::new(self.odometry.as_mut(), self.clock.now_ms(), self.ticks);
        self.plugins.load(Box::new(plugin), &mut ctx)
    }

    pub fn unload_plugin(&mut self, name: &str) -> bool {
        self.plugins.unload(name).is_some()
    }

    /// Run `callback` at the end of the on-tick phase of every tick.
    pub fn on_tick(&mut self, callback: impl FnMut(&TickContext) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Corrected robot pose.
    pub fn position(&mut self) -> PointXYZ {
        self.odometry.position()
    }

    /// True iff a follower is active or queued.
    pub fn is_active(&self) -> bool {
        self.executor.is_active()
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn config(&self) -> &GatiConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn zones(&self) -> &ZoneProcessor {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut ZoneProcessor {
        &mut self.zones
    }

    pub fn registry(&self) -> &TrajectoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TrajectoryRegistry {
        &mut self.registry
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn listeners(&self) -> &ListenerManager {
        &self.listeners
    }

    /// Recording so far, when `record_movement` is enabled.
    pub fn recording(&self) -> Option<&MovementRecording> {
        self.recorder.as_ref().map(MovementRecorder::recording)
    }

    /// Take the recording so far, leaving the recorder running.
    pub fn take_recording(&mut self) -> Option<MovementRecording> {
        self.recorder.as_mut().map(MovementRecorder::take)
    }

    /// Motion profile, when `profile_motion` is enabled.
    pub fn profile(&self) -> Option<MotionProfile> {
        self.profiler.as_ref().map(MotionProfiler::profile)
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Emergency stop: drop the active and queued followers without
    /// completing them and stop the drive. Returns how many followers were
    /// dropped. Scheduler, listeners and zones are untouched.
    pub fn clear(&mut self) -> usize {
        let mut ctx = PluginContext::new(self.odometry.as_mut(), self.clock.now_ms(), self.ticks);
        self.plugins.pre_clear(&mut ctx);
        let dropped = self.executor.clear();
        self.drive.set_translation(Translation::ZERO);
        self.plugins.on_clear(&mut ctx);
        info!("Cleared motion queue ({} followers dropped)", dropped);
        dropped
    }

    /// End-of-run teardown: clear motion, then drop pending tasks,
    /// listeners, zones, per-tick callbacks and registered trajectories.
    /// Plugins stay loaded.
    pub fn teardown(&mut self) {
        self.clear();
        let tasks = self.scheduler.clear();
        self.listeners.clear();
        self.zones.clear();
        self.callbacks.clear();
        self.registry.reset();
        info!("Engine teardown ({} pending tasks dropped)", tasks);
    }

    // ------------------------------------------------------------------
    // Blocking helpers
    // ------------------------------------------------------------------

    /// Tick while `predicate` holds, or until `timeout` elapses on the
    /// engine clock. The predicate is checked before every tick.
    pub fn tick_while(
        &mut self,
        timeout: Duration,
        mut predicate: impl FnMut(&mut Engine) -> bool,
    ) -> TickOutcome {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let start = self.clock.now_ms();
        let mut ticks = 0;
        loop {
            if !predicate(self) {
                return TickOutcome::Completed { ticks };
            }
            if self.clock.now_ms().saturating_sub(start) >= timeout_ms {
                debug!("tick_while timed out after {:?} ({} ticks)", timeout, ticks);
                return TickOutcome::TimedOut { ticks };
            }
            self.paced_tick();
            ticks += 1;
        }
    }

    /// Tick until no follower is active or queued.
    pub fn tick_until_idle(&mut self, timeout: Duration) -> TickOutcome {
        self.tick_while(timeout, |engine| engine.is_active())
    }

    /// Tick until `duration` has elapsed on the engine clock.
    pub fn tick_for(&mut self, duration: Duration) -> TickOutcome {
        let ticks = self.tick_while(duration, |_| true).ticks();
        TickOutcome::Completed { ticks }
    }

    /// Block without ticking. Nothing moves while waiting.
    pub fn wait(&self, duration: Duration) {
        wait::wait(duration);
    }

    fn paced_tick(&mut self) {
        let interval = self.config.engine.tick_interval_ms;
        if interval == 0 {
            self.tick();
            return;
        }
        let started = Instant::now();
        self.tick();
        if let Some(rest) = Duration::from_millis(interval).checked_sub(started.elapsed()) {
            wait::wait(rest);
        }
    }
}

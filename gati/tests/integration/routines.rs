//! Full routines run against the simulated robot.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gati::plugins::{PoseLock, StatTracker};
use gati::recording::MovementRecording;
use gati::{
    Circle, ConfigError, GatiConfig, GatiError, PointXY, PointXYZ, Rectangle, Task, Zone,
};

use super::{Rig, TICK_MS, counter};

const TIMEOUT: Duration = Duration::from_secs(10);

fn assert_near(pose: PointXYZ, target: PointXYZ, tolerance: f64, angle_tolerance: f64) {
    assert!(
        pose.is_close(target, tolerance, angle_tolerance),
        "{} is not within ({}, {}°) of {}",
        pose,
        tolerance,
        angle_tolerance,
        target
    );
}

#[test]
fn test_go_to_reaches_target_and_stops() {
    let mut rig = Rig::new();
    let target = PointXYZ::new(10.0, 10.0, 90.0);
    rig.engine.go_to(target).unwrap();

    let outcome = rig.engine.tick_until_idle(TIMEOUT);
    assert!(!outcome.timed_out());
    assert_near(rig.engine.position(), target, 1.0, 5.0);
    assert!(rig.robot.last_translation().is_zero());
}

#[test]
fn test_spline_route_reaches_end() {
    let mut rig = Rig::new();
    let spline = rig
        .engine
        .spline_builder()
        .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.6)
        .add_point(PointXYZ::new(10.0, 3.0, 0.0), 0.6)
        .add_point(PointXYZ::new(20.0, 0.0, 0.0), 0.4)
        .step(1.0)
        .build()
        .unwrap();
    rig.engine.follow_trajectory(spline);

    assert!(!rig.engine.tick_until_idle(TIMEOUT).timed_out());
    assert_near(rig.engine.position(), PointXYZ::new(20.0, 0.0, 0.0), 1.0, 5.0);
}

#[test]
fn test_task_between_motions_holds_position() {
    let mut rig = Rig::new();
    let finished = Rc::new(Cell::new(0));
    let f = finished.clone();

    rig.engine.go_to(PointXYZ::new(5.0, 0.0, 0.0)).unwrap();
    let task = rig
        .engine
        .task_builder()
        .min_ms(100)
        .on_finish(move || f.set(f.get() + 1))
        .build()
        .unwrap();
    rig.engine.follow_trajectory(task);
    rig.engine.go_to(PointXYZ::new(5.0, 5.0, 0.0)).unwrap();

    // Run until the task is the active follower
    rig.engine.tick_while(TIMEOUT, |e| {
        e.executor()
            .current()
            .is_none_or(|info| !info.label.starts_with("task"))
    });
    let held = rig.robot.pose();
    let start = rig.clock_ms();
    rig.engine.tick_while(TIMEOUT, |e| {
        e.executor()
            .current()
            .is_some_and(|info| info.label.starts_with("task"))
    });
    assert!(rig.clock_ms() - start >= 100);
    assert_eq!(finished.get(), 1);
    assert!(rig.robot.pose().distance(held) < 1e-9);

    assert!(!rig.engine.tick_until_idle(TIMEOUT).timed_out());
    assert_near(rig.engine.position(), PointXYZ::new(5.0, 5.0, 0.0), 1.0, 5.0);
}

#[test]
fn test_named_routine_with_suggestions() {
    let mut rig = Rig::new();
    for (name, x) in [("score_high", 4.0), ("score_low", 2.0), ("park", 0.0)] {
        let t = rig
            .engine
            .point_builder(PointXYZ::new(x, 0.0, 0.0))
            .build()
            .unwrap();
        rig.engine.add_trajectory("auto", name, t).unwrap();
    }
    let dup = rig.engine.point_builder(PointXYZ::ZERO).build().unwrap();
    assert_eq!(
        rig.engine.add_trajectory("other", "park", dup).unwrap_err(),
        ConfigError::DuplicateName("park".into())
    );

    let err: GatiError = rig.engine.follow_named("scor_high").unwrap_err().into();
    assert!(err.is_recoverable());
    assert_eq!(err.suggestions()[0], "score_high");

    assert_eq!(rig.engine.follow_group("auto").unwrap().len(), 3);
    assert!(!rig.engine.tick_until_idle(TIMEOUT).timed_out());
    assert_near(rig.engine.position(), PointXYZ::ZERO, 1.0, 5.0);

    // Names can be followed again after a run
    rig.engine.follow_named("score_high").unwrap();
    assert!(!rig.engine.tick_until_idle(TIMEOUT).timed_out());
    assert_near(rig.engine.position(), PointXYZ::new(4.0, 0.0, 0.0), 1.0, 5.0);
}

#[test]
fn test_pose_lock_corrects_drift() {
    let mut rig = Rig::at(PointXYZ::new(1.5, -0.5, 3.0));
    let trigger = Rc::new(Cell::new(false));
    let t = trigger.clone();
    let lock = PoseLock::new("start_line", PointXYZ::ZERO, move |_| t.get());
    rig.engine.load_plugin(lock).unwrap();

    rig.run(2);
    assert_near(rig.engine.position(), PointXYZ::new(1.5, -0.5, 3.0), 1e-9, 1e-9);

    trigger.set(true);
    rig.run(1);
    assert_near(rig.engine.position(), PointXYZ::ZERO, 1e-9, 1e-9);
    // The true pose is untouched
    assert_near(rig.robot.pose(), PointXYZ::new(1.5, -0.5, 3.0), 1e-9, 1e-9);
}

#[test]
fn test_stats_and_zone_events_during_motion() {
    let mut rig = Rig::new();
    let stats = StatTracker::new();
    let handle = stats.handle();
    rig.engine.load_plugin(stats).unwrap();

    let (enters, on_enter) = counter();
    rig.engine
        .add_zone(
            "midfield",
            Zone::builder(Circle::new(PointXY::new(5.0, 0.0), 1.0).unwrap())
                .on_enter(on_enter)
                .build(),
        )
        .unwrap();
    rig.engine
        .add_zone(
            "wall",
            Zone::builder(Rectangle::new(PointXY::new(0.0, 4.0), PointXY::new(10.0, 5.0)).unwrap())
                .solid(true)
                .build(),
        )
        .unwrap();

    rig.engine.go_to(PointXYZ::new(10.0, 0.0, 0.0)).unwrap();
    rig.engine.go_to(PointXYZ::new(0.0, 0.0, 0.0)).unwrap();
    let outcome = rig.engine.tick_until_idle(TIMEOUT);
    assert!(!outcome.timed_out());

    let s = handle.snapshot();
    assert_eq!(s.ticks, outcome.ticks());
    assert_eq!(s.followers_started, 2);
    assert_eq!(s.followers_finished, 2);
    assert_eq!(s.zone_enters, 2);
    assert_eq!(s.zone_exits, 2);
    assert_eq!(enters.get(), 2);

    assert!(rig.engine.zones().is_blocked(PointXY::new(5.0, 4.5)));
    assert!(rig.engine.zones().is_path_blocked(PointXY::new(5.0, 0.0), PointXY::new(5.0, 10.0)));
    assert!(!rig.engine.zones().is_path_blocked(PointXY::ZERO, PointXY::new(10.0, 0.0)));
}

#[test]
fn test_scheduled_tasks_and_clear() {
    let mut rig = Rig::new();
    let (ran, action) = counter();
    rig.engine.queue_task(Task::repeating(3, action).every(50));
    rig.engine.go_to(PointXYZ::new(100.0, 0.0, 0.0)).unwrap();

    rig.engine.tick_for(Duration::from_millis(500));
    assert_eq!(ran.get(), 3);
    assert!(rig.engine.scheduler().is_empty());

    assert_eq!(rig.engine.clear(), 1);
    assert!(!rig.engine.is_active());
    let stopped = rig.robot.pose();
    rig.run(5);
    assert!(rig.robot.pose().distance(stopped) < 1e-9);
}

#[test]
fn test_recording_from_config() {
    let mut config = GatiConfig::default();
    config.engine.record_movement = true;
    config.engine.profile_motion = true;
    config.engine.record_interval_ms = 5 * TICK_MS;
    let mut rig = Rig::with_config(PointXYZ::ZERO, config);

    rig.engine.go_to(PointXYZ::new(10.0, 0.0, 0.0)).unwrap();
    let ticks = rig.engine.tick_until_idle(TIMEOUT).ticks();

    let recording = rig.engine.take_recording().unwrap();
    assert_eq!(recording.len() as u64, ticks.div_ceil(5));
    assert!(recording.distance() > 8.0);

    let profile = rig.engine.profile().unwrap();
    assert!(profile.max_speed > 0.0);
    assert!(profile.distance > 8.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("route.toml");
    recording.save(&path).unwrap();
    assert_eq!(MovementRecording::load(&path).unwrap(), recording);
}

impl Rig {
    fn clock_ms(&self) -> u64 {
        use gati::Clock;
        self.clock.now_ms()
    }
}

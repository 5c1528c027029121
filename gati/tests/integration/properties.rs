//! Engine-level behavioral guarantees.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use gati::geometry::Angle;
use gati::{
    Circle, Listener, PointTrajectory, PointXY, PointXYZ, SplineTrajectory, Trajectory,
    Translation, Zone,
};

use super::{Rig, counter};

#[test]
fn test_completion_latch_survives_leaving_tolerance() {
    let mut point = PointTrajectory::new(PointXYZ::new(10.0, 10.0, 0.0), 0.5, 1.0, 5.0).unwrap();
    assert!(point.is_done(PointXYZ::new(10.0, 10.0, 0.0)));
    assert!(point.is_done(PointXYZ::new(-500.0, 300.0, 180.0)));

    let mut spline = SplineTrajectory::builder()
        .add_point(PointXYZ::new(0.0, 0.0, 0.0), 0.5)
        .add_point(PointXYZ::new(10.0, 4.0, 0.0), 0.5)
        .add_point(PointXYZ::new(20.0, 0.0, 0.0), 0.5)
        .tolerance(1.0)
        .angle_tolerance_deg(5.0)
        .build()
        .unwrap();
    assert!(!spline.is_done(PointXYZ::ZERO));
    assert!(spline.is_done(PointXYZ::new(20.0, 0.0, 0.0)));
    assert!(spline.is_done(PointXYZ::ZERO));
}

#[test]
fn test_point_trajectory_tolerances() {
    let mut t = PointTrajectory::new(PointXYZ::new(10.0, 10.0, 0.0), 0.5, 1.0, 5.0).unwrap();
    assert!(!t.is_done(PointXYZ::new(8.0, 10.0, 0.0)));
    assert!(t.is_done(PointXYZ::new(9.5, 10.0, 2.0)));
}

#[test]
fn test_zone_crossing_fires_once_each() {
    let mut rig = Rig::at(PointXYZ::new(10.0, 0.0, 0.0));
    let (enters, on_enter) = counter();
    let (inside, while_inside) = counter();
    let (exits, on_exit) = counter();
    let zone = Zone::builder(Circle::new(PointXY::ZERO, 5.0).unwrap())
        .on_enter(on_enter)
        .while_inside(while_inside)
        .on_exit(on_exit)
        .build();
    rig.engine.add_zone("center", zone).unwrap();

    for pose in [
        PointXYZ::new(10.0, 0.0, 0.0),
        PointXYZ::new(0.0, 0.0, 0.0),
        PointXYZ::new(10.0, 0.0, 0.0),
    ] {
        rig.robot.set_pose(pose);
        rig.engine.tick();
    }

    assert_eq!(enters.get(), 1);
    assert_eq!(inside.get(), 1);
    assert_eq!(exits.get(), 1);
    assert!(!rig.engine.zones().is_occupied("center"));
}

#[test]
fn test_zone_tunnel_through_still_reports_crossing() {
    let mut rig = Rig::at(PointXYZ::new(-10.0, 0.0, 0.0));
    let (enters, on_enter) = counter();
    let (exits, on_exit) = counter();
    let zone = Zone::builder(Circle::new(PointXY::ZERO, 1.0).unwrap())
        .on_enter(on_enter)
        .on_exit(on_exit)
        .build();
    rig.engine.add_zone("post", zone).unwrap();

    rig.engine.tick();
    rig.robot.set_pose(PointXYZ::new(10.0, 0.0, 0.0));
    rig.engine.tick();

    assert_eq!(enters.get(), 1);
    assert_eq!(exits.get(), 1);
}

#[test]
fn test_executor_activity() {
    let mut rig = Rig::new();
    assert!(!rig.engine.is_active());

    let target = PointTrajectory::new(PointXYZ::new(3.0, 0.0, 0.0), 0.5, 1.0, 5.0).unwrap();
    rig.engine.follow_trajectory(target);
    assert!(rig.engine.is_active());

    let outcome = rig.engine.tick_until_idle(std::time::Duration::from_secs(10));
    assert!(!outcome.timed_out());
    assert!(!rig.engine.is_active());
}

#[test]
fn test_listener_execution_cap() {
    let mut rig = Rig::new();
    let (fired, action) = counter();
    rig.engine
        .add_listener(Listener::new(|_| true, action).max_executions(1))
        .unwrap();

    rig.run(1000);
    assert_eq!(fired.get(), 1);
    assert!(rig.engine.listeners().is_empty());
}

#[test]
fn test_translation_round_trip() {
    let original = Translation::new(0.3, -0.7, 0.1);
    for deg in [0.0, 17.0, 90.0, 135.5, 180.0, 271.0, 359.9] {
        let heading = Angle::from_deg(deg);
        let back = original.to_relative(heading).to_absolute(heading);
        assert_abs_diff_eq!(back.vx, original.vx, epsilon = 1e-6);
        assert_abs_diff_eq!(back.vy, original.vy, epsilon = 1e-6);
        assert_abs_diff_eq!(back.vz, original.vz, epsilon = 1e-6);
    }
}

type StepLog = Vec<(&'static str, u64)>;

/// Trajectory that records which tick queried it and finishes on its
/// third completion check.
struct LoggedStep {
    name: &'static str,
    tick: Rc<Cell<u64>>,
    log: Rc<RefCell<StepLog>>,
    checks: u32,
    done: bool,
}

impl LoggedStep {
    fn new(name: &'static str, tick: &Rc<Cell<u64>>, log: &Rc<RefCell<StepLog>>) -> Self {
        Self {
            name,
            tick: tick.clone(),
            log: log.clone(),
            checks: 0,
            done: false,
        }
    }
}

impl Trajectory for LoggedStep {
    fn next_marker(&mut self, current: PointXYZ) -> PointXYZ {
        current
    }

    fn is_done(&mut self, _current: PointXYZ) -> bool {
        self.log.borrow_mut().push((self.name, self.tick.get()));
        self.checks += 1;
        self.done |= self.checks >= 3;
        self.done
    }

    fn speed(&mut self, _current: PointXYZ) -> f64 {
        0.0
    }
}

#[test]
fn test_sequential_ordering() {
    let mut rig = Rig::new();
    let tick = Rc::new(Cell::new(0));
    let log = Rc::new(RefCell::new(Vec::new()));
    rig.engine.follow_trajectories(vec![
        Box::new(LoggedStep::new("t1", &tick, &log)),
        Box::new(LoggedStep::new("t2", &tick, &log)),
    ]);

    for n in 1..=10 {
        tick.set(n);
        rig.engine.tick();
    }

    let log = log.borrow();
    let t1_done = log
        .iter()
        .filter(|(name, _)| *name == "t1")
        .map(|(_, t)| *t)
        .max()
        .unwrap();
    let t2_first = log
        .iter()
        .filter(|(name, _)| *name == "t2")
        .map(|(_, t)| *t)
        .min()
        .unwrap();
    assert_eq!(t1_done, 3);
    assert!(t2_first > t1_done);
    assert!(!rig.engine.is_active());
}

//! Drift correction against known reference poses.

use tracing::info;

use crate::context::PluginContext;
use crate::geometry::PointXYZ;
use crate::plugin::Plugin;

type LockCondition = Box<dyn FnMut(&PluginContext<'_>) -> bool>;

/// Re-anchors odometry on a known pose.
///
/// On the tick the condition becomes true (rising edge), during pre-tick,
/// the odometry offset is chosen so the corrected pose equals `known`.
/// Typical conditions are a limit switch closing or a vision fix arriving.
pub struct PoseLock {
    name: String,
    known: PointXYZ,
    condition: LockCondition,
    was_met: bool,
    locks: u64,
}

impl PoseLock {
    pub fn new(
        name: impl Into<String>,
        known: PointXYZ,
        condition: impl FnMut(&PluginContext<'_>) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            known,
            condition: Box::new(condition),
            was_met: false,
            locks: 0,
        }
    }

    /// How many times the pose has been re-anchored.
    pub fn locks(&self) -> u64 {
        self.locks
    }
}

impl Plugin for PoseLock {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_tick(&mut self, ctx: &mut PluginContext<'_>) {
        let met = (self.condition)(ctx);
        if met && !self.was_met {
            let before = ctx.pose;
            ctx.odometry.offset_so_position_is(self.known);
            let after = ctx.refresh_pose();
            self.locks += 1;
            info!("{}: pose locked {} -> {}", self.name, before, after);
        }
        self.was_met = met;
    }
}

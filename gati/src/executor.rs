//! Sequential follower execution.
//!
//! At most one follower is active. Each tick the executor advances the
//! active follower and forwards its command to the drive. When the active
//! follower finishes, the slot is cleared and the next queued follower is
//! promoted on the following tick, then ticked within that same cycle.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::context::PluginContext;
use crate::follower::{Follower, FollowerOutput};
use crate::geometry::{PointXYZ, Translation};
use crate::plugin::{FollowerInfo, PluginManager};
use crate::robot::Drive;

struct Slot {
    info: FollowerInfo,
    follower: Box<dyn Follower>,
}

/// What the executor did during one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutorStep {
    /// Nothing active or queued; the drive was not touched.
    Idle,
    /// The active follower emitted this (clamped) translation.
    Commanded(Translation),
    /// The active follower finished this tick.
    Finished,
}

/// One-at-a-time queue of followers.
pub struct Executor {
    queue: VecDeque<Slot>,
    active: Option<Slot>,
    next_id: u64,
    stop_on_finish: bool,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Executor {
    /// Create an executor. With `stop_on_finish`, a zero translation is sent
    /// to the drive on the tick a follower finishes.
    pub fn new(stop_on_finish: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
            next_id: 0,
            stop_on_finish,
        }
    }

    /// Append a follower; returns its sequence id.
    pub fn push(&mut self, follower: Box<dyn Follower>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let info = FollowerInfo {
            id,
            label: follower.describe(),
        };
        debug!("queued follower #{} ({})", id, info.label);
        self.queue.push_back(Slot { info, follower });
        id
    }

    /// True iff a follower is active or queued.
    pub fn is_active(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// The active follower, if any.
    pub fn current(&self) -> Option<&FollowerInfo> {
        self.active.as_ref().map(|slot| &slot.info)
    }

    /// Number of followers waiting behind the active one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Drop the active follower and everything queued without completing
    /// them. Returns how many followers were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len() + usize::from(self.active.is_some());
        self.queue.clear();
        self.active = None;
        dropped
    }

    /// Advance one tick.
    pub fn tick(
        &mut self,
        pose: PointXYZ,
        drive: &mut dyn Drive,
        plugins: &mut PluginManager,
        ctx: &mut PluginContext<'_>,
    ) -> ExecutorStep {
        if self.active.is_none() {
            let Some(mut next) = self.queue.pop_front() else {
                return ExecutorStep::Idle;
            };
            info!("Starting follower #{} ({})", next.info.id, next.info.label);
            next.follower.start();
            plugins.follower_start(ctx, &next.info);
            self.active = Some(next);
        }

        let Some(slot) = self.active.as_mut() else {
            return ExecutorStep::Idle;
        };

        match slot.follower.tick(pose) {
            FollowerOutput::Running(translation) => {
                if !translation.is_finite() {
                    warn!(
                        "follower #{} emitted non-finite translation {}, zeroing",
                        slot.info.id, translation
                    );
                }
                let clamped = translation.clamped();
                drive.set_translation(clamped);
                ExecutorStep::Commanded(clamped)
            }
            FollowerOutput::Finished => {
                if self.stop_on_finish {
                    drive.set_translation(Translation::ZERO);
                }
                if let Some(done) = self.active.take() {
                    info!("Follower #{} finished ({})", done.info.id, done.info.label);
                    plugins.follower_finish(ctx, &done.info);
                }
                ExecutorStep::Finished
            }
        }
    }
}

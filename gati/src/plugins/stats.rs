//! Tick and event statistics.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::PluginContext;
use crate::plugin::{FollowerInfo, Plugin};

/// Window over which ticks per second is measured.
const RATE_WINDOW_MS: u64 = 1000;

/// Counters collected by [`StatTracker`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub ticks: u64,
    /// Ticks per second over the last complete window.
    pub ticks_per_second: f64,
    pub followers_started: u64,
    pub followers_finished: u64,
    pub zone_enters: u64,
    pub zone_exits: u64,
    pub clears: u64,
}

/// Read handle to a tracker's counters. Clones share the same counters.
#[derive(Clone, Debug, Default)]
pub struct StatHandle {
    inner: Arc<Mutex<Stats>>,
}

impl StatHandle {
    /// Copy of the current counters.
    pub fn snapshot(&self) -> Stats {
        self.inner.lock().clone()
    }
}

/// Counts ticks, follower and zone events, and clears.
pub struct StatTracker {
    stats: StatHandle,
    window_start: Option<u64>,
    window_ticks: u64,
}

impl StatTracker {
    pub const NAME: &'static str = "stats";

    pub fn new() -> Self {
        Self {
            stats: StatHandle::default(),
            window_start: None,
            window_ticks: 0,
        }
    }

    /// Handle that stays valid after the tracker is loaded into an engine.
    pub fn handle(&self) -> StatHandle {
        self.stats.clone()
    }

    fn update(&self, f: impl FnOnce(&mut Stats)) {
        f(&mut self.stats.inner.lock());
    }
}

impl Default for StatTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for StatTracker {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_tick(&mut self, ctx: &mut PluginContext<'_>) {
        let start = *self.window_start.get_or_insert(ctx.now_ms);
        self.window_ticks += 1;
        let elapsed = ctx.now_ms.saturating_sub(start);

        let rate = if elapsed >= RATE_WINDOW_MS {
            let rate = self.window_ticks as f64 * 1000.0 / elapsed as f64;
            self.window_start = Some(ctx.now_ms);
            self.window_ticks = 0;
            Some(rate)
        } else {
            None
        };

        self.update(|s| {
            s.ticks += 1;
            if let Some(rate) = rate {
                s.ticks_per_second = rate;
            }
        });
    }

    fn on_clear(&mut self, _ctx: &mut PluginContext<'_>) {
        self.update(|s| s.clears += 1);
    }

    fn on_zone_enter(&mut self, _ctx: &mut PluginContext<'_>, _zone: &str) {
        self.update(|s| s.zone_enters += 1);
    }

    fn on_zone_exit(&mut self, _ctx: &mut PluginContext<'_>, _zone: &str) {
        self.update(|s| s.zone_exits += 1);
    }

    fn on_follower_start(&mut self, _ctx: &mut PluginContext<'_>, _follower: &FollowerInfo) {
        self.update(|s| s.followers_started += 1);
    }

    fn on_follower_finish(&mut self, _ctx: &mut PluginContext<'_>, _follower: &FollowerInfo) {
        self.update(|s| s.followers_finished += 1);
    }
}

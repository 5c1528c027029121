//! Plugin hooks.
//!
//! A [`Plugin`] overrides any subset of the engine's hook points; every hook
//! defaults to a no-op. The [`PluginManager`] invokes plugins in
//! registration order and does no work at all when none are loaded.

use tracing::info;

use crate::context::PluginContext;
use crate::error::ConfigError;

/// Identity of a follower passed to follower hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowerInfo {
    /// Sequence number assigned by the executor when queued.
    pub id: u64,
    /// Log label (the trajectory description).
    pub label: String,
}

/// Cross-cutting behavior attached to the tick loop.
pub trait Plugin {
    /// Unique name used for registration and logs.
    fn name(&self) -> &str;

    /// Called once when the plugin is loaded.
    fn on_load(&mut self, _ctx: &mut PluginContext<'_>) {}

    /// First thing every tick, before the scheduler and zones.
    fn pre_tick(&mut self, _ctx: &mut PluginContext<'_>) {}

    /// After the executor has emitted this tick's command.
    fn on_tick(&mut self, _ctx: &mut PluginContext<'_>) {}

    /// Last thing every tick.
    fn post_tick(&mut self, _ctx: &mut PluginContext<'_>) {}

    /// Before the engine clears its motion queue.
    fn pre_clear(&mut self, _ctx: &mut PluginContext<'_>) {}

    /// After the engine has cleared its motion queue.
    fn on_clear(&mut self, _ctx: &mut PluginContext<'_>) {}

    fn on_zone_enter(&mut self, _ctx: &mut PluginContext<'_>, _zone: &str) {}

    fn on_zone_exit(&mut self, _ctx: &mut PluginContext<'_>, _zone: &str) {}

    fn on_zone_while_inside(&mut self, _ctx: &mut PluginContext<'_>, _zone: &str) {}

    fn on_follower_start(&mut self, _ctx: &mut PluginContext<'_>, _follower: &FollowerInfo) {}

    fn on_follower_finish(&mut self, _ctx: &mut PluginContext<'_>, _follower: &FollowerInfo) {}
}

/// Ordered set of loaded plugins.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a plugin and run its load hook. Names must be unique.
    pub fn load(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        ctx: &mut PluginContext<'_>,
    ) -> Result<(), ConfigError> {
        if self.contains(plugin.name()) {
            return Err(ConfigError::DuplicateName(plugin.name().to_string()));
        }
        info!("Loading plugin '{}'", plugin.name());
        plugin.on_load(ctx);
        self.plugins.push(plugin);
        Ok(())
    }

    /// Remove a plugin by name; returns it if it was loaded.
    pub fn unload(&mut self, name: &str) -> Option<Box<dyn Plugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        info!("Unloading plugin '{}'", name);
        Some(self.plugins.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Plugin names in invocation order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    #[inline]
    fn dispatch(
        &mut self,
        ctx: &mut PluginContext<'_>,
        mut hook: impl FnMut(&mut dyn Plugin, &mut PluginContext<'_>),
    ) {
        if self.plugins.is_empty() {
            return;
        }
        for plugin in &mut self.plugins {
            hook(plugin.as_mut(), ctx);
        }
    }

    pub fn pre_tick(&mut self, ctx: &mut PluginContext<'_>) {
        self.dispatch(ctx, |p, c| p.pre_tick(c));
    }

    pub fn on_tick(&mut self, ctx: &mut PluginContext<'_>) {
        self.dispatch(ctx, |p, c| p.on_tick(c));
    }

    pub fn post_tick(&mut self, ctx: &mut PluginContext<'_>) {
        self.dispatch(ctx, |p, c| p.post_tick(c));
    }

    pub fn pre_clear(&mut self, ctx: &mut PluginContext<'_>) {
        self.dispatch(ctx, |p, c| p.pre_clear(c));
    }

    pub fn on_clear(&mut self, ctx: &mut PluginContext<'_>) {
        self.dispatch(ctx, |p, c| p.on_clear(c));
    }

    pub fn zone_enter(&mut self, ctx: &mut PluginContext<'_>, zone: &str) {
        self.dispatch(ctx, |p, c| p.on_zone_enter(c, zone));
    }

    pub fn zone_exit(&mut self, ctx: &mut PluginContext<'_>, zone: &str) {
        self.dispatch(ctx, |p, c| p.on_zone_exit(c, zone));
    }

    pub fn zone_while_inside(&mut self, ctx: &mut PluginContext<'_>, zone: &str) {
        self.dispatch(ctx, |p, c| p.on_zone_while_inside(c, zone));
    }

    pub fn follower_start(&mut self, ctx: &mut PluginContext<'_>, follower: &FollowerInfo) {
        self.dispatch(ctx, |p, c| p.on_follower_start(c, follower));
    }

    pub fn follower_finish(&mut self, ctx: &mut PluginContext<'_>, follower: &FollowerInfo) {
        self.dispatch(ctx, |p, c| p.on_follower_finish(c, follower));
    }
}

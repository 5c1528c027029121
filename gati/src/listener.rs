//! Condition-to-action bindings with rate limits.
//!
//! Listeners are evaluated highest priority first. Each pass:
//!
//! 1. Expired and exhausted listeners are pruned.
//! 2. Every listener's conditions are evaluated, so edge modes track the
//!    level on every tick.
//! 3. If its [`ListenerMode`] is satisfied and it is not cooling down from
//!    its last firing, the action runs.

use tracing::debug;

use crate::context::TickContext;
use crate::error::ConfigError;

type Condition = Box<dyn FnMut(&TickContext) -> bool>;
type Action = Box<dyn FnMut(&TickContext)>;

/// When a listener fires relative to its conditions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListenerMode {
    /// Every evaluation where all conditions hold.
    #[default]
    WhileMet,
    /// Every evaluation where at least one condition fails.
    WhileNotMet,
    /// Rising edge: conditions hold now but did not at the previous
    /// evaluation. The first evaluation counts as a rising edge.
    NewlyMet,
    /// Falling edge: conditions held at the previous evaluation but do not
    /// now.
    NewlyNotMet,
}

/// A condition-gated action.
pub struct Listener {
    name: Option<String>,
    conditions: Vec<Condition>,
    action: Action,
    mode: ListenerMode,
    priority: i32,
    cooldown_ms: u64,
    expires_at: Option<u64>,
    lifetime_ms: Option<u64>,
    remaining: Option<u32>,
    last_fired: Option<u64>,
    previous: Option<bool>,
    fired: u64,
}

impl Listener {
    /// Run `action` whenever `condition` holds.
    pub fn new(
        condition: impl FnMut(&TickContext) -> bool + 'static,
        action: impl FnMut(&TickContext) + 'static,
    ) -> Self {
        Self {
            name: None,
            conditions: vec![Box::new(condition)],
            action: Box::new(action),
            mode: ListenerMode::default(),
            priority: 0,
            cooldown_ms: 0,
            expires_at: None,
            lifetime_ms: None,
            remaining: None,
            last_fired: None,
            previous: None,
            fired: 0,
        }
    }

    /// Add a condition; all conditions must hold.
    pub fn and(mut self, condition: impl FnMut(&TickContext) -> bool + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    /// Name the listener so it can be removed later.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mode(mut self, mode: ListenerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Higher priorities are evaluated first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Minimum time between firings.
    pub fn cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    /// Absolute clock time after which the listener is pruned.
    pub fn expires_at(mut self, ms: u64) -> Self {
        self.expires_at = Some(ms);
        self
    }

    /// Lifetime measured from registration.
    pub fn expires_after(mut self, ms: u64) -> Self {
        self.lifetime_ms = Some(ms);
        self
    }

    /// Maximum number of firings.
    pub fn max_executions(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// How many times the action has run.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn is_spent(&self, now_ms: u64) -> bool {
        self.remaining == Some(0) || self.expires_at.is_some_and(|at| now_ms > at)
    }

    fn is_cooling_down(&self, now_ms: u64) -> bool {
        self.last_fired
            .is_some_and(|last| now_ms.saturating_sub(last) < self.cooldown_ms)
    }

    fn evaluate(&mut self, ctx: &TickContext) -> bool {
        let met = self.conditions.iter_mut().all(|condition| condition(ctx));
        let previous = self.previous.replace(met);
        match self.mode {
            ListenerMode::WhileMet => met,
            ListenerMode::WhileNotMet => !met,
            ListenerMode::NewlyMet => met && previous != Some(true),
            ListenerMode::NewlyNotMet => !met && previous == Some(true),
        }
    }

    fn fire(&mut self, ctx: &TickContext) {
        (self.action)(ctx);
        self.fired += 1;
        self.last_fired = Some(ctx.now_ms);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Priority-ordered registry of listeners.
#[derive(Default)]
pub struct ListenerManager {
    listeners: Vec<Listener>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Named listeners must have unique names.
    /// Relative lifetimes are anchored at `now_ms`.
    pub fn add(&mut self, mut listener: Listener, now_ms: u64) -> Result<(), ConfigError> {
        if let Some(name) = listener.name()
            && self.contains(name)
        {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        if let Some(lifetime) = listener.lifetime_ms.take() {
            let at = now_ms.saturating_add(lifetime);
            listener.expires_at = Some(listener.expires_at.map_or(at, |e| e.min(at)));
        }
        // Stable: after existing listeners of the same priority
        let index = self
            .listeners
            .partition_point(|l| l.priority >= listener.priority);
        self.listeners.insert(index, listener);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.listeners.iter().any(|l| l.name() == Some(name))
    }

    /// Remove a named listener.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.name() != Some(name));
        before != self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// One evaluation pass.
    pub fn tick(&mut self, ctx: &TickContext) {
        if self.listeners.is_empty() {
            return;
        }
        let now = ctx.now_ms;
        self.listeners.retain(|l| !l.is_spent(now));

        for listener in &mut self.listeners {
            // Evaluated even while cooling down so edge modes see every level
            let triggered = listener.evaluate(ctx);
            if triggered && !listener.is_cooling_down(now) {
                debug!(
                    "listener {} fired at {} ms",
                    listener.name().unwrap_or("<anonymous>"),
                    now
                );
                listener.fire(ctx);
            }
        }
    }
}

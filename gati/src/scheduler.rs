//! Condition-gated task queue ticked once per engine cycle.

use tracing::debug;

use crate::context::TickContext;

/// What a task wants after executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Remove the task.
    Done,
    /// Keep the task queued; it decides when it is ready again.
    Rearm,
}

/// A unit of work owned by the [`Scheduler`].
pub trait ScheduledTask {
    /// Whether the task should execute this tick.
    fn is_ready(&mut self, ctx: &TickContext) -> bool;

    /// Run the task.
    fn execute(&mut self, ctx: &TickContext) -> TaskOutcome;

    fn describe(&self) -> String {
        "task".to_string()
    }
}

type Condition = Box<dyn FnMut(&TickContext) -> bool>;
type Action = Box<dyn FnMut(&TickContext)>;

/// The standard closure-backed task.
///
/// Readiness requires every configured gate: the delay (measured from the
/// first tick the scheduler saw the task, and again after each run) and the
/// condition. `remaining` of `None` repeats forever.
pub struct Task {
    label: String,
    condition: Option<Condition>,
    action: Action,
    interval_ms: Option<u64>,
    due_at: Option<u64>,
    remaining: Option<u32>,
}

impl Task {
    fn with_action(label: &str, action: Action, remaining: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            condition: None,
            action,
            interval_ms: None,
            due_at: None,
            remaining,
        }
    }

    /// Run once, on the next tick.
    pub fn once(action: impl FnMut(&TickContext) + 'static) -> Self {
        Self::with_action("once", Box::new(action), Some(1))
    }

    /// Run once, the first tick `condition` holds.
    pub fn when(
        condition: impl FnMut(&TickContext) -> bool + 'static,
        action: impl FnMut(&TickContext) + 'static,
    ) -> Self {
        Self::once(action).with_condition(condition)
    }

    /// Run once, `delay_ms` after the scheduler first sees the task.
    pub fn after(delay_ms: u64, action: impl FnMut(&TickContext) + 'static) -> Self {
        let mut task = Self::with_action("after", Box::new(action), Some(1));
        task.interval_ms = Some(delay_ms);
        task
    }

    /// Run `times` times, once per ready tick.
    pub fn repeating(times: u32, action: impl FnMut(&TickContext) + 'static) -> Self {
        Self::with_action("repeating", Box::new(action), Some(times))
    }

    /// Run on every ready tick until cleared.
    pub fn forever(action: impl FnMut(&TickContext) + 'static) -> Self {
        Self::with_action("forever", Box::new(action), None)
    }

    /// Add a readiness condition.
    pub fn with_condition(mut self, condition: impl FnMut(&TickContext) -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Wait `interval_ms` before the first run and between runs.
    pub fn every(mut self, interval_ms: u64) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }

    /// Label used in logs.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Runs left, or `None` if unbounded.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}

impl ScheduledTask for Task {
    fn is_ready(&mut self, ctx: &TickContext) -> bool {
        if self.remaining == Some(0) {
            return false;
        }
        if let Some(interval) = self.interval_ms {
            let due = *self.due_at.get_or_insert(ctx.now_ms.saturating_add(interval));
            if ctx.now_ms < due {
                return false;
            }
        }
        self.condition.as_mut().is_none_or(|condition| condition(ctx))
    }

    fn execute(&mut self, ctx: &TickContext) -> TaskOutcome {
        (self.action)(ctx);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                return TaskOutcome::Done;
            }
        }
        if let Some(interval) = self.interval_ms {
            self.due_at = Some(ctx.now_ms.saturating_add(interval));
        }
        TaskOutcome::Rearm
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Queue of pending tasks.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Box<dyn ScheduledTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Box<dyn ScheduledTask>) {
        debug!("scheduled '{}'", task.describe());
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Evaluate every task in queue order, executing the ready ones and
    /// dropping those that report [`TaskOutcome::Done`].
    pub fn tick(&mut self, ctx: &TickContext) {
        if self.tasks.is_empty() {
            return;
        }
        self.tasks.retain_mut(|task| {
            if !task.is_ready(ctx) {
                return true;
            }
            match task.execute(ctx) {
                TaskOutcome::Done => {
                    debug!("task '{}' done", task.describe());
                    false
                }
                TaskOutcome::Rearm => true,
            }
        });
    }

    /// Discard all pending tasks without running them.
    pub fn clear(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        dropped
    }
}

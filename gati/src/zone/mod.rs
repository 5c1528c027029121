//! Named geometric trigger regions.
//!
//! A [`Zone`] pairs a [`Shape`] with enter, exit and while-inside callbacks.
//! The [`ZoneProcessor`] tests the robot position against every zone once
//! per tick and fires the callbacks on boundary crossings.

mod processor;
mod shape;

pub use processor::ZoneProcessor;
pub use shape::{Circle, Polygon, Rectangle, Shape, closest_on_segment, segments_intersect};

use std::fmt;

use crate::context::TickContext;

type ZoneCallback = Box<dyn FnMut(&TickContext)>;

/// A shape with event callbacks.
pub struct Zone {
    shape: Box<dyn Shape>,
    on_enter: Option<ZoneCallback>,
    on_exit: Option<ZoneCallback>,
    while_inside: Option<ZoneCallback>,
    solid: bool,
}

impl Zone {
    /// Zone with no callbacks.
    pub fn new(shape: impl Shape + 'static) -> Self {
        Self::builder(shape).build()
    }

    pub fn builder(shape: impl Shape + 'static) -> ZoneBuilder {
        ZoneBuilder {
            zone: Zone {
                shape: Box::new(shape),
                on_enter: None,
                on_exit: None,
                while_inside: None,
                solid: false,
            },
        }
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    /// Solid zones are obstacles the robot should not be driven into.
    pub fn is_solid(&self) -> bool {
        self.solid
    }

    /// Inflate the shape in place by a safety margin.
    pub fn grow_by(&mut self, radius: f64) {
        self.shape = self.shape.grow_by(radius);
    }

    pub(crate) fn fire_enter(&mut self, ctx: &TickContext) {
        if let Some(f) = self.on_enter.as_mut() {
            f(ctx);
        }
    }

    pub(crate) fn fire_exit(&mut self, ctx: &TickContext) {
        if let Some(f) = self.on_exit.as_mut() {
            f(ctx);
        }
    }

    pub(crate) fn fire_while_inside(&mut self, ctx: &TickContext) {
        if let Some(f) = self.while_inside.as_mut() {
            f(ctx);
        }
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("shape", &self.shape)
            .field("solid", &self.solid)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Zone`].
pub struct ZoneBuilder {
    zone: Zone,
}

impl ZoneBuilder {
    pub fn on_enter(mut self, f: impl FnMut(&TickContext) + 'static) -> Self {
        self.zone.on_enter = Some(Box::new(f));
        self
    }

    pub fn on_exit(mut self, f: impl FnMut(&TickContext) + 'static) -> Self {
        self.zone.on_exit = Some(Box::new(f));
        self
    }

    pub fn while_inside(mut self, f: impl FnMut(&TickContext) + 'static) -> Self {
        self.zone.while_inside = Some(Box::new(f));
        self
    }

    pub fn solid(mut self, solid: bool) -> Self {
        self.zone.solid = solid;
        self
    }

    pub fn build(self) -> Zone {
        self.zone
    }
}

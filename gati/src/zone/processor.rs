//! Per-tick zone occupancy tracking.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::Zone;
use crate::context::{PluginContext, TickContext};
use crate::error::ConfigError;
use crate::geometry::PointXY;
use crate::plugin::PluginManager;

/// Tracks which zones the robot occupies and fires transition events.
///
/// Per zone and tick:
///
/// - outside -> inside: `on_enter`, then `while_inside`
/// - inside -> inside: `while_inside`
/// - inside -> outside: `on_exit`
/// - outside -> outside, but the straight path since the previous tick
///   crossed the zone (swept detection): `on_enter` then `on_exit`
///
/// Zones are visited in name order.
pub struct ZoneProcessor {
    zones: BTreeMap<String, Zone>,
    occupied: BTreeSet<String>,
    previous: Option<PointXY>,
    swept_detection: bool,
}

impl Default for ZoneProcessor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ZoneProcessor {
    pub fn new(swept_detection: bool) -> Self {
        Self {
            zones: BTreeMap::new(),
            occupied: BTreeSet::new(),
            previous: None,
            swept_detection,
        }
    }

    /// Register a zone. Names must be unique.
    pub fn add(&mut self, name: impl Into<String>, zone: Zone) -> Result<(), ConfigError> {
        let name = name.into();
        if self.zones.contains_key(&name) {
            return Err(ConfigError::DuplicateName(name));
        }
        debug!("zone '{}' added: {:?}", name, zone);
        self.zones.insert(name, zone);
        Ok(())
    }

    /// Remove a zone. No exit event fires.
    pub fn remove(&mut self, name: &str) -> Option<Zone> {
        self.occupied.remove(name);
        self.zones.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.zones.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Whether the robot was inside `name` as of the last update.
    pub fn is_occupied(&self, name: &str) -> bool {
        self.occupied.contains(name)
    }

    /// Names of zones occupied as of the last update.
    pub fn occupied(&self) -> impl Iterator<Item = &str> {
        self.occupied.iter().map(String::as_str)
    }

    /// Whether `point` lies inside any solid zone.
    pub fn is_blocked(&self, point: PointXY) -> bool {
        self.zones
            .values()
            .any(|zone| zone.is_solid() && zone.shape().contains(point))
    }

    /// Whether the segment `a -> b` touches any solid zone.
    pub fn is_path_blocked(&self, a: PointXY, b: PointXY) -> bool {
        self.zones
            .values()
            .any(|zone| zone.is_solid() && zone.shape().intersects_segment(a, b))
    }

    /// Remove every zone and forget occupancy.
    pub fn clear(&mut self) {
        self.zones.clear();
        self.occupied.clear();
        self.previous = None;
    }

    /// Test the current pose against every zone and fire events.
    pub fn update(
        &mut self,
        tick: &TickContext,
        plugins: &mut PluginManager,
        ctx: &mut PluginContext<'_>,
    ) {
        let point = tick.pose.xy();
        let previous = self.previous.replace(point);

        for (name, zone) in self.zones.iter_mut() {
            let inside = zone.shape().contains(point);
            let was_inside = self.occupied.contains(name);

            match (was_inside, inside) {
                (false, true) => {
                    debug!("zone '{}': enter at {}", name, point);
                    self.occupied.insert(name.clone());
                    zone.fire_enter(tick);
                    plugins.zone_enter(ctx, name);
                    zone.fire_while_inside(tick);
                    plugins.zone_while_inside(ctx, name);
                }
                (true, true) => {
                    zone.fire_while_inside(tick);
                    plugins.zone_while_inside(ctx, name);
                }
                (true, false) => {
                    debug!("zone '{}': exit at {}", name, point);
                    self.occupied.remove(name);
                    zone.fire_exit(tick);
                    plugins.zone_exit(ctx, name);
                }
                (false, false) => {
                    let crossed = self.swept_detection
                        && previous.is_some_and(|prev| zone.shape().intersects_segment(prev, point));
                    if crossed {
                        debug!("zone '{}': crossed within one tick", name);
                        zone.fire_enter(tick);
                        plugins.zone_enter(ctx, name);
                        zone.fire_exit(tick);
                        plugins.zone_exit(ctx, name);
                    }
                }
            }
        }
    }
}

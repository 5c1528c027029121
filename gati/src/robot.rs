//! Capabilities consumed from the drivetrain and localization layers.
//!
//! Gati never talks to hardware. A host provides one [`Drive`] and one
//! [`Odometry`]; the engine reads a pose from the latter and hands exactly
//! one robot-relative [`Translation`] per tick to the former.

use crate::geometry::{PointXYZ, Translation};

/// Accepts robot-relative velocity commands.
pub trait Drive {
    /// Apply a robot-relative translation. Components arrive clamped to
    /// [-1, 1].
    fn set_translation(&mut self, translation: Translation);

    /// The most recently applied translation.
    fn translation(&self) -> Translation;
}

/// Supplies the robot's pose.
///
/// Implementors provide the raw (sensor-integrated) pose and store an
/// offset; the corrected pose is `raw + offset`. Drift-correction plugins
/// use [`offset_so_position_is`](Odometry::offset_so_position_is) to
/// re-anchor the corrected pose on a known reference.
pub trait Odometry {
    /// Pose as integrated by the sensors, without any offset.
    fn raw_position(&mut self) -> PointXYZ;

    /// Current offset applied on top of the raw pose.
    fn offset(&self) -> PointXYZ;

    /// Replace the offset.
    fn set_offset(&mut self, offset: PointXYZ);

    /// Corrected pose.
    fn position(&mut self) -> PointXYZ {
        self.raw_position() + self.offset()
    }

    /// Choose the offset so that [`position`](Odometry::position) reports
    /// `target` right now.
    fn offset_so_position_is(&mut self, target: PointXYZ) {
        let raw = self.raw_position();
        self.set_offset(target - raw);
    }

    /// Drop any offset.
    fn clear_offset(&mut self) {
        self.set_offset(PointXYZ::ZERO);
    }
}

impl<D: Drive + ?Sized> Drive for Box<D> {
    fn set_translation(&mut self, translation: Translation) {
        (**self).set_translation(translation)
    }

    fn translation(&self) -> Translation {
        (**self).translation()
    }
}

impl<O: Odometry + ?Sized> Odometry for Box<O> {
    fn raw_position(&mut self) -> PointXYZ {
        (**self).raw_position()
    }

    fn offset(&self) -> PointXYZ {
        (**self).offset()
    }

    fn set_offset(&mut self, offset: PointXYZ) {
        (**self).set_offset(offset)
    }

    fn position(&mut self) -> PointXYZ {
        (**self).position()
    }
}

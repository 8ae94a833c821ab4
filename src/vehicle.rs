use bevy::prelude::*;

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    Base,
    Boost,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeedProfile {
    pub base: f32,
    pub boost: f32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        SpeedProfile { base: 0.1, boost: 0.2 }
    }
}

/// Airplane kinematics. Only yaw is modelled; the plane never climbs or banks.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub position: Vec3,
    pub heading: f32,
    pub target_heading: f32,
    pub speed: f32,
    speeds: SpeedProfile,
    heading_smoothing: f32,
}

impl Vehicle {
    pub fn new(speeds: SpeedProfile, heading_smoothing: f32) -> Self {
        Vehicle {
            position: Vec3::ZERO,
            heading: 0.0,
            target_heading: 0.0,
            speed: speeds.base,
            speeds,
            heading_smoothing,
        }
    }

    /// Accumulates into the target heading. There is no clamping, so holding
    /// a turn key winds the target up indefinitely.
    pub fn set_target_heading_delta(&mut self, delta: f32) {
        self.target_heading += delta;
    }

    pub fn set_speed(&mut self, mode: SpeedMode) {
        self.speed = match mode {
            SpeedMode::Base => self.speeds.base,
            SpeedMode::Boost => self.speeds.boost,
        };
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.heading)
    }

    /// Facing direction: local +Z rotated into world space.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// Moves one step along the current facing, then eases the heading.
    ///
    /// `speed` is a per-frame displacement and `_delta_seconds` is ignored on
    /// purpose: top speed depends on the frame rate.
    pub fn advance(&mut self, _delta_seconds: f32) {
        let direction = self.forward();
        self.position += direction * self.speed;
        self.heading += (self.target_heading - self.heading) * self.heading_smoothing;
    }
}

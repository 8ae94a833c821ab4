use bevy::prelude::*;

use crate::vehicle::Vehicle;

/// Chase camera. Only the position carries state; the orientation is
/// recomputed every frame by looking at the vehicle.
#[derive(Debug, Clone)]
pub struct CameraFollower {
    pub position: Vec3,
    pub offset: Vec3,
    pub smoothing: f32,
}

impl CameraFollower {
    pub fn new(position: Vec3, offset: Vec3, smoothing: f32) -> Self {
        CameraFollower { position, offset, smoothing }
    }

    pub fn desired_position(&self, vehicle: &Vehicle) -> Vec3 {
        vehicle.position + vehicle.orientation() * self.offset
    }

    /// Moves a fixed fraction of the remaining distance toward the desired
    /// position and returns the point to look at.
    pub fn update(&mut self, vehicle: &Vehicle) -> Vec3 {
        let desired = self.desired_position(vehicle);
        self.position = self.position.lerp(desired, self.smoothing);
        vehicle.position
    }
}

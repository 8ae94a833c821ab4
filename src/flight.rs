use bevy::prelude::*;
use rand::Rng;

use crate::{
    camera::CameraFollower,
    clouds::{CloudChanges, CloudField},
    config::FlightConfig,
    vehicle::{SpeedMode, Vehicle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightInput {
    RotateLeft,
    RotateRight,
    BoostStart,
    BoostStop,
}

/// Everything the frame loop mutates, owned in one place.
pub struct Flight {
    pub vehicle: Vehicle,
    pub camera: CameraFollower,
    pub clouds: CloudField,
    pub look_at: Vec3,
    turn_step: f32,
    cull_radius: f32,
    // The airplane model may still be loading, or may never arrive.
    vehicle_ready: bool,
}

impl Flight {
    /// Builds the context and scatters the opening clouds around the origin.
    pub fn new<R: Rng>(config: &FlightConfig, rng: &mut R) -> Self {
        let settings = &config.clouds;
        let mut clouds = CloudField::new(settings.clone());
        clouds.spawn_disc(Vec3::ZERO, settings.initial_count, settings.min_spawn_dist, rng);
        clouds.spawn_ring(
            Vec3::ZERO,
            settings.density,
            settings.min_spawn_dist,
            settings.max_spawn_dist,
            rng,
        );

        Flight {
            vehicle: Vehicle::new(config.vehicle.speeds(), config.vehicle.heading_smoothing),
            camera: CameraFollower::new(
                config.camera.initial_position,
                config.camera.offset,
                config.camera.smoothing,
            ),
            clouds,
            look_at: Vec3::ZERO,
            turn_step: config.vehicle.turn_step,
            cull_radius: settings.cull_radius,
            vehicle_ready: false,
        }
    }

    pub fn set_vehicle_ready(&mut self, ready: bool) {
        self.vehicle_ready = ready;
    }

    pub fn handle_input(&mut self, input: FlightInput) {
        // Releasing boost always lands, even before the airplane exists.
        if input == FlightInput::BoostStop {
            self.vehicle.set_speed(SpeedMode::Base);
            return;
        }
        if !self.vehicle_ready {
            return;
        }
        match input {
            FlightInput::RotateLeft => self.vehicle.set_target_heading_delta(self.turn_step),
            FlightInput::RotateRight => self.vehicle.set_target_heading_delta(-self.turn_step),
            FlightInput::BoostStart => self.vehicle.set_speed(SpeedMode::Boost),
            FlightInput::BoostStop => {}
        }
    }

    /// One frame. The order matters: clouds are managed against this frame's
    /// vehicle position and culled against this frame's camera position.
    pub fn tick<R: Rng>(&mut self, delta_seconds: f32, rng: &mut R) -> CloudChanges {
        let mut changes = CloudChanges::default();

        if self.vehicle_ready {
            self.vehicle.advance(delta_seconds);
            self.look_at = self.camera.update(&self.vehicle);
            changes = self.clouds.manage(self.vehicle.position, rng);
        }

        self.clouds.cull_by_camera_distance(self.camera.position, self.cull_radius);

        changes
    }
}

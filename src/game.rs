use bevy::{gltf::Gltf, prelude::*, utils::HashMap};
use rand::{rngs::StdRng, SeedableRng};

use crate::{clouds::ClusterId, config::FlightConfig, flight::Flight};

/// Load progress of an asset the scene depends on. Missing and still-loading
/// assets look the same to the frame loop; only the log tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Ready,
    Failed,
}

pub struct FlightScene {
    pub config: FlightConfig,
    pub flight: Option<Flight>,
    pub rng: StdRng,
    pub camera: Option<Entity>,
    pub airplane: Option<Entity>,
    pub sky: Option<Entity>,
    pub airplane_scene: Handle<Scene>,
    pub airplane_gltf: Handle<Gltf>,
    pub airplane_status: AssetStatus,
    pub animation_started: bool,
    pub environment: Handle<Image>,
    pub environment_status: AssetStatus,
    pub cloud_entities: HashMap<ClusterId, Entity>,
    pub cloud_mesh: Handle<Mesh>,
    pub cloud_material: Handle<StandardMaterial>,
}

impl FlightScene {
    pub fn new(config: FlightConfig) -> Self {
        FlightScene {
            config,
            flight: None,
            rng: StdRng::from_os_rng(),
            camera: None,
            airplane: None,
            sky: None,
            airplane_scene: Handle::default(),
            airplane_gltf: Handle::default(),
            airplane_status: AssetStatus::Pending,
            animation_started: false,
            environment: Handle::default(),
            environment_status: AssetStatus::Pending,
            cloud_entities: HashMap::default(),
            cloud_mesh: Handle::default(),
            cloud_material: Handle::default(),
        }
    }
}

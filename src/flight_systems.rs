use bevy::{
    asset::LoadState,
    ecs::schedule::SystemLabel,
    gltf::Gltf,
    input::{keyboard::{KeyCode, KeyboardInput}, ButtonState},
    prelude::*,
};

use crate::{
    config::KeyBindings,
    flight::{Flight, FlightInput},
    game::{AssetStatus, FlightScene},
    scene_builder::{build_cloud_assets, build_cloud_cluster, build_sky_dome},
};

#[derive(SystemLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlightStage {
    Assets,
    Input,
    Tick,
}

pub fn setup_flight_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut clear_color: ResMut<ClearColor>,
    mut ambient_light: ResMut<AmbientLight>,
    mut game: ResMut<FlightScene>,
) {
    let game = &mut *game;
    let config = game.config.clone();

    let [r, g, b] = config.display.clear_color;
    clear_color.0 = Color::rgb(r, g, b);
    ambient_light.brightness = config.display.ambient_brightness;

    game.camera = Some(
        commands.spawn_bundle(Camera3dBundle {
            projection: PerspectiveProjection {
                fov: config.camera.fov_degrees.to_radians(),
                near: config.camera.near,
                far: config.camera.far,
                ..default()
            }.into(),
            transform: Transform::from_translation(config.camera.initial_position)
                .looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        }).id());

    commands.spawn_bundle(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 20000.0,
            ..default()
        },
        transform: Transform::from_xyz(0.0, 100.0, 0.0)
            .looking_at(Vec3::new(-0.4, 0.0, 0.6), Vec3::Y),
        ..default()
    });

    // The glTF handle is only kept for its animation list.
    game.airplane_gltf = asset_server.load(config.vehicle.model.as_str());
    game.airplane_scene = asset_server.load(format!("{}#Scene0", config.vehicle.model).as_str());
    game.airplane = Some(
        commands.spawn_bundle(SceneBundle {
            scene: game.airplane_scene.clone(),
            transform: Transform::from_scale(Vec3::splat(config.vehicle.scale)),
            ..default()
        }).id());

    game.environment = asset_server.load(config.environment.texture.as_str());

    let (mesh, material) = build_cloud_assets(&config, &mut meshes, &mut materials);
    game.cloud_mesh = mesh;
    game.cloud_material = material;

    let flight = Flight::new(&config, &mut game.rng);
    for cluster in flight.clouds.clusters() {
        let entity = build_cloud_cluster(cluster, &game.cloud_mesh, &game.cloud_material, &mut commands);
        game.cloud_entities.insert(cluster.id, entity);
    }
    info!("flight scene ready with {} cloud clusters", flight.clouds.len());
    game.flight = Some(flight);
}

fn load_status(state: LoadState) -> AssetStatus {
    match state {
        LoadState::Loaded => AssetStatus::Ready,
        LoadState::Failed => AssetStatus::Failed,
        _ => AssetStatus::Pending,
    }
}

/// Polls the asset server and reacts to the first transition out of
/// `Pending`. Failures are logged once and otherwise ignored.
pub fn asset_status_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut game: ResMut<FlightScene>,
) {
    let game = &mut *game;
    if game.flight.is_none() {
        return;
    }

    if game.airplane_status == AssetStatus::Pending {
        let status = load_status(asset_server.get_load_state(&game.airplane_scene));
        match status {
            AssetStatus::Ready => {
                info!("airplane model {} loaded", game.config.vehicle.model);
                if let Some(flight) = game.flight.as_mut() {
                    flight.set_vehicle_ready(true);
                }
            }
            AssetStatus::Failed => {
                error!("airplane model {} failed to load; the airplane will stay grounded", game.config.vehicle.model);
            }
            AssetStatus::Pending => {}
        }
        game.airplane_status = status;
    }

    if game.environment_status == AssetStatus::Pending {
        let status = load_status(asset_server.get_load_state(&game.environment));
        match status {
            AssetStatus::Ready => {
                info!("environment {} loaded", game.config.environment.texture);
                game.sky = Some(build_sky_dome(
                    &game.config,
                    game.environment.clone(),
                    &mut meshes,
                    &mut materials,
                    &mut commands,
                ));
            }
            AssetStatus::Failed => {
                error!("environment {} failed to load; keeping the plain sky", game.config.environment.texture);
            }
            AssetStatus::Pending => {}
        }
        game.environment_status = status;
    }
}

/// Plays the first clip of the airplane glTF, if it has any. The players
/// only appear once the scene has been instanced, so this keeps polling.
pub fn airplane_animation_system(
    gltfs: Res<Assets<Gltf>>,
    mut players: Query<&mut AnimationPlayer>,
    mut game: ResMut<FlightScene>,
) {
    if game.animation_started || game.airplane_status != AssetStatus::Ready {
        return;
    }
    let gltf = match gltfs.get(&game.airplane_gltf) {
        Some(gltf) => gltf,
        _ => {
            return;
        }
    };
    let clip = match gltf.animations.first() {
        Some(clip) => clip.clone(),
        _ => {
            debug!("airplane model has no animations");
            game.animation_started = true;
            return;
        }
    };

    let time_scale = game.config.vehicle.animation_time_scale;
    for mut player in players.iter_mut() {
        player.play(clip.clone()).repeat();
        player.set_speed(time_scale);
        game.animation_started = true;
    }
}

/// Maps a raw key event onto a flight input. Key repeat produces repeated
/// presses, so holding a turn key keeps turning.
pub fn map_key(keys: &KeyBindings, key: KeyCode, state: ButtonState) -> Option<FlightInput> {
    match state {
        ButtonState::Pressed if key == keys.rotate_left => Some(FlightInput::RotateLeft),
        ButtonState::Pressed if key == keys.rotate_right => Some(FlightInput::RotateRight),
        ButtonState::Pressed if key == keys.boost => Some(FlightInput::BoostStart),
        ButtonState::Released if key == keys.boost => Some(FlightInput::BoostStop),
        _ => None,
    }
}

pub fn keyboard_input_system(
    mut keyboard_events: EventReader<KeyboardInput>,
    mut game: ResMut<FlightScene>,
) {
    let game = &mut *game;
    let flight = match game.flight.as_mut() {
        Some(flight) => flight,
        _ => {
            return;
        }
    };

    for event in keyboard_events.iter() {
        let key = match event.key_code {
            Some(key) => key,
            _ => {
                continue;
            }
        };
        if let Some(input) = map_key(&game.config.keys, key, event.state) {
            flight.handle_input(input);
        }
    }
}

/// Advances the simulation one frame and mirrors it onto the entities.
pub fn flight_tick_system(
    mut commands: Commands,
    time: Res<Time>,
    mut transforms: Query<&mut Transform>,
    mut visibilities: Query<&mut Visibility>,
    mut game: ResMut<FlightScene>,
) {
    let game = &mut *game;
    let flight = match game.flight.as_mut() {
        Some(flight) => flight,
        _ => {
            return;
        }
    };

    let changes = flight.tick(time.delta_seconds(), &mut game.rng);

    if !changes.is_empty() {
        for id in changes.despawned {
            if let Some(entity) = game.cloud_entities.remove(&id) {
                commands.entity(entity).despawn_recursive();
            }
        }
        for id in changes.spawned {
            if let Some(cluster) = flight.clouds.get(id) {
                let entity = build_cloud_cluster(cluster, &game.cloud_mesh, &game.cloud_material, &mut commands);
                game.cloud_entities.insert(id, entity);
            }
        }
    }

    for cluster in flight.clouds.clusters() {
        let entity = match game.cloud_entities.get(&cluster.id) {
            Some(entity) => *entity,
            _ => {
                continue;
            }
        };
        if let Ok(mut visibility) = visibilities.get_mut(entity) {
            visibility.is_visible = cluster.visible;
        }
    }

    if let Some(entity) = game.airplane {
        if let Ok(mut transform) = transforms.get_mut(entity) {
            transform.translation = flight.vehicle.position;
            transform.rotation = flight.vehicle.orientation();
        }
    }

    let camera_position = flight.camera.position;
    if let Some(entity) = game.camera {
        if let Ok(mut transform) = transforms.get_mut(entity) {
            *transform = Transform::from_translation(camera_position)
                .looking_at(flight.look_at, Vec3::Y);
        }
    }

    if let Some(entity) = game.sky {
        if let Ok(mut transform) = transforms.get_mut(entity) {
            transform.translation = camera_position;
        }
    }
}

/// Caps the device pixel ratio the renderer draws at.
pub fn pixel_ratio_system(mut windows: ResMut<Windows>, game: Res<FlightScene>) {
    let window = match windows.get_primary_mut() {
        Some(window) => window,
        _ => {
            return;
        }
    };
    let capped = window.backend_scale_factor().min(game.config.display.max_pixel_ratio);
    if window.scale_factor_override() != Some(capped) {
        window.set_scale_factor_override(Some(capped));
    }
}

#[cfg(target_arch = "wasm32")]
pub fn window_resize_system(mut windows: ResMut<Windows>) {
    let window = match windows.get_primary_mut() {
        Some(window) => window,
        _ => {
            return;
        }
    };
    let wasm_window = match web_sys::window() {
        Some(wasm_window) => wasm_window,
        _ => {
            return;
        }
    };
    let width = wasm_window.inner_width().ok().and_then(|w| w.as_f64());
    let height = wasm_window.inner_height().ok().and_then(|h| h.as_f64());
    let (target_width, target_height) = match (width, height) {
        (Some(w), Some(h)) => (w as f32, h as f32),
        _ => {
            return;
        }
    };

    if window.width() != target_width || window.height() != target_height {
        window.set_resolution(target_width, target_height);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn window_resize_system() {
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_map_arrow_keys() {
        let keys = KeyBindings::default();
        assert_eq!(map_key(&keys, KeyCode::Left, ButtonState::Pressed), Some(FlightInput::RotateLeft));
        assert_eq!(map_key(&keys, KeyCode::Right, ButtonState::Pressed), Some(FlightInput::RotateRight));
        assert_eq!(map_key(&keys, KeyCode::Up, ButtonState::Pressed), Some(FlightInput::BoostStart));
        assert_eq!(map_key(&keys, KeyCode::Up, ButtonState::Released), Some(FlightInput::BoostStop));
    }

    #[test]
    fn turn_release_and_unbound_keys_are_ignored() {
        let keys = KeyBindings::default();
        assert_eq!(map_key(&keys, KeyCode::Left, ButtonState::Released), None);
        assert_eq!(map_key(&keys, KeyCode::Down, ButtonState::Pressed), None);
        assert_eq!(map_key(&keys, KeyCode::W, ButtonState::Pressed), None);
    }

    #[test]
    fn rebinding_follows_config() {
        let keys = KeyBindings {
            rotate_left: KeyCode::A,
            rotate_right: KeyCode::D,
            boost: KeyCode::Space,
        };
        assert_eq!(map_key(&keys, KeyCode::A, ButtonState::Pressed), Some(FlightInput::RotateLeft));
        assert_eq!(map_key(&keys, KeyCode::Left, ButtonState::Pressed), None);
        assert_eq!(map_key(&keys, KeyCode::Space, ButtonState::Released), Some(FlightInput::BoostStop));
    }
}

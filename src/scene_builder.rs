use bevy::{
    prelude::*,
    render::{mesh::shape, view::NoFrustumCulling},
};

use crate::{clouds::CloudCluster, config::FlightConfig};

/// Shared puff mesh and material; every cluster reuses the same pair.
pub fn build_cloud_assets(
    config: &FlightConfig,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> (Handle<Mesh>, Handle<StandardMaterial>) {
    let mesh = meshes.add(Mesh::from(shape::UVSphere {
        radius: config.clouds.puff_radius,
        sectors: 16,
        stacks: 16,
    }));

    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 1.0,
        ..Default::default()
    });

    (mesh, material)
}

/// Spawns a cluster root with one child per puff.
///
/// Puffs poke out past the root's origin, so per-puff frustum culling would
/// pop them at the screen edge. They opt out of it and inherit the root's
/// visibility, which is driven by camera distance instead.
pub fn build_cloud_cluster(
    cluster: &CloudCluster,
    mesh: &Handle<Mesh>,
    material: &Handle<StandardMaterial>,
    commands: &mut Commands,
) -> Entity {
    return commands
        .spawn_bundle(SpatialBundle {
            visibility: Visibility { is_visible: cluster.visible },
            transform: Transform::from_translation(cluster.position),
            ..default()
        })
        .with_children(|parent| {
            for offset in cluster.puffs() {
                parent
                    .spawn_bundle(PbrBundle {
                        mesh: mesh.clone(),
                        material: material.clone(),
                        transform: Transform::from_translation(*offset),
                        ..default()
                    })
                    .insert(NoFrustumCulling);
            }
        })
        .id();
}

/// Inside-out sphere carrying the equirectangular panorama. It follows the
/// camera so the horizon never gets closer.
pub fn build_sky_dome(
    config: &FlightConfig,
    texture: Handle<Image>,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    commands: &mut Commands,
) -> Entity {
    let mesh = meshes.add(Mesh::from(shape::UVSphere {
        radius: config.environment.sky_radius,
        sectors: 64,
        stacks: 32,
    }));

    let material = materials.add(StandardMaterial {
        base_color_texture: Some(texture),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..Default::default()
    });

    return commands
        .spawn_bundle(PbrBundle {
            mesh,
            material,
            transform: Transform::from_translation(config.camera.initial_position),
            ..default()
        })
        .insert(NoFrustumCulling)
        .id();
}

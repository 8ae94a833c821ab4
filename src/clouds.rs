use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::config::CloudConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u64);

/// A cloud made of several puffs sharing one origin. The puff layout is
/// rolled once at creation and never touched again.
#[derive(Debug, Clone)]
pub struct CloudCluster {
    pub id: ClusterId,
    pub position: Vec3,
    pub visible: bool,
    puffs: Box<[Vec3]>,
}

impl CloudCluster {
    /// Puff offsets relative to the cluster origin.
    pub fn puffs(&self) -> &[Vec3] {
        &self.puffs
    }
}

/// What a `manage` pass changed, for the renderer side to mirror.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CloudChanges {
    pub spawned: Vec<ClusterId>,
    pub despawned: Vec<ClusterId>,
    pub rings: u32,
}

impl CloudChanges {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.despawned.is_empty()
    }
}

/// Live clouds around the airplane.
///
/// Three radii matter: clusters are spawned in an annulus between
/// `min_spawn_dist` and `max_spawn_dist`, shown within `cull_radius` of the
/// camera, and dropped past `max_spawn_dist` from the airplane.
pub struct CloudField {
    settings: CloudConfig,
    clusters: Vec<CloudCluster>,
    last_spawn: Vec3,
    next_id: u64,
}

impl CloudField {
    pub fn new(settings: CloudConfig) -> Self {
        CloudField {
            settings,
            clusters: Vec::new(),
            last_spawn: Vec3::ZERO,
            next_id: 0,
        }
    }

    pub fn clusters(&self) -> &[CloudCluster] {
        &self.clusters
    }

    pub fn get(&self, id: ClusterId) -> Option<&CloudCluster> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Builds a cluster at the origin. It is not added to the field.
    pub fn create_cluster<R: Rng>(&mut self, rng: &mut R) -> CloudCluster {
        let spread = self.settings.puff_spread;
        let puffs = (0..self.settings.puff_count)
            .map(|_| {
                Vec3::new(
                    (rng.random::<f32>() - 0.5) * 2.0 * spread.x,
                    (rng.random::<f32>() - 0.5) * 2.0 * spread.y,
                    (rng.random::<f32>() - 0.5) * 2.0 * spread.z,
                )
            })
            .collect();

        let id = ClusterId(self.next_id);
        self.next_id += 1;

        CloudCluster {
            id,
            position: Vec3::ZERO,
            visible: false,
            puffs,
        }
    }

    fn roll_ring<R: Rng>(
        &mut self,
        center: Vec3,
        count: usize,
        min_radius: f32,
        max_radius: f32,
        rng: &mut R,
    ) -> Vec<CloudCluster> {
        let vertical = self.settings.vertical_spread;
        let mut fresh = Vec::with_capacity(count);
        for _ in 0..count {
            let mut cluster = self.create_cluster(rng);

            let angle = rng.random::<f32>() * TAU;
            let distance = min_radius + (max_radius - min_radius) * rng.random::<f32>();
            let height = (rng.random::<f32>() - 0.5) * 2.0 * vertical;

            cluster.position = Vec3::new(
                center.x + angle.cos() * distance,
                center.y + height,
                center.z + angle.sin() * distance,
            );
            fresh.push(cluster);
        }
        fresh
    }

    /// Adds `count` clusters in the horizontal annulus `[min_radius, max_radius]`
    /// around `center`.
    pub fn spawn_ring<R: Rng>(
        &mut self,
        center: Vec3,
        count: usize,
        min_radius: f32,
        max_radius: f32,
        rng: &mut R,
    ) -> Vec<ClusterId> {
        let fresh = self.roll_ring(center, count, min_radius, max_radius, rng);
        let ids = fresh.iter().map(|cluster| cluster.id).collect();
        self.clusters.extend(fresh);
        ids
    }

    /// Filled-disc variant used for the opening population.
    pub fn spawn_disc<R: Rng>(&mut self, center: Vec3, count: usize, radius: f32, rng: &mut R) -> Vec<ClusterId> {
        self.spawn_ring(center, count, 0.0, radius, rng)
    }

    /// Per-frame upkeep: drop distant clusters, then refill a ring once the
    /// airplane has travelled far enough from the previous refill.
    pub fn manage<R: Rng>(&mut self, vehicle_position: Vec3, rng: &mut R) -> CloudChanges {
        let max_dist = self.settings.max_spawn_dist;
        let mut changes = CloudChanges::default();

        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .clusters
            .drain(..)
            .partition(|cluster| cluster.position.distance(vehicle_position) <= max_dist);
        self.clusters = kept;
        changes.despawned = dropped.into_iter().map(|cluster| cluster.id).collect();

        if vehicle_position.distance(self.last_spawn) > self.settings.spawn_distance_threshold {
            let fresh = self.roll_ring(
                vehicle_position,
                self.settings.density,
                self.settings.min_spawn_dist,
                max_dist,
                rng,
            );
            // The vertical jitter can push a cluster on the outer edge just
            // past the despawn radius; those never join the field.
            for cluster in fresh {
                if cluster.position.distance(vehicle_position) <= max_dist {
                    changes.spawned.push(cluster.id);
                    self.clusters.push(cluster);
                }
            }
            changes.rings += 1;
            debug!(
                "cloud ring {} moved from {:?} to {:?}: +{} -{} live={}",
                changes.rings,
                self.last_spawn,
                vehicle_position,
                changes.spawned.len(),
                changes.despawned.len(),
                self.clusters.len()
            );
            self.last_spawn = vehicle_position;
        }

        changes
    }

    pub fn cull_by_camera_distance(&mut self, camera_position: Vec3, radius: f32) {
        for cluster in self.clusters.iter_mut() {
            cluster.visible = cluster.position.distance(camera_position) <= radius;
        }
    }

    #[cfg(test)]
    pub(crate) fn last_spawn(&self) -> Vec3 {
        self.last_spawn
    }

    #[cfg(test)]
    fn insert_at(&mut self, position: Vec3) -> ClusterId {
        let id = ClusterId(self.next_id);
        self.next_id += 1;
        self.clusters.push(CloudCluster {
            id,
            position,
            visible: false,
            puffs: Vec::new().into_boxed_slice(),
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn field() -> CloudField {
        CloudField::new(CloudConfig::default())
    }

    fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
        Vec2::new(a.x - b.x, a.z - b.z).length()
    }

    #[test]
    fn cluster_puffs_stay_in_local_box() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = field();
        for _ in 0..50 {
            let cluster = field.create_cluster(&mut rng);
            assert_eq!(cluster.puffs().len(), 10);
            for puff in cluster.puffs() {
                assert!(puff.x.abs() <= 5.0 && puff.z.abs() <= 5.0);
                assert!(puff.y.abs() <= 2.5);
            }
        }
    }

    #[test]
    fn spawn_ring_places_exactly_count_clusters_in_annulus() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut field = field();
        let center = Vec3::new(-120.0, 40.0, 310.0);

        let ids = field.spawn_ring(center, 35, 300.0, 400.0, &mut rng);

        assert_eq!(ids.len(), 35);
        assert_eq!(field.len(), 35);
        for cluster in field.clusters() {
            let d = horizontal_distance(cluster.position, center);
            assert!(d >= 300.0 - 1e-3 && d <= 400.0 + 1e-3, "distance {d}");
            let dy = cluster.position.y - center.y;
            assert!((-25.0..=25.0).contains(&dy), "height {dy}");
        }
    }

    #[test]
    fn spawn_disc_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = field();
        field.spawn_disc(Vec3::ZERO, 20, 300.0, &mut rng);
        assert_eq!(field.len(), 20);
        assert!(field
            .clusters()
            .iter()
            .all(|c| horizontal_distance(c.position, Vec3::ZERO) <= 300.0 + 1e-3));
    }

    #[test]
    fn cluster_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = field();
        let mut ids = field.spawn_ring(Vec3::ZERO, 30, 0.0, 50.0, &mut rng);
        ids.extend(field.spawn_ring(Vec3::ZERO, 30, 0.0, 50.0, &mut rng));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 60);
    }

    #[test]
    fn manage_removes_far_and_keeps_near() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = field();
        let far = field.insert_at(Vec3::new(450.0, 0.0, 0.0));
        let near = field.insert_at(Vec3::new(0.0, 0.0, 350.0));

        let changes = field.manage(Vec3::ZERO, &mut rng);

        assert_eq!(changes.despawned, vec![far]);
        assert_eq!(changes.rings, 0);
        assert!(field.get(far).is_none());
        assert!(field.get(near).is_some());
    }

    #[test]
    fn manage_does_not_skip_adjacent_removals() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = field();
        for i in 0..6 {
            field.insert_at(Vec3::new(401.0 + i as f32, 0.0, 0.0));
        }
        let kept = field.insert_at(Vec3::new(10.0, 0.0, 0.0));

        let changes = field.manage(Vec3::ZERO, &mut rng);

        assert_eq!(changes.despawned.len(), 6);
        assert_eq!(field.len(), 1);
        assert_eq!(field.clusters()[0].id, kept);
    }

    #[test]
    fn every_cluster_is_within_bound_after_manage() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut field = field();
        field.spawn_disc(Vec3::ZERO, 20, 300.0, &mut rng);
        field.spawn_ring(Vec3::ZERO, 35, 300.0, 400.0, &mut rng);

        let mut position = Vec3::ZERO;
        for step in 0..200 {
            position += Vec3::new(3.0, 0.0, 2.0 + (step % 7) as f32);
            field.manage(position, &mut rng);
            for cluster in field.clusters() {
                assert!(cluster.position.distance(position) <= 400.0);
            }
        }
    }

    #[test]
    fn manage_is_idempotent_for_a_still_vehicle() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = field();
        let position = Vec3::new(150.0, 0.0, 0.0);

        field.manage(position, &mut rng);
        let before: Vec<ClusterId> = field.clusters().iter().map(|c| c.id).collect();

        let again = field.manage(position, &mut rng);

        assert!(again.is_empty());
        assert_eq!(again.rings, 0);
        let after: Vec<ClusterId> = field.clusters().iter().map(|c| c.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn travelling_past_threshold_spawns_one_ring_at_vehicle() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut field = field();
        let position = Vec3::new(150.0, 0.0, 0.0);

        let changes = field.manage(position, &mut rng);

        assert_eq!(changes.rings, 1);
        assert!(!changes.spawned.is_empty());
        assert!(changes.spawned.len() <= 35);
        assert_eq!(field.last_spawn(), position);
        for id in &changes.spawned {
            let cluster = field.get(*id).unwrap();
            let d = horizontal_distance(cluster.position, position);
            assert!(d >= 300.0 - 1e-3 && d <= 400.0 + 1e-3);
        }
    }

    #[test]
    fn refill_keeps_only_fresh_clusters_inside_despawn_radius() {
        let settings = CloudConfig {
            vertical_spread: 300.0,
            ..CloudConfig::default()
        };
        let position = Vec3::new(150.0, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(17);

        // Same seed, same draws: replay the ring on a twin field.
        let mut twin_rng = rng.clone();
        let mut twin = CloudField::new(settings.clone());
        let fresh = twin.roll_ring(position, 35, 300.0, 400.0, &mut twin_rng);
        let inside: Vec<Vec3> = fresh
            .iter()
            .map(|c| c.position)
            .filter(|p| p.distance(position) <= 400.0)
            .collect();
        assert!(inside.len() < 35);

        let mut field = CloudField::new(settings);
        let changes = field.manage(position, &mut rng);

        assert_eq!(changes.rings, 1);
        assert_eq!(changes.spawned.len(), inside.len());
        let live: Vec<Vec3> = field.clusters().iter().map(|c| c.position).collect();
        assert_eq!(live, inside);
    }

    #[test]
    fn default_refill_drops_only_clusters_past_despawn_radius() {
        let position = Vec3::new(150.0, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(8);

        let mut twin_rng = rng.clone();
        let mut twin = field();
        let fresh = twin.roll_ring(position, 35, 300.0, 400.0, &mut twin_rng);
        let outside = fresh
            .iter()
            .filter(|c| c.position.distance(position) > 400.0)
            .count();

        let mut field = field();
        let changes = field.manage(position, &mut rng);

        assert_eq!(changes.spawned.len(), 35 - outside);
    }

    #[test]
    fn short_hop_does_not_spawn() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut field = field();
        let changes = field.manage(Vec3::new(60.0, 0.0, 60.0), &mut rng);
        assert_eq!(changes.rings, 0);
        assert_eq!(field.last_spawn(), Vec3::ZERO);
    }

    #[test]
    fn culling_uses_camera_distance() {
        let mut field = field();
        let camera = Vec3::new(0.0, 7.0, -15.0);
        let far = field.insert_at(camera + Vec3::new(250.0, 0.0, 0.0));
        let near = field.insert_at(camera + Vec3::new(0.0, 0.0, 150.0));

        field.cull_by_camera_distance(camera, 200.0);

        assert!(!field.get(far).unwrap().visible);
        assert!(field.get(near).unwrap().visible);
    }
}

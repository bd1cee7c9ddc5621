//! Vehicle interface consumed by the learning core, and the slot pool that
//! keeps vehicles alive across generations.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::control::DriveCommands;
use crate::geometry::Vec2;
use crate::track::TrackProgress;

new_key_type! {
    /// Stable handle to a pooled vehicle.
    pub struct VehicleId;
}

/// Position, heading and speed of a vehicle at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Degrees, counter-clockwise, `0` facing `+y`.
    pub heading: f32,
    /// Signed scalar speed along the heading.
    pub velocity: f32,
}

impl Pose {
    #[must_use]
    pub const fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            velocity: 0.0,
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }

    /// Unit vector along the heading.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_heading(self.heading)
    }
}

/// A simulated vehicle as seen by the learning core.
///
/// Physics, rendering and checkpoint detection live with the implementor;
/// the core only reads state and writes commands.
pub trait Vehicle {
    fn pose(&self) -> Pose;

    /// Lap and checkpoint progress.
    fn progress(&self) -> TrackProgress;

    /// Crashed or otherwise out of the current generation.
    fn is_disabled(&self) -> bool;

    /// Command sink, called once per tick.
    fn apply_commands(&mut self, commands: DriveCommands);

    /// Externally visible fitness.
    fn set_fitness(&mut self, fitness: f32);

    /// Forget per-generation state (progress, disabled flag, fitness).
    /// Repositioning is left to the caller.
    fn reset_knowledge(&mut self);
}

/// Fixed set of vehicles reused generation after generation.
#[derive(Debug, Clone)]
pub struct VehiclePool<V> {
    slots: SlotMap<VehicleId, V>,
    order: Vec<VehicleId>,
}

impl<V> Default for VehiclePool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> VehiclePool<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub fn insert(&mut self, vehicle: V) -> VehicleId {
        let id = self.slots.insert(vehicle);
        self.order.push(id);
        id
    }

    #[must_use]
    pub fn get(&self, id: VehicleId) -> Option<&V> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut V> {
        self.slots.get_mut(id)
    }

    /// Handles in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[VehicleId] {
        &self.order
    }

    /// Vehicles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, &V)> {
        self.order.iter().filter_map(|&id| self.slots.get(id).map(|v| (id, v)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<V> FromIterator<V> for VehiclePool<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut pool = Self::new();
        for vehicle in iter {
            pool.insert(vehicle);
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_preserves_insertion_order() {
        let pool: VehiclePool<&str> = ["a", "b", "c"].into_iter().collect();
        let names: Vec<&str> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(pool.ids()[1]), Some(&"b"));
    }

    #[test]
    fn test_pose_forward() {
        let pose = Pose::new(Vec2::new(1.0, 1.0), 180.0).with_velocity(3.0);
        let f = pose.forward();
        assert!(f.x.abs() < 1e-5 && (f.y + 1.0).abs() < 1e-5);
        assert!((pose.velocity - 3.0).abs() < f32::EPSILON);
    }
}

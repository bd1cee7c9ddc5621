//! Field-of-view perception encoder.
//!
//! A vehicle "sees" a square of tiles placed ahead of it and rotated with its
//! heading. The tiles whose centers fall inside that square are arranged into
//! a 12×12 grid in the vehicle's own frame (far rows first, left to right) and
//! flattened into a fixed-length feature vector of terrain values.

use std::f32::consts::SQRT_2;

use crate::geometry::{point_in_polygon, Vec2};
use crate::track::{TileMap, NO_TILE};
use crate::vehicle::Pose;

/// Half-width of the vision square, in tiles.
pub const FOV_RADIUS_TILES: f32 = 6.0;
/// Tiles per row of the encoded grid.
pub const FOV_GRID_SIDE: usize = 12;
/// Length of the encoded vector.
pub const FOV_LEN: usize = FOV_GRID_SIDE * FOV_GRID_SIDE;

/// A tile found inside the vision box, in vehicle-frame coordinates.
#[derive(Debug, Clone, Copy)]
struct Sighting {
    local: Vec2,
    tile_index: usize,
    encoded: f32,
}

/// Per-agent perception state, recomputed every tick.
#[derive(Debug, Clone)]
pub struct FieldOfView {
    vision_box: [Vec2; 4],
    encoded: [f32; FOV_LEN],
    tile_indices: Vec<usize>,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldOfView {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vision_box: [Vec2::ZERO; 4],
            encoded: [NO_TILE; FOV_LEN],
            tile_indices: Vec::with_capacity(FOV_LEN),
        }
    }

    /// Recompute the vision box and encoded vector for `pose`.
    ///
    /// Always yields exactly [`FOV_LEN`] values; cells without a tile (off the
    /// map, or a short grid under rotation) hold [`NO_TILE`].
    pub fn update<M: TileMap + ?Sized>(&mut self, pose: &Pose, map: &M) -> &[f32; FOV_LEN] {
        let half = FOV_RADIUS_TILES * map.tile_size();
        let center = pose.position + pose.forward() * half;
        self.vision_box = vision_box(center, half, pose.heading);

        let mut sightings = self.scan(center, half, pose.heading, map);
        order_as_grid(&mut sightings);

        self.encoded = [NO_TILE; FOV_LEN];
        self.tile_indices.clear();
        for (slot, sighting) in self.encoded.iter_mut().zip(sightings.iter()) {
            *slot = sighting.encoded;
            self.tile_indices.push(sighting.tile_index);
        }

        &self.encoded
    }

    /// Collect every tile whose center lies inside the current vision box.
    fn scan<M: TileMap + ?Sized>(
        &self,
        center: Vec2,
        half: f32,
        heading: f32,
        map: &M,
    ) -> Vec<Sighting> {
        // The rotated square always fits in its circumscribed circle.
        let reach = half.mul_add(SQRT_2, map.tile_size());
        let (col_min, row_min) = map.cell_of(center.x - reach, center.y - reach);
        let (col_max, row_max) = map.cell_of(center.x + reach, center.y + reach);

        let mut sightings = Vec::with_capacity(FOV_LEN + FOV_GRID_SIDE);
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                let Some(tile) = map.tile_at_cell(col, row) else {
                    continue;
                };
                if point_in_polygon(tile.center, &self.vision_box) {
                    sightings.push(Sighting {
                        local: tile.center.rotated_about(center, -heading),
                        tile_index: tile.index,
                        encoded: tile.encoded,
                    });
                }
            }
        }
        sightings
    }

    /// Corners of the last computed vision box.
    #[must_use]
    pub const fn vision_box(&self) -> &[Vec2; 4] {
        &self.vision_box
    }

    /// Last encoded vector.
    #[must_use]
    pub const fn encoded(&self) -> &[f32; FOV_LEN] {
        &self.encoded
    }

    /// Map indices of the tiles behind each encoded cell, in grid order.
    /// Shorter than [`FOV_LEN`] when cells were padded.
    #[must_use]
    pub fn tile_indices(&self) -> &[usize] {
        &self.tile_indices
    }
}

/// Square of half-width `half` around `center`, rotated by `heading` degrees.
fn vision_box(center: Vec2, half: f32, heading: f32) -> [Vec2; 4] {
    [
        Vec2::new(center.x - half, center.y - half),
        Vec2::new(center.x + half, center.y - half),
        Vec2::new(center.x + half, center.y + half),
        Vec2::new(center.x - half, center.y + half),
    ]
    .map(|corner| corner.rotated_about(center, heading))
}

/// Sort far-to-near, then left-to-right within each row of the grid.
fn order_as_grid(sightings: &mut [Sighting]) {
    sightings.sort_by(|a, b| b.local.y.total_cmp(&a.local.y));
    for row in sightings.chunks_mut(FOV_GRID_SIDE) {
        row.sort_by(|a, b| a.local.x.total_cmp(&b.local.x));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{TerrainKind, TileGrid};

    fn split_map(upper: TerrainKind, lower: TerrainKind, split_row: usize) -> TileGrid {
        let (w, h) = (40, 40);
        let terrain = (0..w * h)
            .map(|i| if i / w >= split_row { upper } else { lower })
            .collect();
        TileGrid::new(w, h, 1.0, terrain).unwrap()
    }

    fn column_map(left: TerrainKind, right: TerrainKind, split_col: usize) -> TileGrid {
        let (w, h) = (40, 40);
        let terrain = (0..w * h)
            .map(|i| if i % w >= split_col { right } else { left })
            .collect();
        TileGrid::new(w, h, 1.0, terrain).unwrap()
    }

    #[test]
    fn test_fully_populated_window() {
        let map = split_map(TerrainKind::Track, TerrainKind::Track, 0);
        let mut fov = FieldOfView::new();
        let encoded = fov.update(&Pose::new(Vec2::new(20.3, 14.2), 0.0), &map);

        assert_eq!(encoded.len(), FOV_LEN);
        assert!(encoded.iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert_eq!(fov.tile_indices().len(), FOV_LEN);
    }

    #[test]
    fn test_empty_window_is_all_sentinel() {
        let map = split_map(TerrainKind::Grass, TerrainKind::Grass, 0);
        let mut fov = FieldOfView::new();
        let encoded = fov.update(&Pose::new(Vec2::new(-500.0, -500.0), 45.0), &map);

        assert_eq!(encoded.len(), FOV_LEN);
        assert!(encoded.iter().all(|&v| v == NO_TILE));
        assert!(fov.tile_indices().is_empty());
    }

    #[test]
    fn test_partial_window_is_padded() {
        let map = split_map(TerrainKind::Grass, TerrainKind::Grass, 0);
        let mut fov = FieldOfView::new();
        // Looking past the top edge of the map.
        let encoded = *fov.update(&Pose::new(Vec2::new(20.3, 33.2), 0.0), &map);

        let seen = encoded.iter().filter(|&&v| v != NO_TILE).count();
        assert!(seen > 0 && seen < FOV_LEN, "seen {seen}");
        assert_eq!(fov.tile_indices().len(), seen);
        // Padding goes to the tail.
        assert!(encoded[seen..].iter().all(|&v| v == NO_TILE));
    }

    #[test]
    fn test_rows_are_ordered_far_to_near() {
        let map = split_map(TerrainKind::Sea, TerrainKind::Track, 20);
        let mut fov = FieldOfView::new();

        let facing_sea = *fov.update(&Pose::new(Vec2::new(20.3, 14.2), 0.0), &map);
        assert!(facing_sea[..72].iter().all(|&v| v == 0.0));
        assert!(facing_sea[72..].iter().all(|&v| v == 1.0));

        // Same box seen from the other side: the track rows are now far.
        let facing_track = *fov.update(&Pose::new(Vec2::new(20.3, 26.2), 180.0), &map);
        assert!(facing_track[..72].iter().all(|&v| v == 1.0));
        assert!(facing_track[72..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_columns_follow_vehicle_frame() {
        let map = column_map(TerrainKind::Grass, TerrainKind::Forest, 20);
        let mut fov = FieldOfView::new();
        let grass = TerrainKind::Grass.encoded_value();
        let forest = TerrainKind::Forest.encoded_value();

        let upright = *fov.update(&Pose::new(Vec2::new(20.3, 14.2), 0.0), &map);
        for row in upright.chunks(FOV_GRID_SIDE) {
            assert!(row[..6].iter().all(|&v| v == grass));
            assert!(row[6..].iter().all(|&v| v == forest));
        }

        // Turned around, the vehicle's left is world +x.
        let flipped = *fov.update(&Pose::new(Vec2::new(20.3, 26.2), 180.0), &map);
        for row in flipped.chunks(FOV_GRID_SIDE) {
            assert!(row[..6].iter().all(|&v| v == forest));
            assert!(row[6..].iter().all(|&v| v == grass));
        }
    }

    #[test]
    fn test_vision_box_rotates_with_heading() {
        let map = split_map(TerrainKind::Track, TerrainKind::Track, 0);
        let mut fov = FieldOfView::new();
        for heading in [0.0_f32, 33.0, 90.0, 217.5, 359.0] {
            let pose = Pose::new(Vec2::new(20.0, 20.0), heading);
            let encoded = fov.update(&pose, &map);
            assert_eq!(encoded.len(), FOV_LEN);

            let expected_center = pose.position + pose.forward() * FOV_RADIUS_TILES;
            let corners = fov.vision_box();
            let centroid = corners.iter().fold(Vec2::ZERO, |acc, &c| acc + c) * 0.25;
            assert!(centroid.distance(expected_center) < 1e-3);
            assert!((corners[0].distance(corners[2]) - 12.0 * SQRT_2).abs() < 1e-3);
        }
    }
}

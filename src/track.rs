//! Tile map and checkpoint model.
//!
//! Tiles are owned by the map and referenced everywhere else by their stable
//! map index. The checkpoint sequence stores only positions and the
//! precomputed segment geometry needed to measure lap progress.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Vec2;

/// Encoded value fed to the network for cells with no tile.
pub const NO_TILE: f32 = -1.0;

/// Terrain classification of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Track,
    Sidewalk,
    Grass,
    Forest,
    Sea,
    Crosswalk,
}

impl TerrainKind {
    pub const ALL: [Self; 6] = [
        Self::Track,
        Self::Sidewalk,
        Self::Grass,
        Self::Forest,
        Self::Sea,
        Self::Crosswalk,
    ];

    /// Scalar network feature for this terrain.
    #[must_use]
    pub const fn encoded_value(self) -> f32 {
        match self {
            Self::Track => 1.0,
            Self::Crosswalk => 0.8,
            Self::Sidewalk => 0.5,
            Self::Grass => 0.25,
            Self::Forest => 0.1,
            Self::Sea => 0.0,
        }
    }

    /// Layout glyph used by [`TileGrid::parse`].
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Track => '#',
            Self::Sidewalk => 's',
            Self::Grass => '.',
            Self::Forest => 'f',
            Self::Sea => '~',
            Self::Crosswalk => '=',
        }
    }

    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.glyph() == glyph)
    }
}

/// A single map cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Stable row-major index into the owning map.
    pub index: usize,
    pub terrain: TerrainKind,
    /// Precomputed network feature, see [`TerrainKind::encoded_value`].
    pub encoded: f32,
    /// World-space center of the tile.
    pub center: Vec2,
    /// Position in the checkpoint sequence, if this tile is a checkpoint.
    pub checkpoint: Option<usize>,
}

/// Read-only access to a tile map.
pub trait TileMap {
    /// Edge length of one square tile in world units.
    fn tile_size(&self) -> f32;

    /// Tile at integer cell coordinates, `None` outside the map.
    fn tile_at_cell(&self, col: i64, row: i64) -> Option<&Tile>;

    /// Cell containing world point `(x, y)`.
    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, x: f32, y: f32) -> (i64, i64) {
        let size = self.tile_size();
        ((x / size).floor() as i64, (y / size).floor() as i64)
    }

    /// Tile containing world point `(x, y)`.
    fn tile_at(&self, x: f32, y: f32) -> Option<&Tile> {
        let (col, row) = self.cell_of(x, y);
        self.tile_at_cell(col, row)
    }
}

/// Errors raised while building maps and checkpoint sequences.
#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
    #[error("map layout is empty")]
    EmptyLayout,
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown glyph {glyph:?} at column {col}, line {line}")]
    UnknownGlyph { glyph: char, col: usize, line: usize },
    #[error("terrain list has {actual} cells, expected {expected}")]
    TerrainCount { expected: usize, actual: usize },
    #[error("cell ({col}, {row}) lies outside the map")]
    CellOutOfBounds { col: usize, row: usize },
    #[error("track has no checkpoints")]
    NoCheckpoints,
    #[error("checkpoint {0} appears more than once")]
    DuplicateCheckpoint(usize),
    #[error("checkpoint {0} is missing from the sequence")]
    MissingCheckpoint(usize),
}

/// Rectangular row-major tile grid. Row 0 is the lowest `y` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build a grid from row-major terrain (row 0 first).
    pub fn new(
        width: usize,
        height: usize,
        tile_size: f32,
        terrain: Vec<TerrainKind>,
    ) -> Result<Self, TrackError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(TrackError::InvalidTileSize(tile_size));
        }
        if width == 0 || height == 0 {
            return Err(TrackError::EmptyLayout);
        }
        if terrain.len() != width * height {
            return Err(TrackError::TerrainCount {
                expected: width * height,
                actual: terrain.len(),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let tiles = terrain
            .into_iter()
            .enumerate()
            .map(|(index, terrain)| {
                let col = index % width;
                let row = index / width;
                Tile {
                    index,
                    terrain,
                    encoded: terrain.encoded_value(),
                    center: Vec2::new(
                        (col as f32 + 0.5) * tile_size,
                        (row as f32 + 0.5) * tile_size,
                    ),
                    checkpoint: None,
                }
            })
            .collect();

        Ok(Self {
            width,
            height,
            tile_size,
            tiles,
        })
    }

    /// Parse an ASCII layout.
    ///
    /// Each glyph is one tile (see [`TerrainKind::glyph`]); a decimal digit is
    /// a track tile carrying that checkpoint index. The first text line is the
    /// top of the map, so the picture reads the same way it renders.
    pub fn parse(layout: &str, tile_size: f32) -> Result<Self, TrackError> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(TrackError::EmptyLayout);
        };
        let width = first.chars().count();
        let height = lines.len();

        let mut terrain = vec![TerrainKind::Grass; width * height];
        let mut checkpoints = Vec::new();
        for (line_no, line) in lines.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(TrackError::RaggedRow {
                    row: line_no,
                    expected: width,
                    actual,
                });
            }
            let row = height - 1 - line_no;
            for (col, glyph) in line.chars().enumerate() {
                let kind = if let Some(digit) = glyph.to_digit(10) {
                    checkpoints.push((col, row, digit as usize));
                    TerrainKind::Track
                } else {
                    TerrainKind::from_glyph(glyph).ok_or(TrackError::UnknownGlyph {
                        glyph,
                        col,
                        line: line_no,
                    })?
                };
                terrain[row * width + col] = kind;
            }
        }

        let mut grid = Self::new(width, height, tile_size, terrain)?;
        for (col, row, checkpoint) in checkpoints {
            grid.set_checkpoint(col, row, checkpoint)?;
        }
        Ok(grid)
    }

    /// Mark the tile at `(col, row)` as checkpoint `checkpoint`.
    pub fn set_checkpoint(
        &mut self,
        col: usize,
        row: usize,
        checkpoint: usize,
    ) -> Result<(), TrackError> {
        if col >= self.width || row >= self.height {
            return Err(TrackError::CellOutOfBounds { col, row });
        }
        self.tiles[row * self.width + col].checkpoint = Some(checkpoint);
        Ok(())
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile by its stable map index.
    #[must_use]
    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }
}

impl TileMap for TileGrid {
    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn tile_at_cell(&self, col: i64, row: i64) -> Option<&Tile> {
        let col = usize::try_from(col).ok()?;
        let row = usize::try_from(row).ok()?;
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles.get(row * self.width + col)
    }
}

/// Lap-aware progress of one vehicle along the checkpoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackProgress {
    /// Completed laps.
    pub laps: u32,
    /// Index of the checkpoint the vehicle is heading for; equals the number
    /// of checkpoints already reached in the current lap.
    pub next_checkpoint: usize,
}

impl TrackProgress {
    /// Monotonic progress counter: `total × laps + next_checkpoint`.
    #[must_use]
    pub fn cumulative_checkpoints(&self, total: usize) -> usize {
        total * self.laps as usize + self.next_checkpoint
    }

    /// Record reaching the current target, wrapping into a new lap.
    pub fn advance(&mut self, total: usize) {
        self.next_checkpoint += 1;
        if self.next_checkpoint >= total {
            self.next_checkpoint = 0;
            self.laps += 1;
        }
    }
}

/// Ordered checkpoint positions with precomputed segment lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointTrack {
    positions: Vec<Vec2>,
    /// `segment_lengths[i]` is the distance from checkpoint `i - 1`
    /// (wrapping) to checkpoint `i`.
    segment_lengths: Vec<f32>,
    /// Inclusive prefix sums of `segment_lengths`.
    cumulative: Vec<f32>,
    total_length: f32,
}

impl CheckpointTrack {
    pub fn new(positions: Vec<Vec2>) -> Result<Self, TrackError> {
        if positions.is_empty() {
            return Err(TrackError::NoCheckpoints);
        }

        let n = positions.len();
        let segment_lengths: Vec<f32> = (0..n)
            .map(|i| positions[(i + n - 1) % n].distance(positions[i]))
            .collect();
        let cumulative: Vec<f32> = segment_lengths
            .iter()
            .scan(0.0, |acc, len| {
                *acc += len;
                Some(*acc)
            })
            .collect();
        let total_length = cumulative[n - 1];

        Ok(Self {
            positions,
            segment_lengths,
            cumulative,
            total_length,
        })
    }

    /// Collect checkpoint tiles from `grid`; indices must form `0..n`.
    pub fn from_grid(grid: &TileGrid) -> Result<Self, TrackError> {
        let mut marked: Vec<(usize, Vec2)> = grid
            .tiles()
            .iter()
            .filter_map(|t| t.checkpoint.map(|cp| (cp, t.center)))
            .collect();
        marked.sort_by_key(|(cp, _)| *cp);

        for (expected, window) in marked.iter().enumerate() {
            if window.0 < expected {
                return Err(TrackError::DuplicateCheckpoint(window.0));
            }
            if window.0 > expected {
                return Err(TrackError::MissingCheckpoint(expected));
            }
        }

        Self::new(marked.into_iter().map(|(_, p)| p).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    #[must_use]
    pub fn segment_lengths(&self) -> &[f32] {
        &self.segment_lengths
    }

    #[must_use]
    pub const fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Position of the checkpoint `progress` is heading for.
    #[must_use]
    pub fn next_position(&self, progress: &TrackProgress) -> Vec2 {
        self.positions[progress.next_checkpoint % self.positions.len()]
    }

    /// Straight-line distance from `position` to the next checkpoint.
    #[must_use]
    pub fn distance_to_next(&self, progress: &TrackProgress, position: Vec2) -> f32 {
        position.distance(self.next_position(progress))
    }

    /// Geometric lap progress, independent of any shaped reward.
    ///
    /// `laps × total_length + Σ segment_lengths[..=next] − distance_to_next`.
    #[must_use]
    pub fn traveled_distance(&self, progress: &TrackProgress, position: Vec2) -> f32 {
        let next = progress.next_checkpoint % self.positions.len();
        #[allow(clippy::cast_precision_loss)]
        let laps = progress.laps as f32;
        laps.mul_add(self.total_length, self.cumulative[next])
            - self.distance_to_next(progress, position)
    }

    /// Advance `progress` when `position` is within `reach_radius` of the
    /// next checkpoint. Returns whether a checkpoint was reached.
    pub fn update_progress(
        &self,
        progress: &mut TrackProgress,
        position: Vec2,
        reach_radius: f32,
    ) -> bool {
        if self.distance_to_next(progress, position) <= reach_radius {
            progress.advance(self.positions.len());
            true
        } else {
            false
        }
    }
}

//! On-disk formats: raw parameter files, per-generation fitness logs and
//! generation interval logs.
//!
//! Parameter files are a bare sequence of little-endian `f32` values in
//! genome order, with no header. The logs are JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::genome::Genome;

const F32_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parameter file of {len} bytes is not a whole number of f32 values")]
    Truncated { len: usize },
}

/// Write `genome` as raw little-endian `f32` values.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] if the file cannot be written.
pub fn save_parameters(path: impl AsRef<Path>, genome: &Genome) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let bytes: Vec<u8> = genome.genes().iter().flat_map(|g| g.to_le_bytes()).collect();
    fs::write(path, bytes)?;
    debug!(path = %path.display(), params = genome.len(), "saved parameters");
    Ok(())
}

/// Read a parameter file written by [`save_parameters`].
///
/// # Errors
///
/// Fails on I/O errors or when the byte length is not a multiple of four.
pub fn load_parameters(path: impl AsRef<Path>) -> Result<Genome, PersistenceError> {
    let bytes = fs::read(path)?;
    if bytes.len() % F32_BYTES != 0 {
        return Err(PersistenceError::Truncated { len: bytes.len() });
    }
    let genes = bytes
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<_>>();
    Ok(Genome::new(genes))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistenceError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Ranking scores of every agent, keyed by generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitnessLog {
    generations: BTreeMap<u32, Vec<f32>>,
}

impl FitnessLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the scores of `generation`, replacing any earlier record.
    pub fn record(&mut self, generation: u32, scores: Vec<f32>) {
        self.generations.insert(generation, scores);
    }

    #[must_use]
    pub fn get(&self, generation: u32) -> Option<&[f32]> {
        self.generations.get(&generation).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Generations in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[f32])> {
        self.generations.iter().map(|(&g, s)| (g, s.as_slice()))
    }

    /// # Errors
    ///
    /// Fails if serialisation or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        write_json(path, self)?;
        debug!(path = %path.display(), generations = self.len(), "saved fitness log");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the file is unreadable or not a fitness log.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        read_json(path.as_ref())
    }
}

/// Wall-span of one generation in seconds of simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationInterval {
    pub start: f64,
    pub end: f64,
}

impl GenerationInterval {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered list of generation intervals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalLog {
    intervals: Vec<GenerationInterval>,
}

impl IntervalLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, start: f64, end: f64) {
        self.intervals.push(GenerationInterval { start, end });
    }

    #[must_use]
    pub fn intervals(&self) -> &[GenerationInterval] {
        &self.intervals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// # Errors
    ///
    /// Fails if serialisation or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        write_json(path, self)?;
        debug!(path = %path.display(), intervals = self.len(), "saved interval log");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the file is unreadable or not an interval log.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        read_json(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_file_is_raw_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.bin");
        let genome = Genome::new(vec![1.0, -2.5, 0.0]);

        save_parameters(&path, &genome).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[4..8], &(-2.5f32).to_le_bytes());
        assert_eq!(load_parameters(&path).unwrap(), genome);
    }

    #[test]
    fn test_truncated_parameter_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        fs::write(&path, [0u8; 7]).unwrap();

        assert!(matches!(
            load_parameters(&path),
            Err(PersistenceError::Truncated { len: 7 })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_parameters(dir.path().join("nope.bin")),
            Err(PersistenceError::Io(_))
        ));
    }

    #[test]
    fn test_fitness_log_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitness.json");
        let mut log = FitnessLog::new();
        log.record(0, vec![1.0, 2.0]);
        log.record(1, vec![3.0]);
        log.record(1, vec![4.0]);

        log.save(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["0"], serde_json::json!([1.0, 2.0]));
        assert_eq!(value["1"], serde_json::json!([4.0]));
        assert_eq!(FitnessLog::load(&path).unwrap(), log);
    }

    #[test]
    fn test_interval_log_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intervals.json");
        let mut log = IntervalLog::new();
        log.push(0.0, 30.0);
        log.push(30.0, 41.5);

        log.save(&path).unwrap();

        let loaded = IntervalLog::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!((loaded.intervals()[1].duration() - 11.5).abs() < 1e-9);
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["end"], serde_json::json!(30.0));
    }
}

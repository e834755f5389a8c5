//! Persistence for individuals and run artifacts.
//!
//! Uses bincode for binary serialization and LZ4 for compression, behind a
//! small magic-and-version header.

use crate::evolve::RunStats;
use crate::graph::Individual;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for file format identification.
const MAGIC: &[u8; 4] = b"ECGP";

/// Current format version.
const VERSION: u8 = 1;

/// A saved run: its survivors plus enough metadata to reproduce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The final individuals of the run, best first.
    pub survivors: Vec<Individual>,
    /// Seed the run used.
    pub seed: u64,
    /// Statistics of the run.
    pub stats: RunStats,
}

/// Save a snapshot to a file with compression.
///
/// # Errors
///
/// Returns an error if serialization or file I/O fails.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> io::Result<()> {
    let encoded = bincode::serialize(snapshot)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let compressed = lz4_flex::compress_prepend_size(&encoded);

    let mut file = fs::File::create(path)?;
    file.write_all(MAGIC)?;
    file.write_all(&[VERSION])?;
    file.write_all(&compressed)?;
    Ok(())
}

/// Load a snapshot from a file.
///
/// # Errors
///
/// Returns an error if the file format is invalid or decompression fails.
pub fn load_snapshot(path: &Path) -> io::Result<Snapshot> {
    let mut file = fs::File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid file magic",
        ));
    }

    let mut version = [0u8; 1];
    file.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported version: {}", version[0]),
        ));
    }

    let mut compressed = Vec::new();
    file.read_to_end(&mut compressed)?;
    let decompressed = lz4_flex::decompress_size_prepended(&compressed)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    bincode::deserialize(&decompressed).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Path for the snapshot of one try.
#[must_use]
pub fn snapshot_path(output_dir: &Path, try_index: usize) -> PathBuf {
    output_dir.join(format!("best_individual_{try_index:03}.ecgp"))
}

/// Write a statistics report next to the snapshots as plain text.
///
/// # Errors
///
/// Returns an error if file I/O fails.
pub fn save_report(report: &str, output_dir: &Path, name: &str) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(format!("{name}.txt")), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionSet;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use tempfile::tempdir;

    fn snapshot(rng: &mut SmallRng) -> Snapshot {
        let mut survivor = Individual::random(rng, 15, 4, 1, FunctionSet::Extended, 5, Some(8));
        survivor.set_fitness(12).unwrap();
        Snapshot {
            survivors: vec![survivor],
            seed: 77,
            stats: RunStats {
                best_per_generation: vec![40, 25, 12],
                generations_run: 3,
                best_fitness: 12,
                solved: false,
                elapsed_seconds: 0.5,
            },
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut rng = SmallRng::seed_from_u64(81);
        let original = snapshot(&mut rng);

        let dir = tempdir().unwrap();
        let path = dir.path().join("run.ecgp");
        save_snapshot(&original, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded.survivors, original.survivors);
        assert_eq!(loaded.seed, 77);
        assert_eq!(loaded.stats.best_per_generation, vec![40, 25, 12]);
        assert!(loaded.survivors[0].has_fitness());
    }

    #[test]
    fn test_invalid_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ecgp");
        fs::write(&path, b"BAAD").unwrap();
        assert!(load_snapshot(&path).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.ecgp");
        let mut bytes = MAGIC.to_vec();
        bytes.push(99);
        fs::write(&path, bytes).unwrap();
        assert!(load_snapshot(&path).is_err());
    }
}

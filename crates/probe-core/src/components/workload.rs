//! # Workload Generator
//!
//! Produces the test payload for each iteration: a size drawn uniformly from
//! `[min_units, max_units]` size units, filled with random ASCII letters,
//! written to one fixed path that every iteration reuses.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::ProbeError;

/// Payload alphabet.
pub const PAYLOAD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One mebibyte, the default size unit.
pub const MIB: u64 = 1024 * 1024;

/// Generated payload description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPayload {
    /// Where the payload was written.
    pub path: PathBuf,
    /// Chosen multiplier.
    pub units: u32,
    /// Exact byte length.
    pub size_bytes: u64,
}

/// Random payload writer.
#[derive(Debug)]
pub struct WorkloadGenerator {
    path: PathBuf,
    size_unit: u64,
    min_units: u32,
    max_units: u32,
    rng: StdRng,
}

impl WorkloadGenerator {
    /// Generator writing to `dir/file_name`.
    pub fn new(
        dir: &Path,
        file_name: &str,
        size_unit: u64,
        min_units: u32,
        max_units: u32,
    ) -> Result<Self, ProbeError> {
        if size_unit == 0 {
            return Err(ProbeError::Config("size unit must be non-zero".into()));
        }
        if min_units == 0 || min_units > max_units {
            return Err(ProbeError::Config(format!(
                "invalid payload size range [{min_units}, {max_units}]"
            )));
        }
        if max_payload_bytes(size_unit, max_units).is_none() {
            return Err(ProbeError::Config(format!(
                "payload of {max_units} x {size_unit} bytes does not fit in memory"
            )));
        }
        Ok(Self {
            path: dir.join(file_name),
            size_unit,
            min_units,
            max_units,
            rng: StdRng::from_entropy(),
        })
    }

    /// Deterministic generator for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Fixed payload path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh payload, replacing any previous one.
    pub fn generate(&mut self) -> Result<GeneratedPayload, ProbeError> {
        let units = self.rng.gen_range(self.min_units..=self.max_units);
        let len = max_payload_bytes(self.size_unit, units).ok_or_else(|| {
            ProbeError::Config(format!("payload of {units} x {} bytes is too large", self.size_unit))
        })?;
        let size_bytes = len as u64;

        let mut data = vec![0u8; len];
        for byte in data.iter_mut() {
            *byte = PAYLOAD_ALPHABET[self.rng.gen_range(0..PAYLOAD_ALPHABET.len())];
        }

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed previous payload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ProbeError::io(&self.path, e)),
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| ProbeError::io(&self.path, e))?;
        file.write_all(&data)
            .and_then(|_| file.sync_all())
            .map_err(|e| ProbeError::io(&self.path, e))?;

        Ok(GeneratedPayload {
            path: self.path.clone(),
            units,
            size_bytes,
        })
    }
}

/// `size_unit * units` as a buffer length, `None` on overflow.
pub(crate) fn max_payload_bytes(size_unit: u64, units: u32) -> Option<usize> {
    size_unit
        .checked_mul(u64::from(units))
        .and_then(|bytes| usize::try_from(bytes).ok())
}

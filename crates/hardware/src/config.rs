//! Configuration system for the emulator.
//!
//! This module defines the configuration structures used to parameterize
//! the emulated machine. It provides:
//! 1. **Defaults:** Baseline machine constants (RAM geometry, PAL/SCB bases,
//!    branch predictor size).
//! 2. **Structures:** Hierarchical config for general, system, and pipeline
//!    concerns, deserializable from JSON.

use serde::Deserialize;

use crate::common::error::CoreError;

/// Default configuration constants.
mod defaults {
    /// Base physical address of main system RAM.
    pub const RAM_BASE: u64 = 0x0000_0000;

    /// Total size of main system RAM (128 MiB).
    pub const RAM_SIZE: usize = 128 * 1024 * 1024;

    /// PAL image base. Must be 32 KiB aligned (the vector computation masks
    /// the low 15 bits).
    pub const PAL_BASE: u64 = 0x0000_8000;

    /// System control block base.
    pub const SCBB: u64 = 0x0001_0000;

    /// Branch target buffer entries (power of 2).
    pub const BTB_SIZE: usize = 512;

    /// Number of emulated CPUs.
    pub const NUM_CPUS: usize = 1;

    /// Process-cycle-counter division ratio.
    pub const PCC_RATIO: u32 = 1;
}

/// General options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Per-stage instruction tracing.
    pub trace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { trace: false }
    }
}

/// Machine geometry.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Number of CPUs.
    pub num_cpus: usize,
    /// RAM base physical address.
    pub ram_base: u64,
    /// RAM size in bytes.
    pub ram_size: usize,
    /// PAL image base (32 KiB aligned).
    pub pal_base: u64,
    /// System control block base.
    pub scbb: u64,
    /// Process-cycle-counter division ratio.
    pub pcc_ratio: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cpus: defaults::NUM_CPUS,
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            pal_base: defaults::PAL_BASE,
            scbb: defaults::SCBB,
            pcc_ratio: defaults::PCC_RATIO,
        }
    }
}

/// Pipeline options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Branch target buffer entries.
    pub btb_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            btb_size: defaults::BTB_SIZE,
        }
    }
}

/// Root configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General options.
    pub general: GeneralConfig,
    /// Machine geometry.
    pub system: SystemConfig,
    /// Pipeline options.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

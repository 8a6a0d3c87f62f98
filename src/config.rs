//! Configuration for spectralog
//!
//! Centralized configuration with defaults matching the W1 sensor board.

use std::time::Duration;

use crate::error::{Result, StorageError};

/// Main configuration for a log store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// SPI chip-select pin the card reader is wired to
    pub cs_pin: u8,

    /// Accept writes without persisting them (for debugging the card path)
    pub no_save: bool,

    // -------------------------------------------------------------------------
    // File Naming
    // -------------------------------------------------------------------------
    /// Base name of the log file, without extension
    /// Layout on the card:
    ///   {log_filename}{file_ext}                    (CSV log)
    ///   {log_filename}{metadata_suffix}{file_ext}   (record counter)
    pub log_filename: String,

    /// Suffix appended to the base name for the counter file
    pub metadata_suffix: String,

    /// Extension shared by both files
    pub file_ext: String,

    // -------------------------------------------------------------------------
    // Header Configuration
    // -------------------------------------------------------------------------
    /// Wavelength columns emitted in the CSV header
    pub wavelengths: WavelengthRange,

    // -------------------------------------------------------------------------
    // I/O Tuning
    // -------------------------------------------------------------------------
    /// How hard to try when the card refuses an open
    pub retry: RetryPolicy,

    /// Hard cap on bytes returned by a single absolute line read
    pub read_cap: usize,

    /// Width of the fixed counter slot in the metadata file (bytes)
    pub counter_slot_width: usize,
}

/// Inclusive wavelength range in nanometres, stepped by the sensor resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavelengthRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl WavelengthRange {
    pub fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    /// Iterate every sampled wavelength, `min..=max` by `step`
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        // step 0 is rejected by validate(); guard here so iteration always ends
        let step = self.step.max(1) as usize;
        (self.min..=self.max).step_by(step)
    }
}

impl Default for WavelengthRange {
    fn default() -> Self {
        Self {
            min: 340,
            max: 1010,
            step: 5,
        }
    }
}

/// Bounded polling retry for opens on removable storage
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Pause between attempts (zero = tight polling)
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::ZERO,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cs_pin: 4,
            no_save: false,
            log_filename: "LOG1".to_string(),
            metadata_suffix: "_META".to_string(),
            file_ext: ".CSV".to_string(),
            wavelengths: WavelengthRange::default(),
            retry: RetryPolicy::default(),
            read_cap: 5000,
            counter_slot_width: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Name of the CSV log file on the card
    pub fn log_path(&self) -> String {
        format!("{}{}", self.log_filename, self.file_ext)
    }

    /// Name of the counter sidecar file on the card
    pub fn metadata_path(&self) -> String {
        format!("{}{}{}", self.log_filename, self.metadata_suffix, self.file_ext)
    }

    /// Reject configurations the store cannot operate with
    pub fn validate(&self) -> Result<()> {
        let w = &self.wavelengths;
        if w.step == 0 {
            return Err(StorageError::Config("wavelength step must be > 0".into()));
        }
        if w.min > w.max {
            return Err(StorageError::Config(format!(
                "min wavelength {} exceeds max wavelength {}",
                w.min, w.max
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(StorageError::Config("retry attempts must be > 0".into()));
        }
        if self.read_cap == 0 {
            return Err(StorageError::Config("read cap must be > 0".into()));
        }
        if self.counter_slot_width == 0 {
            return Err(StorageError::Config("counter slot width must be > 0".into()));
        }
        if self.log_filename.is_empty() {
            return Err(StorageError::Config("log filename must not be empty".into()));
        }

        for (label, part) in [
            ("log filename", &self.log_filename),
            ("metadata suffix", &self.metadata_suffix),
            ("file extension", &self.file_ext),
        ] {
            if part.contains(&['/', '\\', '\n', '\r'][..]) {
                return Err(StorageError::Config(format!(
                    "{} {:?} contains a path separator or line break",
                    label, part
                )));
            }
        }

        if self.metadata_suffix.is_empty() {
            return Err(StorageError::Config(
                "metadata suffix must not be empty (it would alias the log file)".into(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the chip-select pin of the card reader
    pub fn cs_pin(mut self, pin: u8) -> Self {
        self.config.cs_pin = pin;
        self
    }

    /// Enable or disable no-save mode
    pub fn no_save(mut self, enabled: bool) -> Self {
        self.config.no_save = enabled;
        self
    }

    /// Set the base name of the log file
    pub fn log_filename(mut self, name: impl Into<String>) -> Self {
        self.config.log_filename = name.into();
        self
    }

    /// Set the suffix identifying the counter file
    pub fn metadata_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.metadata_suffix = suffix.into();
        self
    }

    /// Set the file extension (including the dot)
    pub fn file_ext(mut self, ext: impl Into<String>) -> Self {
        self.config.file_ext = ext.into();
        self
    }

    /// Set the header wavelength range
    pub fn wavelengths(mut self, min: u32, max: u32, step: u32) -> Self {
        self.config.wavelengths = WavelengthRange::new(min, max, step);
        self
    }

    /// Set the number of open attempts before giving up
    pub fn open_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Set the pause between open attempts
    pub fn open_retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    /// Set the absolute line read cap (in bytes)
    pub fn read_cap(mut self, bytes: usize) -> Self {
        self.config.read_cap = bytes;
        self
    }

    /// Set the counter slot width (in bytes)
    pub fn counter_slot_width(mut self, width: usize) -> Self {
        self.config.counter_slot_width = width;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

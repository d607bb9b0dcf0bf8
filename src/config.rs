use crate::error::{QuietcutError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Target sample rate for audio analysis, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Samples per loudness chunk (0.1 s at 44.1 kHz).
pub const DEFAULT_CHUNK_SIZE: usize = 4_410;

/// Default volume percentage used to derive the drop threshold.
pub const DEFAULT_VOLUME_PERCENTAGE: f64 = 4.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Threshold knob in `[0, 10]`; the drop threshold is
    /// `max_volume * (volume_percentage / 10)`.
    pub volume_percentage: f64,
    /// Sample rate the decoder resamples to.
    pub sample_rate: u32,
    /// Samples per loudness-measurement chunk.
    pub chunk_size: usize,
    /// Number of files processed concurrently.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volume_percentage: DEFAULT_VOLUME_PERCENTAGE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(pct) = std::env::var("QUIETCUT_VOLUME_PERCENTAGE") {
            if let Ok(p) = pct.parse() {
                config.volume_percentage = p;
            }
        }
        if let Ok(rate) = std::env::var("QUIETCUT_SAMPLE_RATE") {
            if let Ok(r) = rate.parse() {
                config.sample_rate = r;
            }
        }
        if let Ok(size) = std::env::var("QUIETCUT_CHUNK_SIZE") {
            if let Ok(s) = size.parse() {
                config.chunk_size = s;
            }
        }
        if let Ok(concurrency) = std::env::var("QUIETCUT_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.volume_percentage) {
            return Err(QuietcutError::InvalidConfig(format!(
                "volume_percentage must be between 0 and 10, got {}",
                self.volume_percentage
            )));
        }

        if self.sample_rate == 0 {
            return Err(QuietcutError::InvalidConfig(
                "sample_rate must be greater than 0".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(QuietcutError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(QuietcutError::InvalidConfig(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("quietcut").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.volume_percentage, 4.0);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.chunk_size, 4_410);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_percentage_range() {
        let mut config = Config::default();
        config.volume_percentage = -0.1;
        assert!(config.validate().is_err());

        config.volume_percentage = 10.1;
        assert!(config.validate().is_err());

        config.volume_percentage = 0.0;
        assert!(config.validate().is_ok());

        config.volume_percentage = 10.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_fields() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }
}

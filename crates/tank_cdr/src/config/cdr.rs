//! Collision module settings

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Which penetration probability model drives stochastic outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenetrationSystem {
    /// US proving-ground regression (0 below 0.88 P/R, 1 above 1.12)
    Us,
    /// Soviet model; no data yet, draws a uniform probability
    Ru,
}

/// # Collision Module Configuration
///
/// Realism switches and tuning values for detection and response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CdrConfig {
    /// Append evaluations to the penetration log
    pub pen_log_enabled: bool,
    /// Path of the penetration log file
    pub pen_log_path: String,
    /// Apply the shell diameter correction to slope effects
    pub diameter_fix: bool,
    /// Probability model
    pub penetration_system: PenetrationSystem,
    /// Scales projectile velocity into scene units per second
    pub velocity_multiplier: f32,
    /// Maximum number of follow-up ricochet passes for one impact
    pub ricochet_chain_limit: u32,
    /// Fixed seed for reproducible outcomes
    pub rng_seed: Option<u64>,
}

impl Default for CdrConfig {
    fn default() -> Self {
        Self {
            pen_log_enabled: true,
            pen_log_path: "penetration.log".to_string(),
            diameter_fix: false,
            penetration_system: PenetrationSystem::Us,
            velocity_multiplier: 0.472,
            ricochet_chain_limit: 4,
            rng_seed: None,
        }
    }
}

impl Config for CdrConfig {}

impl CdrConfig {
    /// Enable or disable the penetration log
    pub fn with_pen_log(mut self, enabled: bool) -> Self {
        self.pen_log_enabled = enabled;
        self
    }

    /// Set the penetration log path
    pub fn with_pen_log_path(mut self, path: impl Into<String>) -> Self {
        self.pen_log_path = path.into();
        self
    }

    /// Enable or disable the diameter fix
    pub fn with_diameter_fix(mut self, enabled: bool) -> Self {
        self.diameter_fix = enabled;
        self
    }

    /// Select the probability model
    pub fn with_penetration_system(mut self, system: PenetrationSystem) -> Self {
        self.penetration_system = system;
        self
    }

    /// Use a fixed random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Limit ricochet follow-up passes
    pub fn with_ricochet_chain_limit(mut self, limit: u32) -> Self {
        self.ricochet_chain_limit = limit;
        self
    }

    /// Validate values
    pub fn validate(&self) -> Result<(), String> {
        if !(self.velocity_multiplier > 0.0 && self.velocity_multiplier.is_finite()) {
            return Err(format!(
                "velocity_multiplier must be positive, got {}",
                self.velocity_multiplier
            ));
        }
        if self.pen_log_enabled && self.pen_log_path.trim().is_empty() {
            return Err("pen_log_path is empty while the log is enabled".to_string());
        }
        Ok(())
    }

    /// Load from a `.toml` or `.ron` file and validate
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = CdrConfig::default();
        assert!(config.pen_log_enabled);
        assert_eq!(config.pen_log_path, "penetration.log");
        assert_eq!(config.penetration_system, PenetrationSystem::Us);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_validation() {
        let mut config = CdrConfig::default()
            .with_pen_log(false)
            .with_diameter_fix(true)
            .with_seed(7);
        assert!(!config.pen_log_enabled);
        assert!(config.diameter_fix);
        assert_eq!(config.rng_seed, Some(7));

        config.velocity_multiplier = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml_and_ron() {
        let toml_text = "diameter_fix = true\npenetration_system = \"Ru\"\n";
        let config = CdrConfig::from_str_with_format(toml_text, "cdr.toml").unwrap();
        assert!(config.diameter_fix);
        assert_eq!(config.penetration_system, PenetrationSystem::Ru);
        assert!(config.pen_log_enabled);

        let ron_text = "(pen_log_enabled: false, ricochet_chain_limit: 2)";
        let config = CdrConfig::from_str_with_format(ron_text, "cdr.ron").unwrap();
        assert!(!config.pen_log_enabled);
        assert_eq!(config.ricochet_chain_limit, 2);

        assert!(matches!(
            CdrConfig::from_str_with_format("", "cdr.ini"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}

//! Simulation error types.
//!
//! Only sequencing bugs and bad configuration are errors. Expected no-op
//! conditions (a container rejecting an ammo type, a projectile brushing its
//! own weapon mount, explosions switched off) are not represented here.

use thiserror::Error;

/// Top-level error enum for the battler simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A physics-dependent operation ran before `start_match` built the arena.
    #[error("physics world not initialized (during '{context}')")]
    WorldNotInitialized {
        /// Operation that needed the world.
        context: &'static str,
    },

    /// A configuration value failed validation.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Configuration JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// A best-effort collaborator (audio, stats, banter) failed.
    #[error("{hook} hook failed: {message}")]
    Hook {
        hook: &'static str,
        message: String,
    },
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SimError::WorldNotInitialized { context: "explode_at" };
        assert_eq!(
            err.to_string(),
            "physics world not initialized (during 'explode_at')"
        );

        let err = SimError::invalid("core.segments", "must be at least 6");
        assert!(err.to_string().contains("core.segments"));
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SimError = parse.into();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }
}

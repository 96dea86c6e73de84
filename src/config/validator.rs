use crate::config::Config;
use crate::error::{Result, RetriageError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_thresholds(config, &mut errors);
        Self::validate_weights(config, &mut errors);
        Self::validate_clustering(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RetriageError::ConfigValidation { errors })
        }
    }

    fn validate_thresholds(config: &Config, errors: &mut Vec<ValidationError>) {
        let t = &config.thresholds;
        let entries = [
            ("thresholds.title", t.title),
            ("thresholds.description", t.description),
            ("thresholds.code", t.code),
            ("thresholds.url", t.url),
        ];
        for (path, value) in entries {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    path,
                    format!("Threshold must lie in [0, 1], got {}", value),
                ));
            }
        }

        // A zero overall threshold would make every report a duplicate of
        // every other and break confidence scaling.
        if !(t.overall > 0.0 && t.overall <= 1.0) {
            errors.push(ValidationError::new(
                "thresholds.overall",
                format!("Overall threshold must lie in (0, 1], got {}", t.overall),
            ));
        }
    }

    fn validate_weights(config: &Config, errors: &mut Vec<ValidationError>) {
        let w = &config.weights;
        let entries = [
            ("weights.title", w.title),
            ("weights.description", w.description),
            ("weights.code", w.code),
            ("weights.url", w.url),
            ("weights.component_bonus", w.component_bonus),
        ];
        for (path, value) in entries {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must lie in [0, 1], got {}", value),
                ));
            }
        }
    }

    fn validate_clustering(config: &Config, errors: &mut Vec<ValidationError>) {
        let c = &config.clustering;
        if !(0.0..=1.0).contains(&c.threshold) {
            errors.push(ValidationError::new(
                "clustering.threshold",
                format!("Clustering threshold must lie in [0, 1], got {}", c.threshold),
            ));
        }
        if c.expansion_limit == 0 {
            errors.push(ValidationError::new(
                "clustering.expansion_limit",
                "Expansion limit must be greater than 0",
            ));
        }
    }
}

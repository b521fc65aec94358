use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cluster::ClusterParams;
use crate::models::linear::ClassifierPolicy;
use crate::scoring::distinctive::DistinctiveFn;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy; command-line flags
/// override whatever is set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for word clouds, highlighted documents and JSON scores
    pub results_dir: PathBuf,
    /// Which linear classifier the attribution engine trains (default: svm)
    pub classifier: ClassifierPolicy,
    /// How the distinctive-word engine combines tpr and fpr (default: quotdiff)
    pub distinctive: DistinctiveFn,
    /// DBSCAN parameters of the clustering fallback
    pub cluster: ClusterParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("./results"),
            classifier: ClassifierPolicy::default(),
            distinctive: DistinctiveFn::default(),
            cluster: ClusterParams::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to the defaults; set but unparseable ones
    /// are an error rather than being silently ignored.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            results_dir: env::var("TEXTCATVIS_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            classifier: parse_var("TEXTCATVIS_CLASSIFIER")?.unwrap_or(defaults.classifier),
            distinctive: parse_var("TEXTCATVIS_DISTINCTIVE")?.unwrap_or(defaults.distinctive),
            cluster: ClusterParams {
                eps: parse_var("TEXTCATVIS_CLUSTER_EPS")?.unwrap_or(defaults.cluster.eps),
                min_samples: parse_var("TEXTCATVIS_CLUSTER_MIN_SAMPLES")?
                    .unwrap_or(defaults.cluster.min_samples),
            },
        })
    }

    /// Check that the clustering parameters make sense.
    pub fn validate(&self) -> Result<()> {
        if !(self.cluster.eps > 0.0 && self.cluster.eps.is_finite()) {
            anyhow::bail!(
                "TEXTCATVIS_CLUSTER_EPS must be a positive number, got {}",
                self.cluster.eps
            );
        }
        if self.cluster.min_samples == 0 {
            anyhow::bail!("TEXTCATVIS_CLUSTER_MIN_SAMPLES must be at least 1");
        }
        Ok(())
    }
}

/// Parse an optional environment variable. Unset (or empty) is `None`.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value {raw:?} for {name}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.results_dir, PathBuf::from("./results"));
        assert_eq!(config.classifier, ClassifierPolicy::LinearSvm);
        assert_eq!(config.distinctive, DistinctiveFn::QuotDiff);
        assert!((config.cluster.eps - 0.45).abs() < 1e-12);
        assert_eq!(config.cluster.min_samples, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // Variable names unique to this test so parallel tests don't collide
        env::set_var("TEXTCATVIS_TEST_PARSE_OK", " 0.3 ");
        env::set_var("TEXTCATVIS_TEST_PARSE_BAD", "lots");
        assert_eq!(parse_var::<f64>("TEXTCATVIS_TEST_PARSE_OK").unwrap(), Some(0.3));
        let err = parse_var::<f64>("TEXTCATVIS_TEST_PARSE_BAD").unwrap_err();
        assert!(format!("{err:#}").contains("TEXTCATVIS_TEST_PARSE_BAD"));
        assert_eq!(parse_var::<usize>("TEXTCATVIS_TEST_PARSE_UNSET").unwrap(), None);
    }

    #[test]
    fn test_validate_rejects_bad_eps() {
        let mut config = Config::default();
        config.cluster.eps = -1.0;
        assert!(config.validate().is_err());
    }
}

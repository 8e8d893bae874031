use crate::app_dirs::AppDirs;
use crate::error::{QuizError, Result};
use crate::generator::is_candidate;
use crate::session::Difficulty;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Closed interval `[min, max]` questions are drawn from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberRange {
    pub min: u64,
    pub max: u64,
}

impl NumberRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, n: u64) -> bool {
        (self.min..=self.max).contains(&n)
    }

    /// True if at least one odd non-multiple of five lies inside the range.
    /// Any ten consecutive integers contain one, so only short ranges need a scan.
    pub fn has_candidate(&self) -> bool {
        if self.min > self.max {
            return false;
        }
        if self.max - self.min >= 10 {
            return true;
        }
        (self.min..=self.max).any(is_candidate)
    }
}

/// Game parameters, fixed for the lifetime of the process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub question_count: u32,
    pub survival_secs: f64,
    pub penalty_secs: f64,
    pub early: NumberRange,
    pub mid: NumberRange,
    pub late: NumberRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: 10,
            survival_secs: 180.0,
            penalty_secs: 10.0,
            early: NumberRange::new(11, 1000),
            mid: NumberRange::new(1001, 10000),
            late: NumberRange::new(10001, 50000),
        }
    }
}

impl Config {
    pub fn range_for(&self, difficulty: Difficulty) -> NumberRange {
        match difficulty {
            Difficulty::Early => self.early,
            Difficulty::Mid => self.mid,
            Difficulty::Late => self.late,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.question_count == 0 {
            return Err(QuizError::Config(
                "question_count must be at least 1".to_string(),
            ));
        }
        if !(self.survival_secs > 0.0) {
            return Err(QuizError::Config(
                "survival_secs must be positive".to_string(),
            ));
        }
        if !(self.penalty_secs >= 0.0) {
            return Err(QuizError::Config(
                "penalty_secs must not be negative".to_string(),
            ));
        }

        let mut previous: Option<(Difficulty, NumberRange)> = None;
        for difficulty in Difficulty::ALL {
            let range = self.range_for(difficulty);
            if range.min < 2 || range.min > range.max {
                return Err(QuizError::Config(format!(
                    "{difficulty} range [{}, {}] must satisfy 2 <= min <= max",
                    range.min, range.max
                )));
            }
            if !range.has_candidate() {
                return Err(QuizError::Config(format!(
                    "{difficulty} range [{}, {}] holds no odd number that is not a multiple of 5",
                    range.min, range.max
                )));
            }
            if let Some((prev_difficulty, prev)) = previous {
                if range.min <= prev.max {
                    return Err(QuizError::Config(format!(
                        "{difficulty} range must start above the {prev_difficulty} range (ends at {})",
                        prev.max
                    )));
                }
            }
            previous = Some((difficulty, range));
        }

        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("primo_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "unreadable config, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            question_count: 5,
            survival_secs: 60.0,
            penalty_secs: 5.0,
            early: NumberRange::new(3, 99),
            mid: NumberRange::new(101, 999),
            late: NumberRange::new(1001, 9999),
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "question_count": 3 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.question_count, 3);
        assert_eq!(cfg.survival_secs, 180.0);
        assert_eq!(cfg.mid, NumberRange::new(1001, 10000));
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let cfg = Config {
            mid: NumberRange::new(900, 10000),
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(QuizError::Config(_)));
    }

    #[test]
    fn decreasing_ranges_rejected() {
        let cfg = Config {
            early: NumberRange::new(10001, 50000),
            late: NumberRange::new(11, 1000),
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(QuizError::Config(_)));
    }

    #[test]
    fn range_without_candidate_rejected() {
        let ok = Config {
            early: NumberRange::new(20, 21),
            ..Config::default()
        };
        assert!(ok.validate().is_ok());

        // only 25 is odd here
        let bad = Config {
            early: NumberRange::new(24, 26),
            ..Config::default()
        };
        assert_matches!(bad.validate(), Err(QuizError::Config(_)));
    }

    #[test]
    fn zero_question_count_rejected() {
        let cfg = Config {
            question_count: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(QuizError::Config(_)));
    }

    #[test]
    fn nonpositive_survival_rejected() {
        let cfg = Config {
            survival_secs: 0.0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(QuizError::Config(_)));
    }

    #[test]
    fn range_for_maps_each_difficulty() {
        let cfg = Config::default();
        assert_eq!(cfg.range_for(Difficulty::Early), NumberRange::new(11, 1000));
        assert_eq!(cfg.range_for(Difficulty::Mid), NumberRange::new(1001, 10000));
        assert_eq!(cfg.range_for(Difficulty::Late), NumberRange::new(10001, 50000));
    }
}

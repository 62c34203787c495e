// src/config.rs
//! Run configuration: an optional YAML file overlaid by command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::detect::DetectConfig;
use crate::error::ConfigError;
use crate::pivot::{DuplicatePolicy, GroupBy};

pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// A target year as written in a config file: `2024`, `2024.0` or `"2024"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum YearSetting {
    Int(i64),
    Float(f64),
    Text(String),
}

impl YearSetting {
    fn as_text(&self) -> String {
        match self {
            YearSetting::Int(y) => y.to_string(),
            YearSetting::Float(y) => y.to_string(),
            YearSetting::Text(s) => s.clone(),
        }
    }
}

/// Unresolved settings. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub target_year: Option<YearSetting>,
    /// `jurisdiction`, `category` or `none`.
    pub split_by: Option<String>,
    /// `keep-first` or `reject`.
    pub on_duplicate: Option<String>,
}

/// Validated settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub detect: DetectConfig,
    pub split_by: Option<GroupBy>,
    pub on_duplicate: DuplicatePolicy,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(mut self, other: Settings) -> Self {
        if other.input.is_some() {
            self.input = other.input;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.target_year.is_some() {
            self.target_year = other.target_year;
        }
        if other.split_by.is_some() {
            self.split_by = other.split_by;
        }
        if other.on_duplicate.is_some() {
            self.on_duplicate = other.on_duplicate;
        }
        self
    }

    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let input = self.input.ok_or(ConfigError::MissingSetting("input"))?;
        let output = self.output.ok_or(ConfigError::MissingSetting("output"))?;
        let year = self
            .target_year
            .ok_or(ConfigError::MissingSetting("target_year"))?;
        let detect = DetectConfig::parse(
            self.threshold.unwrap_or(DEFAULT_THRESHOLD),
            &year.as_text(),
        )?;

        let split_by = match self.split_by.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("none") => None,
            Some(s) => {
                Some(GroupBy::from_str(s).ok_or_else(|| ConfigError::UnknownSplitMode(s.to_string()))?)
            }
        };
        let on_duplicate = match self.on_duplicate.as_deref() {
            None => DuplicatePolicy::default(),
            Some(s) => DuplicatePolicy::from_str(s)
                .ok_or_else(|| ConfigError::UnknownDuplicatePolicy(s.to_string()))?,
        };

        Ok(RunConfig {
            input,
            output,
            detect,
            split_by,
            on_duplicate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(threshold: Option<f64>, year: Option<&str>) -> Settings {
        Settings {
            input: Some("in.csv".into()),
            output: Some("out".into()),
            threshold,
            target_year: year.map(|y| YearSetting::Text(y.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn cli_overrides_file_values() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(
            tmp,
            "threshold: 3.5\ntarget_year: 2023\nsplit_by: category\non_duplicate: reject"
        )?;
        let file = Settings::from_yaml_file(tmp.path())?;
        assert_eq!(file.target_year, Some(YearSetting::Int(2023)));

        let run = file.merge(cli(None, Some("2024.0"))).resolve()?;
        assert_eq!(run.detect.threshold(), 3.5);
        assert_eq!(run.detect.target_year(), 2024);
        assert_eq!(run.split_by, Some(GroupBy::Category));
        assert_eq!(run.on_duplicate, DuplicatePolicy::Reject);
        assert_eq!(run.input, PathBuf::from("in.csv"));
        Ok(())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let run = cli(None, Some("2024")).resolve().unwrap();
        assert_eq!(run.detect.threshold(), DEFAULT_THRESHOLD);
        assert_eq!(run.split_by, None);
        assert_eq!(run.on_duplicate, DuplicatePolicy::KeepFirst);

        let mut s = cli(None, Some("2024"));
        s.split_by = Some("None".into());
        assert_eq!(s.resolve().unwrap().split_by, None);
    }

    #[test]
    fn invalid_settings_are_config_errors() {
        assert_eq!(
            cli(Some(0.0), Some("2024")).resolve().unwrap_err(),
            ConfigError::InvalidThreshold(0.0)
        );
        assert_eq!(
            cli(None, Some("2024.5")).resolve().unwrap_err(),
            ConfigError::InvalidTargetYear("2024.5".into())
        );
        assert_eq!(
            cli(None, None).resolve().unwrap_err(),
            ConfigError::MissingSetting("target_year")
        );

        let mut s = cli(None, Some("2024"));
        s.split_by = Some("year".into());
        assert_eq!(
            s.resolve().unwrap_err(),
            ConfigError::UnknownSplitMode("year".into())
        );

        let mut s = cli(None, Some("2024"));
        s.on_duplicate = Some("merge".into());
        assert_eq!(
            s.resolve().unwrap_err(),
            ConfigError::UnknownDuplicatePolicy("merge".into())
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_yaml("thresold: 2.0").is_err());
    }
}

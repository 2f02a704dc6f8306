//! Repository configuration.
//!
//! ```toml
//! policy = "strict"              # or "first_match"
//! default_standards = ["DVB"]
//!
//! [[extra_pid_standards]]
//! pid = 0x0100
//! standards = ["SCTE"]
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::pid::{Pid, PidTable, PID_MAX};
use crate::resolver::ResolvePolicy;
use crate::standards::Standards;

/// Resolution settings applied to every query of a registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Behaviour when context cannot pick a single entry.
    pub policy: ResolvePolicy,
    /// Standards assumed when a query carries none.
    pub default_standards: Vec<String>,
    /// Additional PID to standards associations.
    pub extra_pid_standards: Vec<PidStandards>,
}

/// One additional PID association.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PidStandards {
    /// PID value.
    pub pid: Pid,
    /// Standards conventionally using this PID.
    pub standards: Vec<String>,
}

/// Configuration with names resolved to masks.
#[derive(Debug, Clone, Default)]
pub(crate) struct Settings {
    pub policy: ResolvePolicy,
    pub default_standards: Standards,
    pub pid_table: PidTable,
}

impl RepositoryConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RepositoryConfig = toml::from_str(s)?;
        // Reject bad names now rather than at registry construction.
        config.settings()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading repository configuration from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub(crate) fn settings(&self) -> Result<Settings, ConfigError> {
        let default_standards = parse_names(&self.default_standards)?;

        let mut pid_table = PidTable::new();
        for extra in &self.extra_pid_standards {
            if extra.pid > PID_MAX {
                return Err(ConfigError::InvalidPid(extra.pid));
            }
            pid_table.add(extra.pid, parse_names(&extra.standards)?);
        }

        Ok(Settings {
            policy: self.policy,
            default_standards,
            pid_table,
        })
    }
}

fn parse_names(names: &[String]) -> Result<Standards, ConfigError> {
    names.iter().try_fold(Standards::NONE, |acc, name| {
        Ok(acc | name.parse::<Standards>()?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepositoryConfig::from_toml_str("").unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.policy, ResolvePolicy::Strict);
        assert_eq!(settings.default_standards, Standards::NONE);
        assert_eq!(settings.pid_table.standards(0x0100), Standards::NONE);
    }

    #[test]
    fn test_full_config() {
        let config = RepositoryConfig::from_toml_str(
            r#"
            policy = "first_match"
            default_standards = ["DVB", "isdb"]

            [[extra_pid_standards]]
            pid = 0x0100
            standards = ["SCTE"]
            "#,
        )
        .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.policy, ResolvePolicy::FirstMatch);
        assert_eq!(settings.default_standards, Standards::DVB | Standards::ISDB);
        assert_eq!(settings.pid_table.standards(0x0100), Standards::SCTE);
    }

    #[test]
    fn test_unknown_standard_is_rejected() {
        let err = RepositoryConfig::from_toml_str(r#"default_standards = ["DAB"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStandard(_)));
    }

    #[test]
    fn test_invalid_pid_is_rejected() {
        let err = RepositoryConfig::from_toml_str(
            r#"
            [[extra_pid_standards]]
            pid = 0x2000
            standards = ["ATSC"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPid(0x2000)));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = RepositoryConfig::from_toml_str(r#"policy = "random""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RepositoryConfig::load(Path::new("/nonexistent/psi-repository.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

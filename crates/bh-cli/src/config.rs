use std::path::{Path, PathBuf};

use anyhow::Context;
use bh_ledger::CommitMode;
use bh_records::OrchestratorConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "bh.toml";

/// Optional `bh.toml` in the data directory.
///
/// ```toml
/// key_file = "/home/asha/.bh-key"
/// ledger_mode = "compare-and-swap"
///
/// [orchestrator]
/// read_policy = "tolerate-stale"
/// expect_prior_pointer = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub key_file: Option<PathBuf>,
    pub ledger_mode: CommitMode,
    pub orchestrator: OrchestratorConfig,
}

impl CliConfig {
    /// Load `bh.toml` from `data_dir`; a missing file gives the defaults.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// The key file: explicit flag, then config, then `<data_dir>/key`.
    pub fn key_path(&self, data_dir: &Path, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.key_file.clone())
            .unwrap_or_else(|| data_dir.join("key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bh_records::ReadPolicy;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CliConfig::load(dir.path()).unwrap(), CliConfig::default());
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
ledger_mode = "compare-and-swap"

[orchestrator]
read_policy = "tolerate-stale"
expect_prior_pointer = true

[orchestrator.fetch_retry]
max_attempts = 3
"#,
        )
        .unwrap();
        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.ledger_mode, CommitMode::CompareAndSwap);
        assert_eq!(config.orchestrator.read_policy, ReadPolicy::TolerateStale);
        assert!(config.orchestrator.expect_prior_pointer);
        assert_eq!(config.orchestrator.fetch_retry.unwrap().max_attempts, 3);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "ledger_mode = 7").unwrap();
        assert!(CliConfig::load(dir.path()).is_err());
    }

    #[test]
    fn key_path_precedence() {
        let data = Path::new("/data");
        let mut config = CliConfig::default();
        assert_eq!(config.key_path(data, None), PathBuf::from("/data/key"));
        config.key_file = Some(PathBuf::from("/etc/bh/key"));
        assert_eq!(config.key_path(data, None), PathBuf::from("/etc/bh/key"));
        assert_eq!(
            config.key_path(data, Some(Path::new("/tmp/k"))),
            PathBuf::from("/tmp/k")
        );
    }
}

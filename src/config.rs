use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::document::DocumentSource;
use crate::domain::SubjectId;
use crate::error::DashError;
use crate::ranking::DEFAULT_TOP_K;

pub const CONFIG_FILE_NAME: &str = "otu-dash.json";
pub const DEFAULT_DATA: &str = "samples.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub initial_subject: Option<String>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data: Option<String>,
    pub top_k: Option<usize>,
    pub strict: bool,
    pub initial_subject: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data: DocumentSource,
    pub top_k: usize,
    pub strict: bool,
    pub initial_subject: Option<SubjectId>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads the config from `path`, or from the first of `./otu-dash.json`
    /// and `<config dir>/otu-dash/otu-dash.json` that exists. No file at all
    /// means built-in defaults; an explicit `path` must exist.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, DashError> {
        let config = match path {
            Some(path) => Self::read(Utf8Path::new(path))?,
            None => match Self::discover() {
                Some(found) => Self::read(&found)?,
                None => Config::default(),
            },
        };
        Self::resolve_config(config, overrides)
    }

    pub fn read(path: &Utf8Path) -> Result<Config, DashError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| DashError::ConfigRead(path.to_string()))?;
        let config = serde_json::from_str(&content)
            .map_err(|err| DashError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %path, "config loaded");
        Ok(config)
    }

    fn discover() -> Option<Utf8PathBuf> {
        let local = Utf8PathBuf::from(CONFIG_FILE_NAME);
        if local.as_std_path().exists() {
            return Some(local);
        }
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.config_dir().join("otu-dash").join(CONFIG_FILE_NAME),
                )
                .ok()
            })
            .filter(|path| path.as_std_path().exists())
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, DashError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let data = overrides
            .data
            .or(config.data)
            .unwrap_or_else(|| DEFAULT_DATA.to_string())
            .parse::<DocumentSource>()?;

        let top_k = overrides
            .top_k
            .or(config.top_k)
            .unwrap_or(DEFAULT_TOP_K);

        let initial_subject = overrides
            .initial_subject
            .or(config.initial_subject)
            .map(|raw| raw.parse::<SubjectId>())
            .transpose()?;

        Ok(ResolvedConfig {
            schema_version,
            data,
            top_k,
            strict: overrides.strict || config.strict.unwrap_or(false),
            initial_subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.top_k, DEFAULT_TOP_K);
        assert!(!resolved.strict);
        assert_eq!(
            resolved.data,
            DocumentSource::Path(Utf8PathBuf::from(DEFAULT_DATA))
        );
    }
}

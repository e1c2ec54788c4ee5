use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

pub const CONFIG_VAR: &str = "MINSH_CONFIG";
pub const PROMPT_VAR: &str = "MINSH_PROMPT";
pub const DEFAULT_CONFIG_PATH: &str = "minsh.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to open log file in {}: {source}", .directory.display())]
    Log {
        directory: PathBuf,
        #[source]
        source: InitError,
    },
    #[error("invalid MINSH_PROMPT value `{value}`")]
    Prompt {
        value: String,
        #[source]
        source: strum::ParseError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptMode {
    /// Prompt only when standard input is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl PromptMode {
    pub fn enabled(self, stdin_is_tty: bool) -> bool {
        match self {
            Self::Auto => stdin_is_tty,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: env::temp_dir(),
            file: "minsh.log".into(),
        }
    }
}

impl LogConfig {
    /// A non-rotating appender writing to `directory/file`.
    pub fn appender(&self) -> Result<RollingFileAppender, ConfigError> {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&self.file)
            .build(&self.directory)
            .map_err(|source| ConfigError::Log {
                directory: self.directory.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prompt: PromptMode,
    pub log: LogConfig,
}

impl Config {
    /// Loads the file named by `MINSH_CONFIG` (or `minsh.toml`), then applies
    /// the `MINSH_PROMPT` override.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;

        if let Ok(value) = env::var(PROMPT_VAR) {
            config.prompt = value
                .parse()
                .map_err(|source| ConfigError::Prompt { value, source })?;
        }

        trace!(?config, path = %path.display(), "loaded config");

        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

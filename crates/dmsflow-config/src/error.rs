use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Settings file not found. Looked in:\n\
        - DMSFLOW_CONFIG_PATH\n\
        - current directory: dmsflow.local.yaml, dmsflow.yaml\n\
        - ~/.config/dmsflow/config.yaml"
    )]
    SettingsFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

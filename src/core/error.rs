use thiserror::Error;

use crate::core::types::Coord;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid position: {0} is outside the grid")]
    InvalidPosition(Coord),

    #[error("Charger list is empty")]
    EmptyChargerList,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CleanerError>;

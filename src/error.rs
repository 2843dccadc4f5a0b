use thiserror::Error;

/// Errors raised while fetching or decoding the world boundary document.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("failed to fetch boundaries: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("boundary server answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode boundary document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unsupported boundary document type `{0}`")]
    UnsupportedDocument(String),
    #[error("topology has no object named `{0}`")]
    MissingObject(String),
    #[error("arc index {0} is out of range")]
    ArcOutOfRange(i64),
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("news request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("news endpoint answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode news response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("feature has no coordinates")]
    EmptyGeometry,
    #[error("feature extent is not finite")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

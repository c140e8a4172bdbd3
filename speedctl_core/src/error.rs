use speedctl_config::RecordError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] RecordError),
    #[error("io error: {0}")]
    Io(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("control state lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for ControlError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing config store")]
    MissingStore,
    #[error("stored record is invalid: {0}")]
    InvalidRecord(#[from] RecordError),
    #[error("config store: {0}")]
    Store(String),
    #[error("initial duty write failed: {0}")]
    Hardware(String),
}

pub type Result<T> = std::result::Result<T, ControlError>;

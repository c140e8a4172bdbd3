use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("unknown pwm channel {0}")]
    UnknownChannel(u8),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

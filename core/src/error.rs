use thiserror::Error;

#[derive(Debug, Error)]
pub enum DtmfError {
    #[error("not a DTMF digit: {0:?}")]
    InvalidDigit(char),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DtmfError>;

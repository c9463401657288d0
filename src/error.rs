use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BenchError {
    #[error("{op}: {detail}")]
    Device { op: &'static str, detail: String },
    #[error("{op}: {msg}")]
    InvalidArgument { op: &'static str, msg: String },
    #[error("{op}: {msg}")]
    Report { op: &'static str, msg: String },
}

pub type Result<T> = std::result::Result<T, BenchError>;

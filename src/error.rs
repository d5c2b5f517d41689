use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid surface size: width={width}, height={height}")]
    InvalidSurfaceSize { width: f64, height: f64 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid dispatch tree operation: {0}")]
    InvalidTree(String),

    #[error("platform capability unavailable: {0}")]
    Platform(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

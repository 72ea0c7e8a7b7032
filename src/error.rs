//! 轨迹处理的错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrajectoryError>;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// 表中缺少所需的列
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("cannot parse `{value}` in column `{column}` at row {row}")]
    ParseCell {
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("invalid axis rule: {0}")]
    InvalidAxisRule(String),
    #[error("tolerance must be finite and >= 0, got {0}")]
    InvalidTolerance(f64),
    #[error("sample {index} has no orientation")]
    MissingOrientation { index: usize },
    #[error("reference index {index} out of range for {len} samples")]
    ReferenceOutOfRange { index: usize, len: usize },
    /// 参考帧的四元数无法归一化（零范数或非有限值）
    #[error("reference orientation at sample {index} cannot be normalized")]
    DegenerateReferenceFrame { index: usize },
    #[error("orientation at sample {index} cannot be normalized")]
    DegenerateOrientation { index: usize },
}

//! 结果保存
mod aligned;

pub use aligned::{write_aligned_csv, write_summary_json, AlignedRecord};

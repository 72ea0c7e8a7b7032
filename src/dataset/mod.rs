//! 数据表读取
//!
//! 里程计 CSV、Optitrack 导出文件和 `ros2 topic echo` 文本。
mod csv_table;
mod echo_dump;
mod table;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use csv_table::{CsvDataset, OPTITRACK_COLUMNS};
pub use echo_dump::EchoDumpDataset;
pub use table::Table;

use crate::error::Result;

pub trait DatasetTrait {
    /// 读取表中指定的列，任一列缺失返回 `MissingColumn`
    fn read_table(&self, path: &Path, wanted: &[String]) -> Result<Table>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// 第一行为表头
    #[default]
    Csv,
    Optitrack,
    EchoDump,
}

impl SourceFormat {
    pub fn dataset(&self) -> Box<dyn DatasetTrait> {
        match self {
            SourceFormat::Csv => Box::new(CsvDataset::with_header()),
            SourceFormat::Optitrack => Box::new(CsvDataset::optitrack()),
            SourceFormat::EchoDump => Box::new(EchoDumpDataset::default()),
        }
    }
}

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{DatasetTrait, Table};
use crate::error::{Result, TrajectoryError};

/// Optitrack 导出文件的列名（前 7 行为说明信息）
pub const OPTITRACK_COLUMNS: [&str; 9] = [
    "Frame",
    "Time (Seconds)",
    "Quaternion_X",
    "Quaternion_Y",
    "Quaternion_Z",
    "Quaternion_W",
    "X",
    "Y",
    "Z",
];

/// 逗号分隔的数值表
///
/// 表头来自文件第一行，或者在跳过若干前导行后使用调用者给出的列名。
#[derive(Debug, Clone)]
pub struct CsvDataset {
    pub skip_rows: usize,
    /// None: 文件自带表头
    pub names: Option<Vec<String>>,
    pub delimiter: u8,
}

impl Default for CsvDataset {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            names: None,
            delimiter: b',',
        }
    }
}

impl CsvDataset {
    pub const OPTITRACK_PREAMBLE_ROWS: usize = 7;

    pub fn with_header() -> Self {
        Self::default()
    }

    pub fn optitrack() -> Self {
        Self {
            skip_rows: Self::OPTITRACK_PREAMBLE_ROWS,
            names: Some(OPTITRACK_COLUMNS.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn read_from<R: Read>(&self, reader: R, wanted: &[String]) -> Result<Table> {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        for _ in 0..self.skip_rows {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.names.is_none())
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = match &self.names {
            Some(names) => names.clone(),
            None => csv_reader.headers()?.iter().map(|s| s.to_string()).collect(),
        };
        let indices = wanted
            .iter()
            .map(|name| {
                header
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| TrajectoryError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0) + self.skip_rows;
            let row = indices
                .iter()
                .zip(wanted)
                .map(|(&i, name)| parse_cell(record.get(i), line, name))
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }
        log::debug!("read {} rows, columns {:?}", rows.len(), wanted);
        Ok(Table::from_rows(wanted.to_vec(), &rows))
    }
}

/// 空单元格（如遮挡帧）读为 NaN
fn parse_cell(cell: Option<&str>, row: usize, column: &str) -> Result<f64> {
    match cell {
        None | Some("") => Ok(f64::NAN),
        Some(value) => value.parse::<f64>().map_err(|_| TrajectoryError::ParseCell {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

impl DatasetTrait for CsvDataset {
    fn read_table(&self, path: &Path, wanted: &[String]) -> Result<Table> {
        log::info!("csv path: {}", path.display());
        let file = std::fs::File::open(path)?;
        self.read_from(file, wanted)
    }
}

//! `ros2 topic echo` 输出的里程计文本
//!
//! 每条消息以 `---` 结束，时间戳为 `sec` + `nanosec`，
//! 位置和姿态分别位于 `position:` 与 `orientation:` 块中。

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{DatasetTrait, Table};
use crate::error::Result;

pub const ECHO_DUMP_COLUMNS: [&str; 8] = ["sec", "pos_x", "pos_y", "pos_z", "x", "y", "z", "w"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    None,
    Position,
    Orientation,
}

#[derive(Debug, Default)]
struct Entry {
    sec: Option<f64>,
    nanosec: Option<f64>,
    position: [Option<f64>; 3],
    orientation: [Option<f64>; 4],
}

impl Entry {
    fn to_row(&self) -> Option<Vec<f64>> {
        let sec = self.sec? + self.nanosec.unwrap_or(0.0) * 1e-9;
        let mut row = vec![sec];
        for p in self.position {
            row.push(p?);
        }
        row.extend(self.orientation.iter().map(|q| q.unwrap_or(f64::NAN)));
        Some(row)
    }

    fn has_orientation(&self) -> bool {
        self.orientation.iter().all(Option::is_some)
    }
}

fn parse_value(line: &str, key: &str) -> Option<f64> {
    line.strip_prefix(key)?.trim().parse::<f64>().ok()
}

#[derive(Debug, Default, Clone)]
pub struct EchoDumpDataset {}

impl EchoDumpDataset {
    /// 解析整个文本。没有任何姿态的文件不输出 x/y/z/w 列。
    pub fn parse<R: Read>(reader: R) -> Result<Table> {
        let mut rows = Vec::new();
        let mut any_orientation = false;
        let mut entry = Entry::default();
        let mut block = Block::None;

        for (cnt, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.starts_with("---") {
                match entry.to_row() {
                    Some(row) => {
                        any_orientation |= entry.has_orientation();
                        rows.push(row);
                    }
                    None => log::debug!("incomplete message before line {}", cnt + 1),
                }
                entry = Entry::default();
                block = Block::None;
            } else if let Some(v) = parse_value(line, "sec:") {
                entry.sec = Some(v);
            } else if let Some(v) = parse_value(line, "nanosec:") {
                entry.nanosec = Some(v);
            } else if line.starts_with("position:") {
                block = Block::Position;
            } else if line.starts_with("orientation:") {
                block = Block::Orientation;
            } else if let Some((key, value)) = line.split_once(':') {
                let value = value.trim().parse::<f64>().ok();
                match (block, key) {
                    (Block::Position, "x") => entry.position[0] = value,
                    (Block::Position, "y") => entry.position[1] = value,
                    (Block::Position, "z") => entry.position[2] = value,
                    (Block::Orientation, "x") => entry.orientation[0] = value,
                    (Block::Orientation, "y") => entry.orientation[1] = value,
                    (Block::Orientation, "z") => entry.orientation[2] = value,
                    (Block::Orientation, "w") => entry.orientation[3] = value,
                    _ => block = Block::None,
                }
            } else {
                block = Block::None;
            }
        }
        // 最后一条消息可能没有 `---`
        if let Some(row) = entry.to_row() {
            any_orientation |= entry.has_orientation();
            rows.push(row);
        }

        let ncols = if any_orientation {
            ECHO_DUMP_COLUMNS.len()
        } else {
            4
        };
        let names = ECHO_DUMP_COLUMNS[..ncols]
            .iter()
            .map(|s| s.to_string())
            .collect();
        log::debug!("parsed {} odometry messages", rows.len());
        Ok(Table::from_rows(names, &rows))
    }
}

impl DatasetTrait for EchoDumpDataset {
    fn read_table(&self, path: &Path, wanted: &[String]) -> Result<Table> {
        log::info!("echo dump path: {}", path.display());
        let file = std::fs::File::open(path)?;
        let table = Self::parse(file)?;
        log::debug!("echo dump columns: {:?}", table.names());
        table.select(wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
header:
  stamp:
    sec: 100
    nanosec: 500000000
  frame_id: odom
child_frame_id: base_link
pose:
  pose:
    position:
      x: 1.0
      y: 2.0
      z: 3.0
    orientation:
      x: 0.0
      y: 0.0
      z: 0.0
      w: 1.0
  covariance:
  - 0.0
twist:
  twist:
    linear:
      x: 9.0
      y: 9.0
      z: 9.0
---
header:
  stamp:
    sec: 101
    nanosec: 0
pose:
  pose:
    position:
      x: 4.0
      y: 5.0
      z: 6.0
    orientation:
      x: 0.0
      y: 0.0
      z: 0.7071
      w: 0.7071
---
";

    #[test]
    fn test_parse_dump() {
        let table = EchoDumpDataset::parse(DUMP.as_bytes()).unwrap();
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.column("sec").unwrap().to_vec(), vec![100.5, 101.0]);
        // twist 块中的 x 不能覆盖位置
        assert_eq!(table.column("pos_x").unwrap().to_vec(), vec![1.0, 4.0]);
        assert_eq!(table.column("z").unwrap()[1], 0.7071);
    }

    #[test]
    fn test_position_only_dump_has_no_orientation_columns() {
        let dump = "sec: 1\nnanosec: 0\nposition:\n  x: 1.0\n  y: 0.0\n  z: 0.0\n---\n";
        let table = EchoDumpDataset::parse(dump.as_bytes()).unwrap();
        assert_eq!(table.nrows(), 1);
        assert!(table.column("w").is_err());
    }

    #[test]
    fn test_incomplete_message_skipped() {
        let dump = "sec: 1\nposition:\n  x: 1.0\n---\nsec: 2\nposition:\n  x: 1.0\n  y: 1.0\n  z: 1.0\n";
        let table = EchoDumpDataset::parse(dump.as_bytes()).unwrap();
        assert_eq!(table.nrows(), 1);
        assert_eq!(table.column("sec").unwrap()[0], 2.0);
    }
}

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::{AlignedPair, AlignmentSummary};
use crate::global_types::Sample;

/// aligned.csv 中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub timestamp: f64,
    pub ref_t: f64,
    pub ref_x: f64,
    pub ref_y: f64,
    pub ref_z: f64,
    pub ref_qx: Option<f64>,
    pub ref_qy: Option<f64>,
    pub ref_qz: Option<f64>,
    pub ref_qw: Option<f64>,
    pub query_t: f64,
    pub query_x: f64,
    pub query_y: f64,
    pub query_z: f64,
    pub query_qx: Option<f64>,
    pub query_qy: Option<f64>,
    pub query_qz: Option<f64>,
    pub query_qw: Option<f64>,
    pub time_offset: f64,
    pub position_error: f64,
}

fn split(sample: &Sample) -> (f64, [f64; 3], [Option<f64>; 4]) {
    let p = sample.position;
    let q = match sample.orientation_xyzw() {
        Some(q) => q.map(Some),
        None => [None; 4],
    };
    (sample.timestamp, [p.x, p.y, p.z], q)
}

impl From<&AlignedPair> for AlignedRecord {
    fn from(pair: &AlignedPair) -> Self {
        let (ref_t, [ref_x, ref_y, ref_z], [ref_qx, ref_qy, ref_qz, ref_qw]) = split(&pair.reference);
        let (query_t, [query_x, query_y, query_z], [query_qx, query_qy, query_qz, query_qw]) =
            split(&pair.query);
        Self {
            timestamp: pair.timestamp,
            ref_t,
            ref_x,
            ref_y,
            ref_z,
            ref_qx,
            ref_qy,
            ref_qz,
            ref_qw,
            query_t,
            query_x,
            query_y,
            query_z,
            query_qx,
            query_qy,
            query_qz,
            query_qw,
            time_offset: pair.time_offset(),
            position_error: pair.position_error(),
        }
    }
}

/// 写出对齐结果，缺失的姿态为空单元格
pub fn write_aligned_csv(path: &Path, pairs: &[AlignedPair]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for pair in pairs {
        writer.serialize(AlignedRecord::from(pair))?;
    }
    writer.flush()?;
    log::info!("saved {} aligned pairs to {:?}", pairs.len(), path);
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &AlignmentSummary) -> anyhow::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

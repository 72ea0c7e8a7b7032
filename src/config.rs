use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::dataset::SourceFormat;
use crate::reexpress::Anchor;
use crate::trajectory::{AxisRule, ColumnMap, FrameConvention, OriginPolicy};

/// 对齐容差，单位 s
pub const DEFAULT_TOLERANCE: f64 = 0.1;

pub const ALIGNED_FILE: &str = "aligned.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// 一条轨迹的来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: SourceFormat,
    /// 不填时按格式选择默认列名
    #[serde(default)]
    pub columns: Option<ColumnMap>,
    #[serde(default)]
    pub frame: FrameConvention,
    #[serde(default)]
    pub axis_rule: AxisRule,
    #[serde(default)]
    pub origin: OriginPolicy,
}

impl SourceConfig {
    /// 机器人里程计，FLU
    pub fn odometry() -> Self {
        Self {
            path: PathBuf::from("odometry.csv"),
            format: SourceFormat::Csv,
            columns: None,
            frame: FrameConvention::Flu,
            axis_rule: AxisRule::Identity,
            origin: OriginPolicy::ZeroAtFirstSample,
        }
    }

    /// 动捕录制，FUR 转到 FLU
    pub fn optitrack() -> Self {
        Self {
            path: PathBuf::from("optitrack_recording.csv"),
            format: SourceFormat::Optitrack,
            columns: None,
            frame: FrameConvention::Fur,
            axis_rule: AxisRule::fur_to_flu(),
            origin: OriginPolicy::ZeroAtFirstSample,
        }
    }

    pub fn column_map(&self) -> ColumnMap {
        match (&self.columns, self.format) {
            (Some(columns), _) => columns.clone(),
            (None, SourceFormat::Optitrack) => ColumnMap::optitrack(),
            (None, _) => ColumnMap::odometry(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReexpressConfig {
    /// 作为参考坐标系的对齐样本对下标
    pub reference_index: usize,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub reference: SourceConfig,
    pub query: SourceConfig,
    pub tolerance: f64,
    /// 归一化之前先裁剪到公共时间窗口
    pub crop_to_overlap: bool,
    pub reexpress: Option<ReexpressConfig>,
    pub output_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            reference: SourceConfig::odometry(),
            query: SourceConfig::optitrack(),
            tolerance: DEFAULT_TOLERANCE,
            crop_to_overlap: false,
            reexpress: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl EvalConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config =
            serde_json::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.tolerance, 0.1);
        assert_eq!(config.query.format, SourceFormat::Optitrack);
        assert_eq!(config.query.axis_rule, AxisRule::fur_to_flu());
        assert_eq!(config.query.column_map(), ColumnMap::optitrack());
        assert_eq!(config.reference.column_map(), ColumnMap::odometry());
        assert!(config.reexpress.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config: EvalConfig = serde_json::from_str(
            r#"{
                "tolerance": 0.05,
                "query": {
                    "path": "gt.csv",
                    "format": "optitrack",
                    "frame": "FUR",
                    "axis_rule": {"kind": "convert", "source": "FUR", "target": "FLU"},
                    "columns": {
                        "time": "Time (Seconds)",
                        "position": ["X", "Y", "Z"],
                        "position_scale": 0.001
                    }
                },
                "reexpress": {"anchor": "own"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.tolerance, 0.05);
        assert_eq!(config.reference, SourceConfig::odometry());
        assert_eq!(config.query.origin, OriginPolicy::ZeroAtFirstSample);
        let columns = config.query.column_map();
        assert_eq!(columns.position_scale, 0.001);
        assert_eq!(columns.orientation, None);
        let reexpress = config.reexpress.unwrap();
        assert_eq!(reexpress.anchor, Anchor::Own);
        assert_eq!(reexpress.reference_index, 0);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"output_dir": "out", "crop_to_overlap": true}"#).unwrap();
        let config = EvalConfig::from_json_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.crop_to_overlap);

        assert!(EvalConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}

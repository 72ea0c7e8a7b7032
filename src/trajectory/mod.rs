//! 轨迹：按时间排序的测量序列
//!
//! 每个变换（归一化、裁剪、重表达）都返回新的 [Trajectory]。
mod axis;
mod normalize;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub use axis::{AxisPermutation, AxisRule, Direction, FrameConvention, SignedAxis};
pub use normalize::{normalize, OriginPolicy};

use crate::dataset::{Table, OPTITRACK_COLUMNS};
use crate::error::Result;
use crate::global_types::Sample;

/// 表中各量对应的列名，由调用者给出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub time: String,
    pub position: [String; 3],
    /// (x, y, z, w)
    #[serde(default)]
    pub orientation: Option<[String; 4]>,
    /// 位置乘以该系数，例如毫米转米为 0.001
    #[serde(default = "ColumnMap::unit_scale")]
    pub position_scale: f64,
    /// 时间乘以该系数，例如纳秒转秒为 1e-9
    #[serde(default = "ColumnMap::unit_scale")]
    pub time_scale: f64,
}

impl ColumnMap {
    fn unit_scale() -> f64 {
        1.0
    }

    /// 里程计 CSV: sec, pos_x/y/z, x/y/z/w
    pub fn odometry() -> Self {
        Self {
            time: "sec".to_string(),
            position: ["pos_x", "pos_y", "pos_z"].map(String::from),
            orientation: Some(["x", "y", "z", "w"].map(String::from)),
            position_scale: 1.0,
            time_scale: 1.0,
        }
    }

    pub fn optitrack() -> Self {
        let c = OPTITRACK_COLUMNS;
        Self {
            time: c[1].to_string(),
            position: [c[6], c[7], c[8]].map(String::from),
            orientation: Some([c[2], c[3], c[4], c[5]].map(String::from)),
            position_scale: 1.0,
            time_scale: 1.0,
        }
    }

    pub fn without_orientation(mut self) -> Self {
        self.orientation = None;
        self
    }

    /// 需要读取的全部列名
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![self.time.clone()];
        names.extend(self.position.iter().cloned());
        if let Some(orientation) = &self.orientation {
            names.extend(orientation.iter().cloned());
        }
        names
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    frame_convention: FrameConvention,
    samples: Vec<Sample>,
}

impl Trajectory {
    /// 按时间稳定排序，重复时间戳只保留第一次出现的样本。
    /// 时间戳非有限的样本无法排序，直接丢弃。
    pub fn new(frame_convention: FrameConvention, mut samples: Vec<Sample>) -> Self {
        let before = samples.len();
        samples.retain(|s| s.timestamp.is_finite());
        if samples.len() != before {
            log::warn!(
                "dropped {} samples with non-finite timestamps",
                before - samples.len()
            );
        }
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let sorted = samples.len();
        samples.dedup_by(|next, kept| next.timestamp == kept.timestamp);
        if samples.len() != sorted {
            log::debug!("collapsed {} duplicate timestamps", sorted - samples.len());
        }
        Self {
            frame_convention,
            samples,
        }
    }

    /// 从数值表构建轨迹，任一列缺失返回 `MissingColumn`
    pub fn from_table(
        table: &Table,
        columns: &ColumnMap,
        frame_convention: FrameConvention,
    ) -> Result<Self> {
        let time = table.column(&columns.time)?;
        let [px, py, pz] = &columns.position;
        let (px, py, pz) = (table.column(px)?, table.column(py)?, table.column(pz)?);
        let orientation = match &columns.orientation {
            Some([qx, qy, qz, qw]) => Some([
                table.column(qx)?,
                table.column(qy)?,
                table.column(qz)?,
                table.column(qw)?,
            ]),
            None => None,
        };

        let samples = (0..table.nrows())
            .map(|i| {
                let sample = Sample::new(
                    time[i] * columns.time_scale,
                    Vector3::new(px[i], py[i], pz[i]) * columns.position_scale,
                );
                match &orientation {
                    Some([qx, qy, qz, qw]) => {
                        sample.with_orientation([qx[i], qy[i], qz[i], qw[i]])
                    }
                    None => sample,
                }
            })
            .collect();
        Ok(Self::new(frame_convention, samples))
    }

    /// 由变换产生的新轨迹，样本已满足排序和唯一性
    pub(crate) fn from_sorted(frame_convention: FrameConvention, samples: Vec<Sample>) -> Self {
        Self {
            frame_convention,
            samples,
        }
    }

    pub fn frame_convention(&self) -> FrameConvention {
        self.frame_convention
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// (起始, 结束) 时间
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// 平均采样间隔，样本少于两个时为 None
    pub fn mean_sample_period(&self) -> Option<f64> {
        let (start, end) = self.time_range()?;
        if self.samples.len() < 2 {
            return None;
        }
        Some((end - start) / (self.samples.len() - 1) as f64)
    }

    /// 保留 [start, end] 内的样本（闭区间）
    pub fn crop(&self, start: f64, end: f64) -> Trajectory {
        let samples = self
            .samples
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .copied()
            .collect();
        Self::from_sorted(self.frame_convention, samples)
    }
}

/// 把两条轨迹裁剪到公共时间窗口，不重叠时都为空
pub fn crop_to_overlap(a: &Trajectory, b: &Trajectory) -> (Trajectory, Trajectory) {
    match (a.time_range(), b.time_range()) {
        (Some((a_start, a_end)), Some((b_start, b_end))) => {
            let start = a_start.max(b_start);
            let end = a_end.min(b_end);
            log::info!("overlap window: [{:.6}, {:.6}]", start, end);
            (a.crop(start, end), b.crop(start, end))
        }
        _ => (
            Trajectory::from_sorted(a.frame_convention, Vec::new()),
            Trajectory::from_sorted(b.frame_convention, Vec::new()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrajectoryError;

    fn table(names: &[&str], rows: &[Vec<f64>]) -> Table {
        Table::from_rows(names.iter().map(|s| s.to_string()).collect(), rows)
    }

    fn sample(t: f64, x: f64) -> Sample {
        Sample::new(t, Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_duplicates_first_wins() {
        let trajectory = Trajectory::new(
            FrameConvention::Flu,
            vec![sample(0.2, 3.0), sample(0.1, 1.0), sample(0.1, 2.0), sample(0.0, 0.0)],
        );
        assert_eq!(trajectory.timestamps(), vec![0.0, 0.1, 0.2]);
        assert_eq!(trajectory.samples()[1].position.x, 1.0);
    }

    #[test]
    fn test_non_finite_timestamp_dropped() {
        let trajectory = Trajectory::new(
            FrameConvention::Flu,
            vec![sample(f64::NAN, 1.0), sample(0.0, 0.0)],
        );
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn test_from_table_with_orientation() {
        let t = table(
            &["sec", "pos_x", "pos_y", "pos_z", "x", "y", "z", "w"],
            &[vec![5.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]],
        );
        let trajectory = Trajectory::from_table(&t, &ColumnMap::odometry(), FrameConvention::Flu)
            .unwrap();
        let s = trajectory.samples()[0];
        assert_eq!(s.timestamp, 5.0);
        assert_eq!(s.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(s.orientation_xyzw(), Some([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_from_table_missing_column() {
        let t = table(&["sec", "pos_x", "pos_y", "pos_z"], &[vec![0.0, 1.0, 2.0, 3.0]]);
        let err = Trajectory::from_table(&t, &ColumnMap::odometry(), FrameConvention::Flu)
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::MissingColumn(ref c) if c == "x"));

        let trajectory = Trajectory::from_table(
            &t,
            &ColumnMap::odometry().without_orientation(),
            FrameConvention::Flu,
        )
        .unwrap();
        assert_eq!(trajectory.samples()[0].orientation, None);
    }

    #[test]
    fn test_position_scale() {
        let mut columns = ColumnMap::optitrack().without_orientation();
        columns.position_scale = 0.001;
        let t = table(&["Time (Seconds)", "X", "Y", "Z"], &[vec![0.0, 1000.0, -500.0, 250.0]]);
        let trajectory = Trajectory::from_table(&t, &columns, FrameConvention::Fur).unwrap();
        assert_eq!(trajectory.samples()[0].position, Vector3::new(1.0, -0.5, 0.25));
    }

    #[test]
    fn test_empty_table() {
        let t = table(&["sec", "pos_x", "pos_y", "pos_z"], &[]);
        let columns = ColumnMap::odometry().without_orientation();
        let trajectory = Trajectory::from_table(&t, &columns, FrameConvention::Flu).unwrap();
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.mean_sample_period(), None);
    }

    #[test]
    fn test_mean_sample_period() {
        let trajectory = Trajectory::new(
            FrameConvention::Flu,
            vec![sample(0.0, 0.0), sample(0.1, 0.0), sample(0.3, 0.0)],
        );
        approx::assert_abs_diff_eq!(trajectory.mean_sample_period().unwrap(), 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_crop_to_overlap() {
        let a = Trajectory::new(
            FrameConvention::Flu,
            (0..10).map(|i| sample(i as f64, 0.0)).collect(),
        );
        let b = Trajectory::new(
            FrameConvention::Fur,
            (5..15).map(|i| sample(i as f64 + 0.5, 0.0)).collect(),
        );
        let (a, b) = crop_to_overlap(&a, &b);
        assert_eq!(a.timestamps(), vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(b.timestamps(), vec![5.5, 6.5, 7.5, 8.5]);
        assert_eq!(b.frame_convention(), FrameConvention::Fur);
    }

    #[test]
    fn test_crop_disjoint() {
        let a = Trajectory::new(FrameConvention::Flu, vec![sample(0.0, 0.0), sample(1.0, 0.0)]);
        let b = Trajectory::new(FrameConvention::Flu, vec![sample(2.0, 0.0), sample(3.0, 0.0)]);
        let (a, b) = crop_to_overlap(&a, &b);
        assert!(a.is_empty() && b.is_empty());
    }
}

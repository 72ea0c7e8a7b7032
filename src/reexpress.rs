//! 刚体坐标系重表达
//!
//! 以参考样本的位姿 T_ref 为新坐标系，每个样本变为 T_ref⁻¹ · T_s。

use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::align::AlignedPair;
use crate::error::{Result, TrajectoryError};
use crate::global_types::Sample;
use crate::trajectory::{FrameConvention, Trajectory};
use crate::utility::Utility;

/// 位置 + 姿态组成的刚体变换，只在计算时由样本临时构造
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose(pub Isometry3<f64>);

impl Pose {
    pub fn from_parts(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Pose(Isometry3::from_parts(Translation3::from(position), orientation))
    }

    /// 第 `index` 个样本的位姿，姿态缺失或无法归一化时报错
    pub fn from_sample(sample: &Sample, index: usize) -> Result<Self> {
        let q = sample
            .orientation
            .ok_or(TrajectoryError::MissingOrientation { index })?;
        let q = Utility::try_normalize(&q).ok_or(TrajectoryError::DegenerateOrientation { index })?;
        Ok(Self::from_parts(sample.position, q))
    }

    /// 作为参考坐标系的位姿，退化时返回 `DegenerateReferenceFrame`
    pub fn reference_from(samples: &[Sample], index: usize) -> Result<Self> {
        let sample = samples.get(index).ok_or(TrajectoryError::ReferenceOutOfRange {
            index,
            len: samples.len(),
        })?;
        match Self::from_sample(sample, index) {
            Err(TrajectoryError::DegenerateOrientation { index }) => {
                Err(TrajectoryError::DegenerateReferenceFrame { index })
            }
            other => other,
        }
    }

    /// 4x4 齐次矩阵
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        self.0.to_homogeneous()
    }

    pub fn inverse(&self) -> Self {
        Pose(self.0.inverse())
    }

    /// self · other
    pub fn compose(&self, other: &Pose) -> Self {
        Pose(self.0 * other.0)
    }

    pub fn position(&self) -> Vector3<f64> {
        self.0.translation.vector
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.0.rotation
    }
}

fn reexpress_sample(anchor_inv: &Pose, sample: &Sample, index: usize) -> Result<Sample> {
    let pose = Pose::from_sample(sample, index)?;
    // 平移不参与旋转的计算，非有限位置只影响位置分量
    let relative = anchor_inv.compose(&pose);
    Ok(Sample {
        timestamp: sample.timestamp,
        position: relative.position(),
        orientation: Some(relative.orientation().into_inner()),
    })
}

fn reexpress_samples<'a>(
    samples: impl Iterator<Item = &'a Sample>,
    anchor: &Pose,
) -> Result<Vec<Sample>> {
    log::debug!("reference pose:{}", anchor.to_homogeneous());
    let anchor_inv = anchor.inverse();
    samples
        .enumerate()
        .map(|(i, s)| reexpress_sample(&anchor_inv, s, i))
        .collect()
}

/// 以第 `reference_index` 个样本为原点和零姿态重表达整条轨迹。
/// 空轨迹直接返回空轨迹。
pub fn reexpress(trajectory: &Trajectory, reference_index: usize) -> Result<Trajectory> {
    if trajectory.is_empty() {
        return Ok(trajectory.clone());
    }
    let anchor = Pose::reference_from(trajectory.samples(), reference_index)?;
    reexpress_against(trajectory, &anchor)
}

/// 以外部给定的位姿（例如另一条轨迹的第一帧）为参考坐标系
pub fn reexpress_against(trajectory: &Trajectory, anchor: &Pose) -> Result<Trajectory> {
    let samples = reexpress_samples(trajectory.samples().iter(), anchor)?;
    Ok(Trajectory::from_sorted(trajectory.frame_convention(), samples))
}

/// 对齐结果的重表达以哪一侧为参考
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// 两侧都以参考轨迹第 k 对的位姿为参考坐标系
    #[default]
    Reference,
    /// 每一侧以自身第 k 对的位姿为参考坐标系
    Own,
}

/// 重表达对齐后的样本对，`pair_index` 选择作为参考的样本对
pub fn reexpress_pairs(
    pairs: &[AlignedPair],
    pair_index: usize,
    anchor: Anchor,
) -> Result<Vec<AlignedPair>> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }
    // 样本对中查询一侧的时间戳可能重复，不经过排序去重
    let references = Trajectory::from_sorted(
        FrameConvention::Custom,
        pairs.iter().map(|p| p.reference).collect(),
    );
    let queries = Trajectory::from_sorted(
        FrameConvention::Custom,
        pairs.iter().map(|p| p.query).collect(),
    );

    let (references, queries) = match anchor {
        Anchor::Reference => {
            let shared = Pose::reference_from(references.samples(), pair_index)?;
            (
                reexpress_against(&references, &shared)?,
                reexpress_against(&queries, &shared)?,
            )
        }
        Anchor::Own => (
            reexpress(&references, pair_index)?,
            reexpress(&queries, pair_index)?,
        ),
    };

    Ok(pairs
        .iter()
        .zip(references.samples().iter().zip(queries.samples()))
        .map(|(pair, (reference, query))| AlignedPair {
            timestamp: pair.timestamp,
            reference: *reference,
            query: *query,
        })
        .collect())
}

//! 时间对齐
//!
//! 对参考轨迹的每个样本，在查询轨迹中二分查找时间最近的样本，
//! 时间差不超过容差时配对，否则丢弃该参考样本。

use serde::Serialize;

use crate::error::{Result, TrajectoryError};
use crate::global_types::Sample;
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    /// 参考样本的时间戳
    pub timestamp: f64,
    pub reference: Sample,
    pub query: Sample,
}

impl AlignedPair {
    /// query - reference，单位 s
    pub fn time_offset(&self) -> f64 {
        self.query.timestamp - self.reference.timestamp
    }

    pub fn position_error(&self) -> f64 {
        (self.query.position - self.reference.position).norm()
    }
}

/// 时间最近的下标；距离相等时取较早的样本
fn nearest(timestamps: &[f64], t: f64) -> Option<usize> {
    let upper = timestamps.partition_point(|&q| q < t);
    match (upper.checked_sub(1), timestamps.get(upper)) {
        (Some(lower), Some(&after)) => {
            if t - timestamps[lower] <= after - t {
                Some(lower)
            } else {
                Some(upper)
            }
        }
        (Some(lower), None) => Some(lower),
        (None, Some(_)) => Some(upper),
        (None, None) => None,
    }
}

/// O(|R| log|Q| + |Q|)
pub fn align(reference: &Trajectory, query: &Trajectory, tolerance: f64) -> Result<Vec<AlignedPair>> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(TrajectoryError::InvalidTolerance(tolerance));
    }
    let query_times = query.timestamps();
    let pairs: Vec<AlignedPair> = reference
        .samples()
        .iter()
        .filter_map(|r| {
            let index = nearest(&query_times, r.timestamp)?;
            let q = query.samples()[index];
            if (r.timestamp - q.timestamp).abs() <= tolerance {
                Some(AlignedPair {
                    timestamp: r.timestamp,
                    reference: *r,
                    query: q,
                })
            } else {
                None
            }
        })
        .collect();
    log::debug!(
        "aligned {} of {} reference samples (tolerance {} s)",
        pairs.len(),
        reference.len(),
        tolerance
    );
    Ok(pairs)
}

/// 对齐结果的统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignmentSummary {
    pub matched: usize,
    pub dropped: usize,
    pub mean_abs_time_offset: Option<f64>,
    pub position_rmse: Option<f64>,
    pub max_position_error: Option<f64>,
}

impl AlignmentSummary {
    pub fn from_pairs(pairs: &[AlignedPair], reference_len: usize) -> Self {
        let matched = pairs.len();
        let mut summary = Self {
            matched,
            dropped: reference_len.saturating_sub(matched),
            ..Default::default()
        };
        if matched == 0 {
            return summary;
        }
        let n = matched as f64;
        summary.mean_abs_time_offset =
            Some(pairs.iter().map(|p| p.time_offset().abs()).sum::<f64>() / n);
        let errors: Vec<f64> = pairs.iter().map(AlignedPair::position_error).collect();
        summary.position_rmse = Some((errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt());
        summary.max_position_error = errors.iter().copied().reduce(f64::max);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::FrameConvention;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn trajectory(times: &[f64]) -> Trajectory {
        Trajectory::new(
            FrameConvention::Flu,
            times
                .iter()
                .map(|&t| Sample::new(t, Vector3::new(t, 0.0, 0.0)))
                .collect(),
        )
    }

    #[test]
    fn test_boundary_scenario() {
        let r = trajectory(&[0.0, 0.1, 0.2]);
        let q = trajectory(&[0.04, 0.11, 0.25]);
        let pairs = align(&r, &q, 0.06).unwrap();
        let matched: Vec<(f64, f64)> = pairs
            .iter()
            .map(|p| (p.reference.timestamp, p.query.timestamp))
            .collect();
        // 0.25 - 0.2 = 0.05 <= 0.06
        assert_eq!(matched, vec![(0.0, 0.04), (0.1, 0.11), (0.2, 0.25)]);
        assert!(pairs.iter().all(|p| p.time_offset().abs() <= 0.06));
    }

    #[test]
    fn test_outside_tolerance_dropped() {
        let r = trajectory(&[0.0, 0.1, 0.2]);
        let q = trajectory(&[0.04, 0.11, 0.25]);
        let pairs = align(&r, &q, 0.045).unwrap();
        let reference: Vec<f64> = pairs.iter().map(|p| p.timestamp).collect();
        assert_eq!(reference, vec![0.0, 0.1]);
    }

    #[test]
    fn test_tie_prefers_earlier() {
        let r = trajectory(&[1.0]);
        let q = trajectory(&[0.5, 1.5]);
        let pairs = align(&r, &q, 1.0).unwrap();
        assert_eq!(pairs[0].query.timestamp, 0.5);
    }

    #[test]
    fn test_before_and_after_query_range() {
        let r = trajectory(&[-1.0, 10.0]);
        let q = trajectory(&[0.0, 1.0, 2.0]);
        let pairs = align(&r, &q, 100.0).unwrap();
        assert_eq!(pairs[0].query.timestamp, 0.0);
        assert_eq!(pairs[1].query.timestamp, 2.0);
    }

    #[test]
    fn test_identical_timestamps_zero_tolerance() {
        let times: Vec<f64> = (0..50).map(|i| i as f64 * 0.01).collect();
        let r = trajectory(&times);
        let q = trajectory(&times);
        let pairs = align(&r, &q, 0.0).unwrap();
        assert_eq!(pairs.len(), times.len());
        assert!(pairs.iter().all(|p| p.reference.timestamp == p.query.timestamp));
    }

    #[test]
    fn test_monotone_in_tolerance() {
        let r = trajectory(&(0..100).map(|i| i as f64 * 0.01).collect::<Vec<_>>());
        let q = trajectory(&(0..37).map(|i| i as f64 * 0.027 + 0.003).collect::<Vec<_>>());
        let mut last = 0;
        for tau in [0.0, 0.001, 0.005, 0.01, 0.02, 0.05, 1.0] {
            let n = align(&r, &q, tau).unwrap().len();
            assert!(n >= last);
            last = n;
        }
        assert_eq!(last, r.len());
    }

    #[test]
    fn test_empty_inputs() {
        let r = trajectory(&[0.0, 1.0]);
        let empty = trajectory(&[]);
        assert!(align(&r, &empty, 1.0).unwrap().is_empty());
        assert!(align(&empty, &r, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_tolerance() {
        let r = trajectory(&[0.0]);
        assert!(matches!(
            align(&r, &r, -0.1),
            Err(TrajectoryError::InvalidTolerance(_))
        ));
        assert!(align(&r, &r, f64::NAN).is_err());
    }

    #[test]
    fn test_summary() {
        let r = trajectory(&[0.0, 1.0, 2.0]);
        let q = Trajectory::new(
            FrameConvention::Flu,
            vec![
                Sample::new(0.0, Vector3::new(0.0, 3.0, 0.0)),
                Sample::new(1.1, Vector3::new(1.0, 4.0, 0.0)),
            ],
        );
        let pairs = align(&r, &q, 0.2).unwrap();
        let summary = AlignmentSummary::from_pairs(&pairs, r.len());
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.dropped, 1);
        assert_abs_diff_eq!(summary.mean_abs_time_offset.unwrap(), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.position_rmse.unwrap(), 12.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(summary.max_position_error.unwrap(), 4.0, epsilon = 1e-12);

        let empty = AlignmentSummary::from_pairs(&[], 3);
        assert_eq!(empty.dropped, 3);
        assert_eq!(empty.position_rmse, None);
    }
}

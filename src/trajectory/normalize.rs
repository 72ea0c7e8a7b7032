use serde::{Deserialize, Serialize};

use super::{AxisRule, FrameConvention, Trajectory};
use crate::error::Result;
use crate::global_types::Sample;

/// 原点处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginPolicy {
    None,
    /// 第一帧位置平移到 (0, 0, 0)
    #[default]
    ZeroAtFirstSample,
}

/// 轴重标定 -> 相对时间 -> 原点
///
/// 原点在重标定之后的输出坐标系中扣除。姿态只做重标定，不做归零。
pub fn normalize(
    trajectory: &Trajectory,
    axis_rule: &AxisRule,
    origin_policy: OriginPolicy,
) -> Result<Trajectory> {
    let permutation = axis_rule.resolve()?;
    let input_frame = trajectory.frame_convention();
    if let AxisRule::Convert { source, .. } = axis_rule {
        if *source != input_frame && input_frame != FrameConvention::Custom {
            log::warn!(
                "axis rule converts from {:?} but trajectory is tagged {:?}",
                source,
                input_frame
            );
        }
    }
    let output_frame = axis_rule.output_frame(input_frame);

    let first = match trajectory.samples().first() {
        Some(first) => first,
        None => return Ok(Trajectory::from_sorted(output_frame, Vec::new())),
    };
    let t0 = first.timestamp;
    let origin = match origin_policy {
        OriginPolicy::None => None,
        OriginPolicy::ZeroAtFirstSample => Some(permutation.apply_position(&first.position)),
    };

    let samples = trajectory
        .samples()
        .iter()
        .map(|s| {
            let mut position = permutation.apply_position(&s.position);
            if let Some(origin) = &origin {
                position -= origin;
            }
            Sample {
                timestamp: s.timestamp - t0,
                position,
                orientation: s.orientation.map(|q| permutation.apply_orientation(&q)),
            }
        })
        .collect();
    Ok(Trajectory::from_sorted(output_frame, samples))
}

//! 坐标轴约定与重标定规则

use std::fmt::Display;
use std::str::FromStr;

use nalgebra::{Matrix3, Quaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// 物理方向，以 (forward, left, up) 为基准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// (基准轴下标, 符号)
    fn basis(&self) -> (usize, f64) {
        match self {
            Direction::Forward => (0, 1.0),
            Direction::Back => (0, -1.0),
            Direction::Left => (1, 1.0),
            Direction::Right => (1, -1.0),
            Direction::Up => (2, 1.0),
            Direction::Down => (2, -1.0),
        }
    }
}

/// 坐标轴约定：三个坐标轴分别指向的物理方向
///
/// - FLU: forward, left, up
/// - FUR: forward, up, right
/// - RUB: right, up, back
/// - NUE: north, up, east（north 视为 forward，east 视为 right）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameConvention {
    Flu,
    Fur,
    Rub,
    Nue,
    /// 未命名的约定，例如 [AxisRule::Signed] 的结果
    #[default]
    Custom,
}

impl FrameConvention {
    pub fn axes(&self) -> Option<[Direction; 3]> {
        use Direction::*;
        match self {
            FrameConvention::Flu => Some([Forward, Left, Up]),
            FrameConvention::Fur => Some([Forward, Up, Right]),
            FrameConvention::Rub => Some([Right, Up, Back]),
            FrameConvention::Nue => Some([Forward, Up, Right]),
            FrameConvention::Custom => None,
        }
    }
}

/// 带符号的输入轴：输出分量 = sign * 输入分量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAxis {
    pub axis: usize,
    pub negate: bool,
}

impl SignedAxis {
    pub const X: SignedAxis = SignedAxis::new(0, false);
    pub const Y: SignedAxis = SignedAxis::new(1, false);
    pub const Z: SignedAxis = SignedAxis::new(2, false);
    pub const NEG_X: SignedAxis = SignedAxis::new(0, true);
    pub const NEG_Y: SignedAxis = SignedAxis::new(1, true);
    pub const NEG_Z: SignedAxis = SignedAxis::new(2, true);

    pub const fn new(axis: usize, negate: bool) -> Self {
        Self { axis, negate }
    }

    #[inline]
    fn sign(&self) -> f64 {
        if self.negate {
            -1.0
        } else {
            1.0
        }
    }

    #[inline]
    fn pick(&self, v: &Vector3<f64>) -> f64 {
        // 直接取分量并翻转符号，不做矩阵乘法，非有限值不会扩散到其他分量
        if self.negate {
            -v[self.axis]
        } else {
            v[self.axis]
        }
    }
}

impl Display for SignedAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = ["x", "y", "z"].get(self.axis).copied().unwrap_or("?");
        if self.negate {
            write!(f, "-{}", name)
        } else {
            write!(f, "{}", name)
        }
    }
}

impl FromStr for SignedAxis {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (negate, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        match (negate, name.to_ascii_lowercase().as_str()) {
            (false, "x") => Ok(SignedAxis::X),
            (false, "y") => Ok(SignedAxis::Y),
            (false, "z") => Ok(SignedAxis::Z),
            (true, "x") => Ok(SignedAxis::NEG_X),
            (true, "y") => Ok(SignedAxis::NEG_Y),
            (true, "z") => Ok(SignedAxis::NEG_Z),
            _ => Err(TrajectoryError::InvalidAxisRule(format!(
                "unknown axis `{}`",
                s
            ))),
        }
    }
}

impl Serialize for SignedAxis {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SignedAxis {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 坐标轴重标定规则
///
/// 每个输出分量等于某个输入分量乘以 ±1，不含其他旋转或剪切。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisRule {
    #[default]
    Identity,
    /// 两个命名约定之间的转换
    Convert {
        source: FrameConvention,
        target: FrameConvention,
    },
    /// 输出 x, y, z 分别取自哪个输入轴
    Signed { axes: [SignedAxis; 3] },
}

impl AxisRule {
    /// FUR -> FLU: x 不变, y = -z, z = y
    pub const fn fur_to_flu() -> Self {
        AxisRule::Convert {
            source: FrameConvention::Fur,
            target: FrameConvention::Flu,
        }
    }

    pub const fn negate_y() -> Self {
        AxisRule::Signed {
            axes: [SignedAxis::X, SignedAxis::NEG_Y, SignedAxis::Z],
        }
    }

    /// 绕 x 轴旋转 180°，常用于把预测轨迹转到机体坐标系
    pub const fn negate_yz() -> Self {
        AxisRule::Signed {
            axes: [SignedAxis::X, SignedAxis::NEG_Y, SignedAxis::NEG_Z],
        }
    }

    /// 展开为带符号的轴置换，并检查每个输入轴恰好使用一次
    pub fn resolve(&self) -> Result<AxisPermutation> {
        let axes = match self {
            AxisRule::Identity => [SignedAxis::X, SignedAxis::Y, SignedAxis::Z],
            AxisRule::Convert { source, target } => convert_axes(*source, *target)?,
            AxisRule::Signed { axes } => *axes,
        };
        AxisPermutation::new(axes)
    }

    /// 撤销本规则的规则，用于把结果转回原始坐标系
    #[allow(dead_code)]
    pub fn inverse(&self) -> Result<AxisRule> {
        Ok(match self {
            AxisRule::Identity => AxisRule::Identity,
            AxisRule::Convert { source, target } => AxisRule::Convert {
                source: *target,
                target: *source,
            },
            AxisRule::Signed { .. } => AxisRule::Signed {
                axes: self.resolve()?.inverse().axes(),
            },
        })
    }

    /// 重标定后轨迹所处的坐标约定
    pub fn output_frame(&self, input: FrameConvention) -> FrameConvention {
        match self {
            AxisRule::Identity => input,
            AxisRule::Convert { target, .. } => *target,
            AxisRule::Signed { .. } => FrameConvention::Custom,
        }
    }
}

/// 命令行形式：预设名，或逗号分隔的三个带符号轴（如 `x,-z,y`）
impl FromStr for AxisRule {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "identity" => Ok(AxisRule::Identity),
            "fur_to_flu" => Ok(AxisRule::fur_to_flu()),
            "negate_y" => Ok(AxisRule::negate_y()),
            "negate_yz" => Ok(AxisRule::negate_yz()),
            other => {
                let parts = other
                    .split(',')
                    .map(str::parse)
                    .collect::<Result<Vec<SignedAxis>>>()?;
                let axes: [SignedAxis; 3] = parts.try_into().map_err(|_| {
                    TrajectoryError::InvalidAxisRule(format!("expected three axes in `{}`", other))
                })?;
                AxisPermutation::new(axes)?;
                Ok(AxisRule::Signed { axes })
            }
        }
    }
}

fn convert_axes(source: FrameConvention, target: FrameConvention) -> Result<[SignedAxis; 3]> {
    let (src, dst) = match (source.axes(), target.axes()) {
        (Some(src), Some(dst)) => (src, dst),
        _ => {
            return Err(TrajectoryError::InvalidAxisRule(format!(
                "cannot convert between {:?} and {:?}",
                source, target
            )))
        }
    };
    let mut axes = [SignedAxis::X; 3];
    for (out, direction) in axes.iter_mut().zip(dst) {
        let (basis, sign) = direction.basis();
        let input = src
            .iter()
            .position(|d| d.basis().0 == basis)
            .ok_or_else(|| {
                TrajectoryError::InvalidAxisRule(format!(
                    "{:?} has no axis along {:?}",
                    source, direction
                ))
            })?;
        *out = SignedAxis::new(input, src[input].basis().1 * sign < 0.0);
    }
    Ok(axes)
}

/// 已校验的带符号轴置换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPermutation {
    axes: [SignedAxis; 3],
}

impl AxisPermutation {
    pub fn new(axes: [SignedAxis; 3]) -> Result<Self> {
        let mut used = [false; 3];
        for a in axes.iter() {
            if a.axis > 2 || used[a.axis] {
                return Err(TrajectoryError::InvalidAxisRule(format!(
                    "[{}, {}, {}] is not a permutation of x, y, z",
                    axes[0], axes[1], axes[2]
                )));
            }
            used[a.axis] = true;
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> [SignedAxis; 3] {
        self.axes
    }

    pub fn inverse(&self) -> Self {
        let mut axes = [SignedAxis::X; 3];
        for (out, a) in self.axes.iter().enumerate() {
            axes[a.axis] = SignedAxis::new(out, a.negate);
        }
        Self { axes }
    }

    /// 置换矩阵 P，满足 apply_position(v) == P * v
    pub fn matrix(&self) -> Matrix3<f64> {
        let mut m = Matrix3::zeros();
        for (row, a) in self.axes.iter().enumerate() {
            m[(row, a.axis)] = a.sign();
        }
        m
    }

    /// det(P)，为 -1 时 P 是一次反射
    pub fn determinant(&self) -> f64 {
        self.matrix().determinant()
    }

    pub fn apply_position(&self, v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.axes[0].pick(v),
            self.axes[1].pick(v),
            self.axes[2].pick(v),
        )
    }

    /// 姿态 R 在新坐标系下为 P R Pᵀ
    ///
    /// 用真旋转 det(P)·P 共轭四元数：标量部分不变，向量部分按该旋转变换。
    /// 不要求输入为单位四元数，范数保持不变。
    pub fn apply_orientation(&self, q: &Quaternion<f64>) -> Quaternion<f64> {
        let vector = Vector3::new(q.coords[0], q.coords[1], q.coords[2]);
        let mut rotated = self.apply_position(&vector);
        if self.determinant() < 0.0 {
            rotated = -rotated;
        }
        Quaternion::new(q.coords[3], rotated.x, rotated.y, rotated.z)
    }
}

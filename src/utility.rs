use nalgebra::{Quaternion, UnitQuaternion};

/// 四元数范数下限，低于此值视为退化
pub const MIN_QUAT_NORM: f64 = 1e-12;

pub struct Utility {}

impl Utility {
    /// (x, y, z, w) 顺序构造四元数
    #[inline]
    pub fn quat_from_xyzw(xyzw: [f64; 4]) -> Quaternion<f64> {
        Quaternion::new(xyzw[3], xyzw[0], xyzw[1], xyzw[2])
    }

    /// 按 (x, y, z, w) 顺序输出
    #[inline]
    pub fn quat_to_xyzw(q: &Quaternion<f64>) -> [f64; 4] {
        // coords 的存储顺序为 (i, j, k, w)
        let c = &q.coords;
        [c[0], c[1], c[2], c[3]]
    }

    /// 归一化四元数；非有限或零范数时返回 None
    #[inline]
    pub fn try_normalize(q: &Quaternion<f64>) -> Option<UnitQuaternion<f64>> {
        if !q.coords.iter().all(|c| c.is_finite()) {
            return None;
        }
        UnitQuaternion::try_new(*q, MIN_QUAT_NORM)
    }
}

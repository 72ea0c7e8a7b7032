use nalgebra::{Quaternion, Vector3};

use crate::utility::Utility;

/// 一个测量时刻：时间戳、位置和可选的姿态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 单位 s
    pub timestamp: f64,
    pub position: Vector3<f64>,
    /// 不要求单位长度，(x, y, z, w) 读入
    pub orientation: Option<Quaternion<f64>>,
}

impl Sample {
    pub fn new(timestamp: f64, position: Vector3<f64>) -> Self {
        Self {
            timestamp,
            position,
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, xyzw: [f64; 4]) -> Self {
        self.orientation = Some(Utility::quat_from_xyzw(xyzw));
        self
    }

    pub fn orientation_xyzw(&self) -> Option<[f64; 4]> {
        self.orientation.as_ref().map(Utility::quat_to_xyzw)
    }
}

#[test]
fn test_sample_orientation() {
    let sample = Sample::new(0.5, Vector3::new(1.0, 2.0, 3.0)).with_orientation([0.0, 0.0, 0.0, 1.0]);
    assert_eq!(sample.orientation_xyzw(), Some([0.0, 0.0, 0.0, 1.0]));
    assert_eq!(Sample::new(0.0, Vector3::zeros()).orientation_xyzw(), None);
}

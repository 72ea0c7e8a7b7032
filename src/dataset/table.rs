use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Result, TrajectoryError};

/// 带列名的数值表，按行存储
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    data: Array2<f64>,
}

impl Table {
    /// 行比列名短时以 NaN 补齐，更长时截断
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let mut data = Array2::from_elem((rows.len(), names.len()), f64::NAN);
        for (mut dst, src) in data.axis_iter_mut(Axis(0)).zip(rows) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = *s;
            }
        }
        Self { names, data }
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| TrajectoryError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let index = self.column_index(name)?;
        Ok(self.data.column(index))
    }

    /// 按给定顺序取出若干列，任一列缺失即失败
    pub fn select(&self, wanted: &[String]) -> Result<Table> {
        let indices = wanted
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            names: wanted.to_vec(),
            data: self.data.select(Axis(1), &indices),
        })
    }
}

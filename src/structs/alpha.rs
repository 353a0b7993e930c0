use ndarray::Array1;
use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

/// Coefficient vector aligned with a grid storage's id space.
///
/// Holds either nodal samples or hierarchical surpluses, one entry per grid
/// point id. A thin wrapper around [ndarray::Array1], providing the
/// resize/compact operations the adaptive steps need.
///
/// After [Alpha::resize] grows the vector, the new entries are zero-filled
/// but contractually uninitialized: callers must repopulate them before the
/// next hierarchization.
#[derive(Debug, Clone, PartialEq)]
pub struct Alpha {
    values: Array1<f64>,
}

impl Default for Alpha {
    fn default() -> Self {
        Self {
            values: Array1::zeros(0),
        }
    }
}

impl Alpha {
    pub fn new(values: Array1<f64>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            values: Array1::zeros(len),
        }
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from_vec(values),
        }
    }

    /// Get a reference to the underlying array.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Get a mutable reference to the underlying array.
    pub fn values_mut(&mut self) -> &mut Array1<f64> {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Resize to `new_len`, zero-padding or truncating at the tail.
    pub fn resize(&mut self, new_len: usize) {
        let mut resized = Array1::zeros(new_len);
        let keep = self.values.len().min(new_len);
        for i in 0..keep {
            resized[i] = self.values[i];
        }
        self.values = resized;
    }

    /// Drop the entries at `removed` (pre-removal ids), keeping the
    /// surviving entries aligned with a storage compacted by the same set.
    pub fn compact(&mut self, removed: &BTreeSet<usize>) {
        let survivors: Vec<f64> = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, &v)| v)
            .collect();
        self.values = Array1::from_vec(survivors);
    }
}

impl Index<usize> for Alpha {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.values[i]
    }
}

impl IndexMut<usize> for Alpha {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.values[i]
    }
}

impl From<Vec<f64>> for Alpha {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

impl From<Array1<f64>> for Alpha {
    fn from(values: Array1<f64>) -> Self {
        Self::new(values)
    }
}

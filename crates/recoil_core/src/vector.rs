//! Fixed-cardinality vectors
//!
//! Every animated value is carried as a [`Vector`] of one to four `f64`
//! components. The component count is fixed when the vector is created and
//! all arithmetic is bounded to it; trailing slots are never read.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{AnimationError, Result};

/// Maximum number of components a vector can hold
pub const MAX_COMPONENTS: usize = 4;

/// A vector of 1 to 4 components
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct Vector {
    values: [f64; MAX_COMPONENTS],
    len: u8,
}

impl Vector {
    /// Create a zero vector with `len` components
    pub fn zeros(len: usize) -> Result<Self> {
        if len == 0 || len > MAX_COMPONENTS {
            return Err(AnimationError::UnsupportedCardinality(len));
        }
        Ok(Self {
            values: [0.0; MAX_COMPONENTS],
            len: len as u8,
        })
    }

    /// Create a vector from a slice of 1 to 4 components
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let mut vector = Self::zeros(values.len())?;
        vector.values[..values.len()].copy_from_slice(values);
        Ok(vector)
    }

    /// Create a vector from single-precision components
    pub fn from_f32(values: &[f32]) -> Result<Self> {
        let mut vector = Self::zeros(values.len())?;
        for (dst, src) in vector.values.iter_mut().zip(values) {
            *dst = f64::from(*src);
        }
        Ok(vector)
    }

    /// Number of active components
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false: every constructor rejects zero components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len()]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        let len = self.len();
        &mut self.values[..len]
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.as_slice().iter()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.as_slice().get(idx).copied()
    }

    /// Sum of squared components
    pub fn squared_norm(&self) -> f64 {
        self.iter().map(|v| v * v).sum()
    }

    pub fn norm(&self) -> f64 {
        self.squared_norm().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|v| *v == 0.0)
    }

    /// Round every component to the nearest multiple of `1 / sub`.
    ///
    /// Pass 2.0 to round to every 0.5.
    pub fn sub_round(&mut self, sub: f64) {
        for v in self.as_mut_slice() {
            *v = (*v * sub).round() / sub;
        }
    }

    /// Linear interpolation from `from` towards `to` by `fraction`
    pub fn lerp(from: &Vector, to: &Vector, fraction: f64) -> Vector {
        debug_assert_eq!(from.len, to.len);
        let mut out = *from;
        for (idx, v) in out.as_mut_slice().iter_mut().enumerate() {
            *v += fraction * (to.values[idx] - *v);
        }
        out
    }

    /// True when every component of `self` is within `epsilon` of `other`
    pub fn approx_eq(&self, other: &Vector, epsilon: f64) -> bool {
        self.len == other.len
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| (a - b).abs() < epsilon)
    }

    /// Cast to single precision, e.g. for GPU-facing writers
    pub fn to_f32(&self) -> SmallVec<[f32; MAX_COMPONENTS]> {
        self.iter().map(|v| *v as f32).collect()
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, v) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, idx: usize) -> &f64 {
        &self.as_slice()[idx]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.as_mut_slice()[idx]
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(mut self, rhs: Vector) -> Vector {
        self += rhs;
        self
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        debug_assert_eq!(self.len, rhs.len);
        for (a, b) in self.as_mut_slice().iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(mut self, rhs: Vector) -> Vector {
        self -= rhs;
        self
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        debug_assert_eq!(self.len, rhs.len);
        for (a, b) in self.as_mut_slice().iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(mut self, rhs: f64) -> Vector {
        for v in self.as_mut_slice() {
            *v *= rhs;
        }
        self
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self * -1.0
    }
}

impl From<f64> for Vector {
    fn from(value: f64) -> Self {
        Self {
            values: [value, 0.0, 0.0, 0.0],
            len: 1,
        }
    }
}

impl From<[f64; 2]> for Vector {
    fn from(v: [f64; 2]) -> Self {
        Self {
            values: [v[0], v[1], 0.0, 0.0],
            len: 2,
        }
    }
}

impl From<[f64; 3]> for Vector {
    fn from(v: [f64; 3]) -> Self {
        Self {
            values: [v[0], v[1], v[2], 0.0],
            len: 3,
        }
    }
}

impl From<[f64; 4]> for Vector {
    fn from(values: [f64; 4]) -> Self {
        Self { values, len: 4 }
    }
}

impl From<Vector> for Vec<f64> {
    fn from(vector: Vector) -> Self {
        vector.as_slice().to_vec()
    }
}

impl TryFrom<Vec<f64>> for Vector {
    type Error = AnimationError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Vector::from_slice(&values)
    }
}

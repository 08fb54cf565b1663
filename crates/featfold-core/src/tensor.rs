//! Host-graph tensor with paired data and gradient buffers
//!
//! [`Tensor`] is the unit of exchange between the host compute graph and a
//! layer. It owns a contiguous row-major data buffer and a gradient buffer of
//! the same length, both sized by a dynamic [`Shape`].
//!
//! Resizing through [`Tensor::reshape`] reuses the existing storage: buffers
//! only grow, and an unchanged shape is a no-op.

use crate::error::{FeatFoldError, Result};
use crate::types::{FeatureDims, Shape};
use scirs2_core::ndarray_ext::{Array, ArrayView, ArrayViewMut, IxDyn};
use scirs2_core::numeric::Num;
use smallvec::SmallVec;

/// Dense row-major tensor with a gradient buffer of the same shape.
///
/// # Examples
///
/// ```
/// use featfold_core::Tensor;
///
/// let mut tensor = Tensor::<f32>::zeros(&[1, 3, 5, 4]);
/// assert_eq!(tensor.len(), 60);
///
/// tensor[&[0, 1, 2, 3]] = 7.0;
/// assert_eq!(tensor[&[0, 1, 2, 3]], 7.0);
///
/// // Same shape: nothing changes
/// assert!(!tensor.reshape(&[1, 3, 5, 4]));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tensor<T> {
    shape: Shape,
    data: Vec<T>,
    grad: Vec<T>,
}

impl<T> Tensor<T>
where
    T: Clone + Num,
{
    /// Create a tensor with no shape and no storage.
    ///
    /// This is the state of a freshly allocated layer buffer before the first
    /// reshape.
    pub fn empty() -> Self {
        Self {
            shape: Shape::new(),
            data: Vec::new(),
            grad: Vec::new(),
        }
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: &[usize]) -> Self {
        let count = shape.iter().product();
        Self {
            shape: SmallVec::from_slice(shape),
            data: vec![T::zero(); count],
            grad: vec![T::zero(); count],
        }
    }

    /// Create a tensor from row-major data; the gradient starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`FeatFoldError::ShapeMismatch`] when `data.len()` differs from
    /// the shape's element count.
    ///
    /// # Examples
    ///
    /// ```
    /// use featfold_core::Tensor;
    ///
    /// let tensor = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
    /// assert_eq!(tensor[&[0, 0, 1, 0]], 3.0);
    ///
    /// assert!(Tensor::from_vec(vec![1.0, 2.0], &[1, 1, 2, 2]).is_err());
    /// ```
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let count: usize = shape.iter().product();
        if data.len() != count {
            return Err(FeatFoldError::shape_mismatch(
                "from_vec",
                &[count],
                &[data.len()],
            ));
        }
        Ok(Self {
            shape: SmallVec::from_slice(shape),
            grad: vec![T::zero(); count],
            data,
        })
    }

    /// Create a tensor from an ndarray; elements are copied in logical
    /// (row-major) order.
    pub fn from_array(array: &Array<T, IxDyn>) -> Self {
        let shape = array.shape().to_vec();
        let data: Vec<T> = array.iter().cloned().collect();
        let count = data.len();
        Self {
            shape: SmallVec::from_vec(shape),
            data,
            grad: vec![T::zero(); count],
        }
    }

    /// Copy the data buffer into an owned ndarray.
    pub fn to_array(&self) -> Result<Array<T, IxDyn>> {
        Array::from_shape_vec(IxDyn(&self.shape), self.data.clone())
            .map_err(|e| FeatFoldError::Array(e.to_string()))
    }

    /// Copy the gradient buffer into an owned ndarray.
    pub fn grad_to_array(&self) -> Result<Array<T, IxDyn>> {
        Array::from_shape_vec(IxDyn(&self.shape), self.grad.clone())
            .map_err(|e| FeatFoldError::Array(e.to_string()))
    }

    /// Borrow the data buffer as an ndarray view.
    pub fn view(&self) -> Result<ArrayView<'_, T, IxDyn>> {
        ArrayView::from_shape(IxDyn(&self.shape), &self.data)
            .map_err(|e| FeatFoldError::Array(e.to_string()))
    }

    /// Borrow the data buffer as a mutable ndarray view.
    pub fn view_mut(&mut self) -> Result<ArrayViewMut<'_, T, IxDyn>> {
        ArrayViewMut::from_shape(IxDyn(&self.shape), &mut self.data)
            .map_err(|e| FeatFoldError::Array(e.to_string()))
    }

    /// Resize the tensor in place.
    ///
    /// Returns `true` when the shape changed. Existing storage is reused:
    /// buffers grow when the element count increases and keep their capacity
    /// when it shrinks. Element values are unspecified after a real size
    /// change.
    ///
    /// # Examples
    ///
    /// ```
    /// use featfold_core::Tensor;
    ///
    /// let mut tensor = Tensor::<f64>::empty();
    /// assert!(tensor.reshape(&[2, 3, 4, 4]));
    /// assert_eq!(tensor.len(), 96);
    /// assert!(!tensor.reshape(&[2, 3, 4, 4]));
    ///
    /// assert!(tensor.reshape(&[1, 1, 2, 2]));
    /// assert!(tensor.capacity() >= 96);
    /// ```
    pub fn reshape(&mut self, shape: &[usize]) -> bool {
        let count: usize = shape.iter().product();
        if self.shape.as_slice() == shape && self.data.len() == count {
            return false;
        }
        self.shape = SmallVec::from_slice(shape);
        self.data.resize(count, T::zero());
        self.grad.resize(count, T::zero());
        true
    }

    /// Interpret the shape as `(num, channels, height, width)`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatFoldError::InvalidInputShape`] when the tensor is not
    /// rank 4 or has a zero extent.
    pub fn dims(&self) -> Result<FeatureDims> {
        FeatureDims::from_shape(&self.shape)
    }

    /// The tensor shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements the data buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Data buffer in row-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable data buffer in row-major order.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Gradient buffer in row-major order.
    pub fn grad(&self) -> &[T] {
        &self.grad
    }

    /// Mutable gradient buffer in row-major order.
    pub fn grad_mut(&mut self) -> &mut [T] {
        &mut self.grad
    }

    /// Set every data element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value.clone());
    }

    /// Set every gradient element to zero.
    pub fn zero_grad(&mut self) {
        self.grad.iter_mut().for_each(|g| *g = T::zero());
    }

    fn linear_index(&self, index: &[usize]) -> usize {
        assert_eq!(
            index.len(),
            self.shape.len(),
            "index {:?} has wrong rank for shape {:?}",
            index,
            self.shape
        );
        index
            .iter()
            .zip(self.shape.iter())
            .fold(0, |acc, (&i, &extent)| {
                assert!(
                    i < extent,
                    "index {:?} out of bounds for shape {:?}",
                    index,
                    self.shape
                );
                acc * extent + i
            })
    }
}

impl<T: Clone + Num> Default for Tensor<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + Num> std::ops::Index<&[usize]> for Tensor<T> {
    type Output = T;
    fn index(&self, index: &[usize]) -> &Self::Output {
        &self.data[self.linear_index(index)]
    }
}

impl<T: Clone + Num> std::ops::IndexMut<&[usize]> for Tensor<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        let i = self.linear_index(index);
        &mut self.data[i]
    }
}

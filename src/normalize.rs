//! Feature-axis normalization
//!
//! Burn has no counterpart of an `F.normalize`-style L2 projection, so it
//! lives here.

use burn::tensor::{backend::Backend, Tensor};

/// Lower bound on the norm, keeps all-zero vectors at zero instead of NaN
pub const L2_EPSILON: f32 = 1e-12;

/// L2 normalization along the last axis.
///
/// This is defined as:
/// `f(v) = v / max(‖v‖₂, ε)`
///
/// Every non-zero feature vector ends up with unit Euclidean norm.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::tensor::Tensor;
/// use firegcn::normalize::L2Norm;
///
/// type Backend = NdArray<f32>;
/// let device = Default::default();
///
/// let x = Tensor::<Backend, 2>::from_floats([[3.0, 4.0]], &device);
/// let y = L2Norm::forward(x);
/// ```
pub struct L2Norm;

impl L2Norm {
    /// Applies L2 normalization to the last axis of a tensor of any rank.
    pub fn forward<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
        let norm = x
            .clone()
            .powf_scalar(2.0)
            .sum_dim(D - 1)
            .sqrt()
            .clamp_min(L2_EPSILON);
        x.div(norm)
    }
}

/// Tensor extension applying [`L2Norm`]
pub trait L2Normalize {
    fn l2_normalize(self) -> Self;
}

impl<B: Backend, const D: usize> L2Normalize for Tensor<B, D> {
    fn l2_normalize(self) -> Self {
        L2Norm::forward(self)
    }
}

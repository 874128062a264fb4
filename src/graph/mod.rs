//! # Graph Supports
//!
//! Two graphs drive every spatio-temporal convolution:
//!
//! | Graph | Built from | Lifetime |
//! |-------|------------|----------|
//! | Static grid graph ([`GridAdjacency`]) | pixel coordinates, 8 neighbours | once, at construction |
//! | Adaptive graph ([`adaptive_supports`]) | node embeddings | every forward pass |
//!
//! Both are turned into a *support stack* of shape `[link_len, N, N]`. For the
//! diffusion kind the stack is `[I, A, A², …]`; for the Chebyshev kind it holds
//! the Chebyshev polynomials of the scaled Laplacian.
//!
//! ```rust
//! use firegcn::graph::{GridAdjacency, SupportKind};
//!
//! let grid = GridAdjacency::new(3, 3).unwrap();
//! let stack = grid.supports(SupportKind::Diffusion, 2).unwrap();
//! assert_eq!(stack.shape(), &[2, 9, 9]);
//! ```

use crate::error::Result;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

mod adaptive;
mod grid;

pub use adaptive::{adaptive_adjacency, adaptive_supports, support_powers};
pub use grid::{power_stack, GridAdjacency};

/// Polynomial family used for the static grid supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupportKind {
    /// Powers of the row-normalized adjacency
    #[default]
    Diffusion,
    /// Chebyshev polynomials of the scaled Laplacian
    Chebyshev,
}

/// Serializable description of the static grid graph
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub link_len: usize,
    #[serde(default)]
    pub support: SupportKind,
}

impl GridConfig {
    pub fn new(width: usize, height: usize, link_len: usize) -> Self {
        Self {
            width,
            height,
            link_len,
            support: SupportKind::Diffusion,
        }
    }

    pub fn with_support(mut self, support: SupportKind) -> Self {
        self.support = support;
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    /// Support stack as an ndarray of shape `[link_len, N, N]`
    pub fn build(&self) -> Result<Array3<f32>> {
        GridAdjacency::new(self.width, self.height)?.supports(self.support, self.link_len)
    }

    /// Support stack moved onto a backend device
    pub fn build_tensor<B: Backend>(&self, device: &B::Device) -> Result<Tensor<B, 3>> {
        Ok(tensor_from_array3(&self.build()?, device))
    }
}

/// Convert an ndarray matrix to a Burn tensor
pub fn tensor_from_array2<B: Backend>(arr: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let shape = arr.shape();
    let data: Vec<f32> = arr.iter().copied().collect();
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([shape[0], shape[1]])
}

/// Convert an ndarray support stack to a Burn tensor
pub fn tensor_from_array3<B: Backend>(arr: &Array3<f32>, device: &B::Device) -> Tensor<B, 3> {
    let shape = arr.shape();
    let data: Vec<f32> = arr.iter().copied().collect();
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([shape[0], shape[1], shape[2]])
}

/// `n × n` identity on the given device
pub fn identity<B: Backend>(n: usize, device: &B::Device) -> Tensor<B, 2> {
    tensor_from_array2(&Array2::<f32>::eye(n), device)
}

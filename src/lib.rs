//! # firegcn - Spatio-Temporal Graph Convolutional GRU (Rust)
//!
//! Wildfire forecasting over a rectangular pixel grid using the Burn framework.
//!
//! ## Features
//!
//! - **Grid graph**: 8-neighbour adjacency with self-loops, row-normalized,
//!   expanded into diffusion or Chebyshev support stacks
//! - **Adaptive graph**: `softmax(relu(E·Eᵀ))` from learned node embeddings,
//!   rebuilt on every forward pass
//! - **Embedding-generated weights**: per-node filters projected from shared
//!   low-rank pools instead of `N` independent weight matrices
//! - **Spatio-temporal block**: adaptive diffusion, grid diffusion and a learned
//!   temporal kernel, each L2-normalized, fused with a per-node bias
//! - **GCN-GRU**: GRU cell and multi-layer stack built on those blocks
//! - **Classifier**: layer norm, encoder and linear head producing class
//!   log-probabilities
//!
//! ## Quick Start
//!
//! ```rust
//! use firegcn::prelude::*;
//!
//! let grid = GridAdjacency::new(5, 4).unwrap();
//! let supports = grid.diffusion_supports(3).unwrap();
//!
//! assert_eq!(grid.num_nodes(), 20);
//! assert_eq!(supports.shape(), &[3, 20, 20]);
//! ```
//!
//! ## Model-level Usage
//!
//! ```ignore
//! use firegcn::model::FireGcnConfig;
//!
//! let model = FireGcnConfig::new(25, 25, 12)
//!     .with_hidden_dim(24)
//!     .with_window_len(10)
//!     .init::<Backend>(&device)?;
//!
//! // [batch, T=10, features=12, N=625] -> [batch, 2]
//! let log_probs = model.forward(input)?;
//! ```

pub mod cells;
pub mod error;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod rnn;

pub use error::{GcnError, Result};

pub mod prelude {
    pub use crate::cells::{GcnGruCell, GraphDims, SpatioTemporalConv};
    pub use crate::error::{GcnError, Result};
    pub use crate::graph::{GridAdjacency, GridConfig, SupportKind};
    pub use crate::model::{FireGcn, FireGcnConfig};
    pub use crate::normalize::{L2Norm, L2Normalize};
    pub use crate::rnn::{GcnGru, GcnGruConfig, GcnGruOutput};
}

//! # Single-Step Building Blocks
//!
//! This module provides the per-timestep pieces of the spatio-temporal GCN.
//! They are wrapped by [`crate::rnn::GcnGru`] for sequence processing.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`node_weights`] | Generates per-node weights from a shared pool |
//! | [`SpatioTemporalConv`] | Adaptive + spatial + temporal graph convolution |
//! | [`GcnGruCell`] | GRU cell built from two convolution blocks |
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Description |
//! |--------|-------|-------------|
//! | `x` | `[batch, N, input_dim]` | Input at the current step |
//! | `window` | `[batch, T, N, input_dim]` | Whole input sequence of the layer |
//! | `state` | `[batch, N, hidden_dim]` | Hidden state |
//! | `embeddings` | `[N, embed_dim]` | Node embedding table |
//!
//! ## Example: Using GcnGruCell Directly
//!
//! ```ignore
//! use firegcn::cells::{GcnGruCell, GraphDims};
//! use firegcn::graph::GridConfig;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let supports = GridConfig::new(3, 3, 2).build_tensor::<Backend>(&device)?;
//! let mut rng = StdRng::seed_from_u64(42);
//! let cell = GcnGruCell::<Backend>::new(
//!     GraphDims::new(9, 4, 2, 5), 8, 12, supports, &mut rng, &device,
//! )?;
//!
//! let state = cell.init_state(batch, &device);
//! let next = cell.step(x_t, state, window, embeddings)?;
//! ```

pub mod gcn_gru_cell;
pub mod st_conv;
pub mod weight_pool;

pub use gcn_gru_cell::GcnGruCell;
pub use st_conv::{BranchOutputs, GraphDims, SpatioTemporalConv, NUM_BRANCHES};
pub use weight_pool::node_weights;

//! # Recurrent Stack for Sequence Processing
//!
//! [`GcnGru`] runs one [`GcnGruCell`](crate::cells::GcnGruCell) per layer over
//! a whole sequence of node features. **This is the encoder most users want.**
//!
//! ## Quick Start
//!
//! ```ignore
//! use firegcn::graph::GridConfig;
//! use firegcn::rnn::GcnGruConfig;
//!
//! let supports = GridConfig::new(25, 25, 2).build_tensor::<Backend>(&device)?;
//! let encoder = GcnGruConfig::new(625, 12, 24, 8, 2, 10).init(supports, &device)?;
//!
//! // [batch=4, T=10, N=625, features=12]
//! let output = encoder.forward(input, node_embeddings)?;
//! // output.layer_outputs[0]: [4, 10, 625, 24]
//! // output.last_states[0]:   [4, 625, 24]
//! ```
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | input | `[batch, T, N, input_dim]`, `T == window_len` |
//! | layer output | `[batch, T, N, hidden_dim]` |
//! | final state | `[batch, N, hidden_dim]` |
//!
//! ## Ordering
//!
//! Within a layer, step `t` needs the state of step `t − 1`. Layer `i + 1`
//! needs the complete output sequence of layer `i`, since every step of the
//! temporal branch reads the whole window. Layers therefore run strictly one
//! after another.
//!
//! ## All Layers
//!
//! With `return_all_layers` the output holds one sequence and one final state
//! per layer, shallowest first. Otherwise only the last layer's are kept.

pub mod gcn_gru;

pub use gcn_gru::{GcnGru, GcnGruConfig, GcnGruOutput};

//! Graph-convolutional GRU cell
//!
//! A GRU whose gate and candidate transforms are [`SpatioTemporalConv`]
//! blocks instead of dense layers:
//!
//! ```text
//! z ‖ r = σ(gate([x ‖ h]))
//! n     = tanh(update([x ‖ r ⊙ h]))
//! h'    = (1 − z) ⊙ n + z ⊙ h
//! ```
//!
//! The cell holds parameters only. Hidden state is passed in and returned.

use super::st_conv::{GraphDims, SpatioTemporalConv, NUM_BRANCHES};
use crate::error::{ensure_dims, GcnError, Result};
use burn::module::Module;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;

/// GRU cell over a node graph
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct GcnGruCell<B: Backend> {
    /// Produces update and reset gates, `2 * hidden_dim` wide
    gate: SpatioTemporalConv<B>,
    /// Produces the candidate state, `hidden_dim` wide
    update: SpatioTemporalConv<B>,
    #[module(skip)]
    num_nodes: usize,
    #[module(skip)]
    input_dim: usize,
    #[module(skip)]
    hidden_dim: usize,
}

impl<B: Backend> GcnGruCell<B> {
    /// Create a new cell
    ///
    /// # Arguments
    /// * `graph` - Node count, embedding rank, hop count and window length
    /// * `input_dim` - Width of the per-step input (and of the window)
    /// * `hidden_dim` - State width, must be divisible by 3
    /// * `static_supports` - Grid support stack `[link_len, N, N]`
    /// * `rng` - Seeded generator for parameter initialization
    /// * `device` - Device to create the module on
    pub fn new(
        graph: GraphDims,
        input_dim: usize,
        hidden_dim: usize,
        static_supports: Tensor<B, 3>,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> Result<Self> {
        if hidden_dim == 0 || hidden_dim % NUM_BRANCHES != 0 {
            return Err(GcnError::IndivisibleHidden(hidden_dim));
        }

        let gate = SpatioTemporalConv::new(
            graph,
            input_dim + hidden_dim,
            input_dim,
            2 * hidden_dim,
            static_supports.clone(),
            rng,
            device,
        )?;
        let update = SpatioTemporalConv::new(
            graph,
            input_dim + hidden_dim,
            input_dim,
            hidden_dim,
            static_supports,
            rng,
            device,
        )?;

        Ok(Self {
            gate,
            update,
            num_nodes: graph.num_nodes,
            input_dim,
            hidden_dim,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Zero state `[batch, N, hidden_dim]`
    pub fn init_state(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 3> {
        Tensor::zeros([batch_size, self.num_nodes, self.hidden_dim], device)
    }

    /// Advance the state by one time step
    ///
    /// # Arguments
    /// * `x` - Input at this step `[batch, N, input_dim]`
    /// * `state` - Previous state `[batch, N, hidden_dim]`
    /// * `window` - The whole input sequence of this layer `[batch, T, N, input_dim]`
    /// * `embeddings` - Node embeddings `[N, embed_dim]`
    ///
    /// # Returns
    /// Next state `[batch, N, hidden_dim]`
    pub fn step(
        &self,
        x: Tensor<B, 3>,
        state: Tensor<B, 3>,
        window: Tensor<B, 4>,
        embeddings: Tensor<B, 2>,
    ) -> Result<Tensor<B, 3>> {
        let batch = x.dims()[0];
        ensure_dims("step input", [batch, self.num_nodes, self.input_dim], x.dims())?;
        ensure_dims(
            "hidden state",
            [batch, self.num_nodes, self.hidden_dim],
            state.dims(),
        )?;

        let input_and_state = Tensor::cat(vec![x.clone(), state.clone()], 2);
        let z_r = activation::sigmoid(self.gate.forward(
            input_and_state,
            window.clone(),
            embeddings.clone(),
        )?);
        let update_gate = z_r.clone().narrow(2, 0, self.hidden_dim);
        let reset_gate = z_r.narrow(2, self.hidden_dim, self.hidden_dim);

        let candidate_input = Tensor::cat(vec![x, reset_gate * state.clone()], 2);
        let candidate = self
            .update
            .forward(candidate_input, window, embeddings)?
            .tanh();

        Ok(Self::blend(update_gate, candidate, state))
    }

    /// `(1 − z) ⊙ candidate + z ⊙ prev`
    ///
    /// A saturated gate returns one operand exactly: `z = 1` keeps `prev`,
    /// `z = 0` takes `candidate`.
    pub fn blend(
        update_gate: Tensor<B, 3>,
        candidate: Tensor<B, 3>,
        prev: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let ones = Tensor::<B, 3>::ones(update_gate.dims(), &update_gate.device());
        (ones - update_gate.clone()) * candidate + update_gate * prev
    }
}

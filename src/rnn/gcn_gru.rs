//! Graph-convolutional GRU stack
//!
//! Runs [`GcnGruCell`]s over a sequence, layer by layer. Each layer scans time
//! sequentially from a zero state; its full output sequence becomes the next
//! layer's input and window.

use crate::cells::{GcnGruCell, GraphDims};
use crate::error::{ensure_dims, GcnError};
use burn::config::Config;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Hyperparameters of a [`GcnGru`] stack
#[derive(Config, Debug)]
pub struct GcnGruConfig {
    /// Number of grid cells
    pub num_nodes: usize,
    /// Feature width of the raw input
    pub input_dim: usize,
    /// State width, divisible by 3
    pub hidden_dim: usize,
    /// Rank of the node embedding table
    pub embed_dim: usize,
    /// Hop count of the support stacks
    pub link_len: usize,
    /// Sequence length seen by the temporal kernel
    pub window_len: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = false)]
    pub return_all_layers: bool,
    /// Seed for parameter initialization
    #[config(default = 42)]
    pub seed: u64,
}

impl GcnGruConfig {
    pub fn graph_dims(&self) -> GraphDims {
        GraphDims::new(self.num_nodes, self.embed_dim, self.link_len, self.window_len)
    }

    /// Build the stack over the given static supports `[link_len, N, N]`
    pub fn init<B: Backend>(
        &self,
        static_supports: Tensor<B, 3>,
        device: &B::Device,
    ) -> crate::Result<GcnGru<B>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        GcnGru::new(self, static_supports, &mut rng, device)
    }
}

/// Per-layer results of a forward pass
#[derive(Debug, Clone)]
pub struct GcnGruOutput<B: Backend> {
    /// Output sequences `[batch, T, N, hidden_dim]`, one per returned layer
    pub layer_outputs: Vec<Tensor<B, 4>>,
    /// Final states `[batch, N, hidden_dim]`, one per returned layer
    pub last_states: Vec<Tensor<B, 3>>,
}

impl<B: Backend> GcnGruOutput<B> {
    /// Final state of the deepest returned layer
    pub fn last_state(&self) -> Option<Tensor<B, 3>> {
        self.last_states.last().cloned()
    }

    /// Output sequence of the deepest returned layer
    pub fn last_output(&self) -> Option<Tensor<B, 4>> {
        self.layer_outputs.last().cloned()
    }
}

/// Stacked graph-convolutional GRU
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct GcnGru<B: Backend> {
    /// One cell per layer; layer 0 reads the raw input width
    cells: Vec<GcnGruCell<B>>,
    #[module(skip)]
    num_nodes: usize,
    #[module(skip)]
    input_dim: usize,
    #[module(skip)]
    hidden_dim: usize,
    #[module(skip)]
    window_len: usize,
    /// Whether to return every layer or only the last
    #[module(skip)]
    return_all_layers: bool,
}

impl<B: Backend> GcnGru<B> {
    /// Create a new stack
    ///
    /// # Arguments
    /// * `config` - Stack hyperparameters
    /// * `static_supports` - Grid support stack `[link_len, N, N]`
    /// * `rng` - Seeded generator for parameter initialization
    /// * `device` - Device to create the module on
    pub fn new(
        config: &GcnGruConfig,
        static_supports: Tensor<B, 3>,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> crate::Result<Self> {
        if config.num_layers == 0 {
            return Err(GcnError::BadConfig("at least one recurrent layer is required"));
        }
        if config.input_dim == 0 {
            return Err(GcnError::BadConfig("input width must be at least 1"));
        }
        let graph = config.graph_dims();

        let mut cells = Vec::with_capacity(config.num_layers);
        for layer in 0..config.num_layers {
            let input_dim = if layer == 0 {
                config.input_dim
            } else {
                config.hidden_dim
            };
            cells.push(GcnGruCell::new(
                graph,
                input_dim,
                config.hidden_dim,
                static_supports.clone(),
                rng,
                device,
            )?);
        }

        tracing::debug!(
            num_layers = config.num_layers,
            num_nodes = config.num_nodes,
            input_dim = config.input_dim,
            hidden_dim = config.hidden_dim,
            "created GCN-GRU stack"
        );

        Ok(Self {
            cells,
            num_nodes: config.num_nodes,
            input_dim: config.input_dim,
            hidden_dim: config.hidden_dim,
            window_len: config.window_len,
            return_all_layers: config.return_all_layers,
        })
    }

    /// Set whether every layer's outputs are returned (default: false)
    pub fn with_return_all_layers(mut self, return_all_layers: bool) -> Self {
        self.return_all_layers = return_all_layers;
        self
    }

    pub fn num_layers(&self) -> usize {
        self.cells.len()
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

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn cell(&self, layer: usize) -> Option<&GcnGruCell<B>> {
        self.cells.get(layer)
    }

    /// Zero states, one per layer
    pub fn init_states(&self, batch_size: usize, device: &B::Device) -> Vec<Tensor<B, 3>> {
        self.cells
            .iter()
            .map(|cell| cell.init_state(batch_size, device))
            .collect()
    }

    /// Forward pass through every layer
    ///
    /// # Arguments
    /// * `input` - `[batch, T, N, input_dim]` with `T == window_len`
    /// * `embeddings` - Node embeddings `[N, embed_dim]`
    ///
    /// # Returns
    /// Output sequences and final states of the last layer, or of every
    /// layer when `return_all_layers` is set.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        embeddings: Tensor<B, 2>,
    ) -> crate::Result<GcnGruOutput<B>> {
        let [batch_size, seq_len, _, _] = input.dims();
        ensure_dims(
            "sequence input",
            [batch_size, self.window_len, self.num_nodes, self.input_dim],
            input.dims(),
        )?;
        let device = input.device();

        let mut layer_outputs = Vec::with_capacity(self.cells.len());
        let mut last_states = Vec::with_capacity(self.cells.len());
        let mut layer_input = input;

        for (layer, cell) in self.cells.iter().enumerate() {
            let mut state = cell.init_state(batch_size, &device);
            let mut outputs: Vec<Tensor<B, 3>> = Vec::with_capacity(seq_len);

            for t in 0..seq_len {
                tracing::trace!(layer, t, "gcn-gru step");
                let step_input = layer_input.clone().narrow(1, t, 1).squeeze::<3>(1);
                state = cell.step(step_input, state, layer_input.clone(), embeddings.clone())?;
                outputs.push(state.clone());
            }

            let layer_output: Tensor<B, 4> = Tensor::stack(outputs, 1);
            layer_input = layer_output.clone();
            layer_outputs.push(layer_output);
            last_states.push(state);
        }

        if !self.return_all_layers {
            let keep = layer_outputs.len() - 1;
            layer_outputs.drain(..keep);
            last_states.drain(..keep);
        }

        Ok(GcnGruOutput {
            layer_outputs,
            last_states,
        })
    }
}

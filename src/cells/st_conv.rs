//! Spatio-Temporal Graph Convolution Block
//!
//! Fuses three branches computed from the same input, each producing
//! `output_dim / 3` features per node:
//!
//! - **Adaptive**: diffusion over the learned adjacency `softmax(relu(E·Eᵀ))`
//! - **Spatial**: diffusion over the fixed 8-neighbour grid supports
//! - **Temporal**: per-node projection of every window slice, collapsed by a
//!   learned kernel over window positions
//!
//! Each branch is L2-normalized along the feature axis before the branches are
//! concatenated and the generated per-node bias is added.

use super::weight_pool::{node_weights, xavier_uniform};
use crate::error::{ensure_dims, GcnError, Result};
use crate::graph::adaptive_supports;
use crate::normalize::L2Normalize;
use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;

/// Number of fused branches (adaptive, spatial, temporal)
pub const NUM_BRANCHES: usize = 3;

/// Graph and window dimensions shared by every block of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphDims {
    /// Number of grid cells `N`
    pub num_nodes: usize,
    /// Rank `D` of the node embedding table
    pub embed_dim: usize,
    /// Hop count `K` of both support stacks
    pub link_len: usize,
    /// Window length `T` of the temporal kernel
    pub window_len: usize,
}

impl GraphDims {
    pub fn new(num_nodes: usize, embed_dim: usize, link_len: usize, window_len: usize) -> Self {
        Self {
            num_nodes,
            embed_dim,
            link_len,
            window_len,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.link_len == 0 {
            return Err(GcnError::InvalidHopCount(self.link_len));
        }
        if self.num_nodes == 0 {
            return Err(GcnError::BadConfig("graph needs at least one node"));
        }
        if self.embed_dim == 0 {
            return Err(GcnError::BadConfig("embedding dimension must be at least 1"));
        }
        if self.window_len == 0 {
            return Err(GcnError::BadConfig("window length must be at least 1"));
        }
        Ok(())
    }
}

/// Normalized branch outputs, each `[batch, N, output_dim / 3]`, before fusion
#[derive(Debug, Clone)]
pub struct BranchOutputs<B: Backend> {
    pub adaptive: Tensor<B, 3>,
    pub spatial: Tensor<B, 3>,
    pub temporal: Tensor<B, 3>,
}

impl<B: Backend> BranchOutputs<B> {
    /// Concatenate along the feature axis in `[adaptive, spatial, temporal]` order
    pub fn concat(self) -> Tensor<B, 3> {
        Tensor::cat(vec![self.adaptive, self.spatial, self.temporal], 2)
    }
}

/// Spatio-temporal graph convolution with embedding-generated weights
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct SpatioTemporalConv<B: Backend> {
    /// Adaptive-graph weight pool `[D, K, C_in, O]`
    weights_pool: Param<Tensor<B, 4>>,
    /// Static-graph weight pool `[D, K, C_in, O]`
    weights_pool_adj: Param<Tensor<B, 4>>,
    /// Temporal weight pool `[D, C_win, O]`
    weights_window: Param<Tensor<B, 3>>,
    /// Bias pool `[D, output_dim]`
    bias_pool: Param<Tensor<B, 2>>,
    /// Learned kernel over window positions `[T]`
    temporal_kernel: Param<Tensor<B, 1>>,
    /// Fixed grid supports `[K, N, N]`
    static_supports: Tensor<B, 3>,
    #[module(skip)]
    num_nodes: usize,
    #[module(skip)]
    input_dim: usize,
    #[module(skip)]
    window_dim: usize,
    #[module(skip)]
    output_dim: usize,
    #[module(skip)]
    embed_dim: usize,
    #[module(skip)]
    link_len: usize,
    #[module(skip)]
    window_len: usize,
}

impl<B: Backend> SpatioTemporalConv<B> {
    /// Create a new block
    ///
    /// # Arguments
    /// * `graph` - Node count, embedding rank, hop count and window length
    /// * `input_dim` - Feature width `C_in` of the per-step input
    /// * `window_dim` - Feature width `C_win` of the window tensor
    /// * `output_dim` - Output width, split evenly over the three branches
    /// * `static_supports` - Grid support stack `[link_len, N, N]`
    /// * `rng` - Seeded generator for parameter initialization
    /// * `device` - Device to create the module on
    pub fn new(
        graph: GraphDims,
        input_dim: usize,
        window_dim: usize,
        output_dim: usize,
        static_supports: Tensor<B, 3>,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> Result<Self> {
        graph.validate()?;
        if output_dim == 0 || output_dim % NUM_BRANCHES != 0 {
            return Err(GcnError::IndivisibleHidden(output_dim));
        }
        if input_dim == 0 || window_dim == 0 {
            return Err(GcnError::BadConfig("feature widths must be at least 1"));
        }
        let GraphDims {
            num_nodes,
            embed_dim,
            link_len,
            window_len,
        } = graph;
        ensure_dims(
            "static supports",
            [link_len, num_nodes, num_nodes],
            static_supports.dims(),
        )?;

        let sub_dim = output_dim / NUM_BRANCHES;
        let weights_pool = xavier_uniform([embed_dim, link_len, input_dim, sub_dim], rng, device);
        let weights_pool_adj =
            xavier_uniform([embed_dim, link_len, input_dim, sub_dim], rng, device);
        let weights_window = xavier_uniform([embed_dim, window_dim, sub_dim], rng, device);
        let bias_pool = xavier_uniform([embed_dim, output_dim], rng, device);
        let temporal_kernel = xavier_uniform([window_len], rng, device);

        tracing::debug!(
            num_nodes,
            input_dim,
            window_dim,
            output_dim,
            embed_dim,
            link_len,
            window_len,
            "created spatio-temporal conv block"
        );

        Ok(Self {
            weights_pool,
            weights_pool_adj,
            weights_window,
            bias_pool,
            temporal_kernel,
            static_supports,
            num_nodes,
            input_dim,
            window_dim,
            output_dim,
            embed_dim,
            link_len,
            window_len,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn window_dim(&self) -> usize {
        self.window_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Width of each branch
    pub fn sub_dim(&self) -> usize {
        self.output_dim / NUM_BRANCHES
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn link_len(&self) -> usize {
        self.link_len
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Fixed grid supports this block diffuses over
    pub fn static_supports(&self) -> Tensor<B, 3> {
        self.static_supports.clone()
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - `[batch, N, input_dim]`
    /// * `x_window` - `[batch, window_len, N, window_dim]`
    /// * `embeddings` - `[N, embed_dim]`
    ///
    /// # Returns
    /// `[batch, N, output_dim]`
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        x_window: Tensor<B, 4>,
        embeddings: Tensor<B, 2>,
    ) -> Result<Tensor<B, 3>> {
        let branches = self.forward_branches(x, x_window, embeddings.clone())?;
        let bias = node_weights(embeddings, self.bias_pool.val());
        Ok(branches.concat() + bias.unsqueeze::<3>())
    }

    /// The three normalized branches, without concatenation or bias
    pub fn forward_branches(
        &self,
        x: Tensor<B, 3>,
        x_window: Tensor<B, 4>,
        embeddings: Tensor<B, 2>,
    ) -> Result<BranchOutputs<B>> {
        self.check_inputs(&x, &x_window, &embeddings)?;

        let adaptive_supports = adaptive_supports(embeddings.clone(), self.link_len)?;
        let weights = node_weights(embeddings.clone(), self.weights_pool.val());
        let adaptive = self
            .graph_conv(adaptive_supports, x.clone(), weights)
            .l2_normalize();

        let weights_adj = node_weights(embeddings.clone(), self.weights_pool_adj.val());
        let spatial = self
            .graph_conv(self.static_supports.clone(), x, weights_adj)
            .l2_normalize();

        let temporal = self.temporal_conv(x_window, embeddings).l2_normalize();

        Ok(BranchOutputs {
            adaptive,
            spatial,
            temporal,
        })
    }

    fn check_inputs(
        &self,
        x: &Tensor<B, 3>,
        x_window: &Tensor<B, 4>,
        embeddings: &Tensor<B, 2>,
    ) -> Result<()> {
        ensure_dims(
            "node embeddings",
            [self.num_nodes, self.embed_dim],
            embeddings.dims(),
        )?;
        let batch = x.dims()[0];
        ensure_dims("input", [batch, self.num_nodes, self.input_dim], x.dims())?;
        ensure_dims(
            "window",
            [batch, self.window_len, self.num_nodes, self.window_dim],
            x_window.dims(),
        )
    }

    /// Diffuse `x` over every hop and contract with per-node per-hop weights
    ///
    /// `supports`: `[K, N, N]`, `x`: `[B, N, C]`, `weights`: `[N, K, C, O]`
    /// → `[B, N, O]`. The same supports apply to every batch element.
    fn graph_conv(
        &self,
        supports: Tensor<B, 3>,
        x: Tensor<B, 3>,
        weights: Tensor<B, 4>,
    ) -> Tensor<B, 3> {
        let [batch, num_nodes, channels] = x.dims();
        let [link_len, _, _] = supports.dims();
        let sub_dim = self.sub_dim();

        // x_g[b, k, n, c] = Σ_m S[k, n, m] · x[b, m, c]
        let supports = supports
            .unsqueeze::<4>()
            .expand([batch, link_len, num_nodes, num_nodes]);
        let x = x
            .unsqueeze_dim::<4>(1)
            .expand([batch, link_len, num_nodes, channels]);
        let x_g = supports.matmul(x);

        // [B, N, K·C] against [N, K·C, O], batched over nodes
        let x_g = x_g
            .permute([0, 2, 1, 3])
            .reshape([batch, num_nodes, link_len * channels]);
        let weights = weights.reshape([num_nodes, link_len * channels, sub_dim]);

        x_g.swap_dims(0, 1).matmul(weights).swap_dims(0, 1)
    }

    /// Project every window slice per node, then collapse time with the kernel
    ///
    /// `x_window`: `[B, T, N, C_win]` → `[B, N, O]`
    fn temporal_conv(&self, x_window: Tensor<B, 4>, embeddings: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, window_len, num_nodes, window_dim] = x_window.dims();
        let sub_dim = self.sub_dim();
        let weights = node_weights(embeddings, self.weights_window.val());

        // [N, B·T, C_win] x [N, C_win, O] -> [B, N, O, T]
        let x_w = x_window
            .permute([2, 0, 1, 3])
            .reshape([num_nodes, batch * window_len, window_dim])
            .matmul(weights)
            .reshape([num_nodes, batch, window_len, sub_dim])
            .permute([1, 0, 3, 2]);

        let kernel = self
            .temporal_kernel
            .val()
            .reshape([1, 1, 1, window_len]);

        x_w.mul(kernel)
            .sum_dim(3)
            .reshape([batch, num_nodes, sub_dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GridConfig;
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend as BurnBackend;
    use burn::tensor::Distribution;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    fn create_block(
        input_dim: usize,
        window_dim: usize,
        output_dim: usize,
        link_len: usize,
        window_len: usize,
    ) -> SpatioTemporalConv<TestBackend> {
        let device = get_test_device();
        let supports = GridConfig::new(3, 3, link_len)
            .build_tensor::<TestBackend>(&device)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1234);
        SpatioTemporalConv::new(
            GraphDims::new(9, 2, link_len, window_len),
            input_dim,
            window_dim,
            output_dim,
            supports,
            &mut rng,
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_block_creation() {
        let block = create_block(5, 2, 6, 2, 4);

        assert_eq!(block.num_nodes(), 9);
        assert_eq!(block.input_dim(), 5);
        assert_eq!(block.window_dim(), 2);
        assert_eq!(block.output_dim(), 6);
        assert_eq!(block.sub_dim(), 2);
        assert_eq!(block.link_len(), 2);
        assert_eq!(block.window_len(), 4);
    }

    #[test]
    fn test_block_forward_shape() {
        let device = get_test_device();
        let block = create_block(5, 2, 6, 2, 4);

        for batch in [1, 3] {
            let x = Tensor::<TestBackend, 3>::random(
                [batch, 9, 5],
                Distribution::Uniform(-1.0, 1.0),
                &device,
            );
            let window = Tensor::<TestBackend, 4>::random(
                [batch, 4, 9, 2],
                Distribution::Uniform(-1.0, 1.0),
                &device,
            );
            let embeddings = Tensor::<TestBackend, 2>::random(
                [9, 2],
                Distribution::Normal(0.0, 1.0),
                &device,
            );

            let out = block.forward(x, window, embeddings).unwrap();
            assert_eq!(out.dims(), [batch, 9, 6]);
        }
    }

    #[test]
    fn test_indivisible_output_rejected() {
        let device = get_test_device();
        let supports = GridConfig::new(3, 3, 2)
            .build_tensor::<TestBackend>(&device)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let err = SpatioTemporalConv::<TestBackend>::new(
            GraphDims::new(9, 2, 2, 1),
            4,
            4,
            10,
            supports,
            &mut rng,
            &device,
        )
        .unwrap_err();
        assert_eq!(err, GcnError::IndivisibleHidden(10));
    }

    #[test]
    fn test_mismatched_supports_rejected() {
        let device = get_test_device();
        // three hops built, two configured
        let supports = GridConfig::new(3, 3, 3)
            .build_tensor::<TestBackend>(&device)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let result = SpatioTemporalConv::<TestBackend>::new(
            GraphDims::new(9, 2, 2, 1),
            4,
            4,
            6,
            supports,
            &mut rng,
            &device,
        );
        assert!(matches!(result, Err(GcnError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_wrong_window_length_rejected() {
        let device = get_test_device();
        let block = create_block(3, 3, 3, 2, 4);

        let x = Tensor::<TestBackend, 3>::ones([1, 9, 3], &device);
        let window = Tensor::<TestBackend, 4>::ones([1, 5, 9, 3], &device);
        let embeddings = Tensor::<TestBackend, 2>::ones([9, 2], &device);

        let err = block.forward(x, window, embeddings).unwrap_err();
        assert_eq!(
            err,
            GcnError::ShapeMismatch {
                what: "window",
                expected: vec![1, 4, 9, 3],
                actual: vec![1, 5, 9, 3],
            }
        );
    }

    #[test]
    fn test_branches_unit_norm() {
        let device = get_test_device();
        let block = create_block(4, 4, 6, 3, 2);

        let x = Tensor::<TestBackend, 3>::random([2, 9, 4], Distribution::Uniform(0.5, 1.0), &device);
        let window =
            Tensor::<TestBackend, 4>::random([2, 2, 9, 4], Distribution::Uniform(0.5, 1.0), &device);
        let embeddings =
            Tensor::<TestBackend, 2>::random([9, 2], Distribution::Normal(0.0, 1.0), &device);

        let branches = block.forward_branches(x, window, embeddings).unwrap();
        for branch in [branches.adaptive, branches.spatial, branches.temporal] {
            assert_eq!(branch.dims(), [2, 9, 2]);
            let norms = branch.powf_scalar(2.0).sum_dim(2).sqrt();
            let max_err = (norms - 1.0).abs().max().into_scalar();
            assert!(max_err < 1e-4, "branch norm off by {}", max_err);
        }
    }

    #[test]
    fn test_spatial_branch_is_batch_invariant() {
        let device = get_test_device();
        let block = create_block(3, 3, 3, 2, 1);

        let sample =
            Tensor::<TestBackend, 3>::random([1, 9, 3], Distribution::Uniform(-1.0, 1.0), &device);
        let x = Tensor::cat(vec![sample.clone(), sample], 0);
        let window = x.clone().unsqueeze_dim::<4>(1);
        let embeddings =
            Tensor::<TestBackend, 2>::random([9, 2], Distribution::Normal(0.0, 1.0), &device);

        let branches = block.forward_branches(x, window, embeddings).unwrap();
        let first = branches.spatial.clone().narrow(0, 0, 1);
        let second = branches.spatial.narrow(0, 1, 1);
        let diff = (first - second).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    fn host<const D: usize>(tensor: Tensor<TestBackend, D>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    /// `[n, m] x [m, p]` on row-major slices
    fn host_matmul(a: &[f32], b: &[f32], n: usize, m: usize, p: usize) -> Vec<f32> {
        let mut out = vec![0.0; n * p];
        for i in 0..n {
            for j in 0..p {
                out[i * p + j] = (0..m).map(|q| a[i * m + q] * b[q * p + j]).sum();
            }
        }
        out
    }

    /// `[I, A, A², …]` with `A = softmax(relu(E·Eᵀ))`, `[K, N, N]`
    fn host_adaptive_stack(e: &[f32], n: usize, d: usize, k: usize) -> Vec<f32> {
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            let logits: Vec<f32> = (0..n)
                .map(|j| (0..d).map(|q| e[i * d + q] * e[j * d + q]).sum::<f32>().max(0.0))
                .collect();
            let max = logits.iter().cloned().fold(f32::MIN, f32::max);
            let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
            let sum: f32 = exps.iter().sum();
            for j in 0..n {
                a[i * n + j] = exps[j] / sum;
            }
        }

        let mut power: Vec<f32> = (0..n * n)
            .map(|idx| if idx / n == idx % n { 1.0 } else { 0.0 })
            .collect();
        let mut stack = Vec::with_capacity(k * n * n);
        for _ in 0..k {
            stack.extend_from_slice(&power);
            power = host_matmul(&power, &a, n, n, n);
        }
        stack
    }

    /// `Σ_{k,c} (Σ_m S[k,n,m] x[b,m,c]) · W[n,k,c,o]`, `[B, N, O]`
    fn host_graph_conv(
        s: &[f32],
        x: &[f32],
        w: &[f32],
        (b, k, n, c, o): (usize, usize, usize, usize, usize),
    ) -> Vec<f32> {
        let mut out = vec![0.0; b * n * o];
        for bi in 0..b {
            for ni in 0..n {
                for ki in 0..k {
                    for ci in 0..c {
                        let x_g: f32 = (0..n)
                            .map(|m| s[(ki * n + ni) * n + m] * x[(bi * n + m) * c + ci])
                            .sum();
                        for oi in 0..o {
                            out[(bi * n + ni) * o + oi] += x_g * w[((ni * k + ki) * c + ci) * o + oi];
                        }
                    }
                }
            }
        }
        out
    }

    fn host_l2_rows(values: &mut [f32], width: usize) {
        for row in values.chunks_mut(width) {
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt().max(1e-12);
            row.iter_mut().for_each(|v| *v /= norm);
        }
    }

    #[test]
    fn test_forward_matches_host_contraction() {
        let device = get_test_device();
        let (batch, width, height, link_len, window_len) = (2, 3, 2, 3, 4);
        let (input_dim, window_dim, output_dim, embed_dim) = (3, 2, 6, 2);
        let num_nodes = width * height;
        let sub_dim = output_dim / NUM_BRANCHES;

        let supports = GridConfig::new(width, height, link_len)
            .build_tensor::<TestBackend>(&device)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let block = SpatioTemporalConv::<TestBackend>::new(
            GraphDims::new(num_nodes, embed_dim, link_len, window_len),
            input_dim,
            window_dim,
            output_dim,
            supports,
            &mut rng,
            &device,
        )
        .unwrap();

        let x = Tensor::<TestBackend, 3>::random(
            [batch, num_nodes, input_dim],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let window = Tensor::<TestBackend, 4>::random(
            [batch, window_len, num_nodes, window_dim],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let embeddings = Tensor::<TestBackend, 2>::random(
            [num_nodes, embed_dim],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let out = host(block.forward(x.clone(), window.clone(), embeddings.clone()).unwrap());

        let x = host(x);
        let x_win = host(window);
        let e = host(embeddings);
        let graph_tail = link_len * input_dim * sub_dim;
        let w_adaptive = host_matmul(&e, &host(block.weights_pool.val()), num_nodes, embed_dim, graph_tail);
        let w_static = host_matmul(&e, &host(block.weights_pool_adj.val()), num_nodes, embed_dim, graph_tail);
        let w_window = host_matmul(
            &e,
            &host(block.weights_window.val()),
            num_nodes,
            embed_dim,
            window_dim * sub_dim,
        );
        let bias = host_matmul(&e, &host(block.bias_pool.val()), num_nodes, embed_dim, output_dim);
        let kernel = host(block.temporal_kernel.val());

        let dims = (batch, link_len, num_nodes, input_dim, sub_dim);
        let adaptive_stack = host_adaptive_stack(&e, num_nodes, embed_dim, link_len);
        let mut adaptive = host_graph_conv(&adaptive_stack, &x, &w_adaptive, dims);
        let mut spatial = host_graph_conv(&host(block.static_supports()), &x, &w_static, dims);

        // Σ_t kernel[t] · Σ_c x_win[b,t,n,c] · W_win[n,c,o]
        let mut temporal = vec![0.0; batch * num_nodes * sub_dim];
        for b in 0..batch {
            for t in 0..window_len {
                for n in 0..num_nodes {
                    for c in 0..window_dim {
                        let value = x_win[((b * window_len + t) * num_nodes + n) * window_dim + c];
                        for o in 0..sub_dim {
                            temporal[(b * num_nodes + n) * sub_dim + o] +=
                                kernel[t] * value * w_window[(n * window_dim + c) * sub_dim + o];
                        }
                    }
                }
            }
        }

        for branch in [&mut adaptive, &mut spatial, &mut temporal] {
            host_l2_rows(branch, sub_dim);
        }

        let mut max_err = 0.0f32;
        for b in 0..batch {
            for n in 0..num_nodes {
                let row = (b * num_nodes + n) * sub_dim;
                let expected = adaptive[row..row + sub_dim]
                    .iter()
                    .chain(&spatial[row..row + sub_dim])
                    .chain(&temporal[row..row + sub_dim])
                    .zip(&bias[n * output_dim..(n + 1) * output_dim])
                    .map(|(value, bias)| value + bias);
                for (o, want) in expected.enumerate() {
                    let got = out[(b * num_nodes + n) * output_dim + o];
                    max_err = max_err.max((got - want).abs());
                }
            }
        }
        assert!(max_err < 1e-4, "max abs error against host contraction: {}", max_err);
    }
}

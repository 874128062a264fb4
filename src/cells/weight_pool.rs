//! Node-embedding weight generation
//!
//! Per-node weights are never stored. Each trainable pool carries the
//! embedding rank as its leading axis, `[D, …]`, and every node's row of the
//! embedding table picks a linear combination of the `D` basis slices:
//!
//! ```text
//! out[n, …] = Σ_d E[n, d] · pool[d, …]
//! ```
//!
//! The same contraction serves the graph weights `[D, K, C_in, C_out]`, the
//! temporal weights `[D, C_in, C_out]` and the bias `[D, C_out]`.

use burn::module::Param;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Project a weight pool `[D, d1, …]` onto every node, giving `[N, d1, …]`
pub fn node_weights<B: Backend, const D: usize>(
    embeddings: Tensor<B, 2>,
    pool: Tensor<B, D>,
) -> Tensor<B, D> {
    let [num_nodes, _] = embeddings.dims();
    let mut dims = pool.dims();
    let embed_dim = dims[0];
    let tail: usize = dims[1..].iter().product();

    let flat = embeddings.matmul(pool.reshape([embed_dim, tail]));
    dims[0] = num_nodes;
    flat.reshape(dims)
}

/// Xavier-uniform initialization over the last two axes of `shape`
///
/// Rank-1 shapes use their length as both fan-in and fan-out.
pub fn xavier_uniform<B: Backend, const D: usize>(
    shape: [usize; D],
    rng: &mut StdRng,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let (fan_in, fan_out) = match shape.len() {
        0 => (1, 1),
        1 => (shape[0], shape[0]),
        n => (shape[n - 2], shape[n - 1]),
    };
    let bound = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt() as f32;
    uniform(shape, bound, rng, device)
}

/// Uniform initialization in `[-bound, bound]`
pub fn uniform<B: Backend, const D: usize>(
    shape: [usize; D],
    bound: f32,
    rng: &mut StdRng,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let len: usize = shape.iter().product();
    let data: Vec<f32> = (0..len).map(|_| rng.gen_range(-bound..=bound)).collect();
    let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape(shape);
    Param::from_tensor(tensor)
}

/// Standard-normal initialization, used for node embedding tables
pub fn standard_normal<B: Backend, const D: usize>(
    shape: [usize; D],
    rng: &mut StdRng,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let len: usize = shape.iter().product();
    let data: Vec<f32> = (0..len).map(|_| rng.sample(StandardNormal)).collect();
    let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape(shape);
    Param::from_tensor(tensor)
}

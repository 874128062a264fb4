use super::identity;
use crate::error::{GcnError, Result};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Learned adjacency `softmax_row(relu(E·Eᵀ))`
///
/// Rows sum to one. A row whose similarities are all clipped to zero becomes
/// the uniform distribution over the nodes.
pub fn adaptive_adjacency<B: Backend>(embeddings: Tensor<B, 2>) -> Tensor<B, 2> {
    let similarity = embeddings.clone().matmul(embeddings.transpose());
    activation::softmax(activation::relu(similarity), 1)
}

/// `[I, S, S², …]` with exactly `link_len` entries
pub fn support_powers<B: Backend>(adjacency: Tensor<B, 2>, link_len: usize) -> Result<Tensor<B, 3>> {
    if link_len == 0 {
        return Err(GcnError::InvalidHopCount(link_len));
    }
    let [num_nodes, _] = adjacency.dims();
    let device = adjacency.device();

    let mut supports: Vec<Tensor<B, 2>> = Vec::with_capacity(link_len);
    supports.push(identity(num_nodes, &device));
    for k in 1..link_len {
        let next = adjacency.clone().matmul(supports[k - 1].clone());
        supports.push(next);
    }

    Ok(Tensor::stack(supports, 0))
}

/// Adaptive support stack, recomputed from the current embeddings on every call
pub fn adaptive_supports<B: Backend>(
    embeddings: Tensor<B, 2>,
    link_len: usize,
) -> Result<Tensor<B, 3>> {
    support_powers(adaptive_adjacency(embeddings), link_len)
}

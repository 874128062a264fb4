use super::SupportKind;
use crate::error::{GcnError, Result};
use ndarray::{Array1, Array2, Array3, Axis};

/// Row displacement of the eight compass neighbours
const NEXT_ROW: [isize; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
/// Column displacement of the eight compass neighbours
const NEXT_COL: [isize; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

const POWER_ITERATIONS: usize = 200;
const POWER_TOLERANCE: f32 = 1e-7;

/// 8-connected adjacency of a rectangular pixel grid
///
/// Nodes are numbered row-major: `id = row * width + col`. The raw matrix
/// starts from the identity (self-loops) and, for every in-bounds neighbour
/// pair, adds one in both directions. Since every pair is visited from both
/// ends, off-diagonal neighbour entries end up at 2.
#[derive(Clone, Debug)]
pub struct GridAdjacency {
    width: usize,
    height: usize,
    adjacency: Array2<f32>,
}

impl GridAdjacency {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GcnError::InvalidGrid { width, height });
        }

        let num_nodes = width * height;
        let mut adjacency = Array2::<f32>::eye(num_nodes);

        for row in 0..height {
            for col in 0..width {
                let id = row * width + col;
                for k in 0..NEXT_ROW.len() {
                    let next_row = row as isize + NEXT_ROW[k];
                    let next_col = col as isize + NEXT_COL[k];
                    if next_row < 0
                        || next_row >= height as isize
                        || next_col < 0
                        || next_col >= width as isize
                    {
                        continue;
                    }
                    let next = next_row as usize * width + next_col as usize;
                    adjacency[[id, next]] += 1.0;
                    adjacency[[next, id]] += 1.0;
                }
            }
        }

        tracing::debug!(width, height, num_nodes, "built grid adjacency");

        Ok(Self {
            width,
            height,
            adjacency,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    /// Row-major node id of a grid cell
    pub fn node_id(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Raw (un-normalized) adjacency including self-loops
    pub fn raw(&self) -> &Array2<f32> {
        &self.adjacency
    }

    /// Number of in-bounds neighbours of a node (self excluded)
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency
            .row(node)
            .iter()
            .enumerate()
            .filter(|&(j, &v)| j != node && v > 0.0)
            .count()
    }

    /// Transition matrix: every row divided by its sum
    pub fn normalized(&self) -> Array2<f32> {
        let row_sums = self.adjacency.sum_axis(Axis(1)).insert_axis(Axis(1));
        &self.adjacency / &row_sums
    }

    /// Diffusion stack `[I, A, A², …, A^(K-1)]` of the normalized adjacency
    pub fn diffusion_supports(&self, link_len: usize) -> Result<Array3<f32>> {
        power_stack(&self.normalized(), link_len)
    }

    /// Chebyshev stack `[T0, T1, …, T_(K-1)]` of the scaled Laplacian
    ///
    /// `L̃ = 2L / λ_max − I` with `L = D − W` over the raw adjacency, and
    /// `T_k = 2·L̃·T_(k-1) − T_(k-2)`.
    pub fn chebyshev_supports(&self, link_len: usize) -> Result<Array3<f32>> {
        if link_len == 0 {
            return Err(GcnError::InvalidHopCount(link_len));
        }
        let scaled = self.scaled_laplacian();
        let n = self.num_nodes();

        let mut polys: Vec<Array2<f32>> = Vec::with_capacity(link_len);
        polys.push(Array2::eye(n));
        if link_len > 1 {
            polys.push(scaled.clone());
        }
        for k in 2..link_len {
            let next = scaled.dot(&polys[k - 1]) * 2.0 - &polys[k - 2];
            polys.push(next);
        }

        Ok(stack_matrices(&polys, n))
    }

    /// Support stack of the requested kind
    pub fn supports(&self, kind: SupportKind, link_len: usize) -> Result<Array3<f32>> {
        match kind {
            SupportKind::Diffusion => self.diffusion_supports(link_len),
            SupportKind::Chebyshev => self.chebyshev_supports(link_len),
        }
    }

    /// Combinatorial Laplacian `D − W`
    pub fn laplacian(&self) -> Array2<f32> {
        let degrees = self.adjacency.sum_axis(Axis(1));
        Array2::from_diag(&degrees) - &self.adjacency
    }

    /// `2L / λ_max − I`; a vanishing spectrum falls back to `λ_max = 2`
    pub fn scaled_laplacian(&self) -> Array2<f32> {
        let laplacian = self.laplacian();
        let mut lambda_max = largest_eigenvalue(&laplacian);
        if lambda_max <= f32::EPSILON {
            lambda_max = 2.0;
        }
        laplacian * (2.0 / lambda_max) - Array2::<f32>::eye(self.num_nodes())
    }
}

/// `[I, M, M², …]` with exactly `link_len` entries, by repeated multiplication
pub fn power_stack(matrix: &Array2<f32>, link_len: usize) -> Result<Array3<f32>> {
    if link_len == 0 {
        return Err(GcnError::InvalidHopCount(link_len));
    }
    let n = matrix.nrows();

    let mut powers: Vec<Array2<f32>> = Vec::with_capacity(link_len);
    powers.push(Array2::eye(n));
    for k in 1..link_len {
        let next = matrix.dot(&powers[k - 1]);
        powers.push(next);
    }

    Ok(stack_matrices(&powers, n))
}

fn stack_matrices(matrices: &[Array2<f32>], n: usize) -> Array3<f32> {
    let mut stacked = Array3::<f32>::zeros((matrices.len(), n, n));
    for (k, m) in matrices.iter().enumerate() {
        stacked.index_axis_mut(Axis(0), k).assign(m);
    }
    stacked
}

/// Largest eigenvalue of a symmetric positive semi-definite matrix
///
/// The start vector is a ramp rather than all-ones, which is the Laplacian's
/// null vector.
fn largest_eigenvalue(matrix: &Array2<f32>) -> f32 {
    let n = matrix.nrows();
    let mut v: Array1<f32> = Array1::from_iter((0..n).map(|i| (i + 1) as f32));
    let norm = v.dot(&v).sqrt();
    v /= norm;

    let mut lambda = 0.0f32;
    for _ in 0..POWER_ITERATIONS {
        let w = matrix.dot(&v);
        let next_lambda = v.dot(&w);
        let w_norm = w.dot(&w).sqrt();
        if w_norm <= f32::EPSILON {
            return 0.0;
        }
        v = w / w_norm;
        if (next_lambda - lambda).abs() <= POWER_TOLERANCE * next_lambda.abs().max(1.0) {
            return next_lambda;
        }
        lambda = next_lambda;
    }
    lambda
}

use std::collections::BTreeSet;

use log::debug;

use super::SparseMatrix;
use crate::{GcnErr, Result};

/// Builds the undirected adjacency of a triangulated surface.
///
/// Every face contributes its three edges, each stored once per direction no matter how many
/// faces share it, and every vertex gets a single self-loop. All stored entries are `1.0`.
///
/// # Arguments
/// * `faces` - The triangles of the mesh, as vertex indices.
/// * `num_vertices` - The amount of vertices of the mesh.
///
/// # Returns
/// The `num_vertices × num_vertices` adjacency, or `FaceIndexOutOfRange` if a face references a
/// vertex that doesn't exist.
pub fn build_adjacency(faces: &[[usize; 3]], num_vertices: usize) -> Result<SparseMatrix> {
    let mut neighbors: Vec<BTreeSet<usize>> =
        (0..num_vertices).map(|i| BTreeSet::from([i])).collect();

    for (face, &[a, b, c]) in faces.iter().enumerate() {
        if let Some(&index) = [a, b, c].iter().find(|&&v| v >= num_vertices) {
            return Err(GcnErr::FaceIndexOutOfRange {
                face,
                index,
                vertices: num_vertices,
            });
        }

        for (u, v) in [(a, b), (b, c), (c, a)] {
            neighbors[u].insert(v);
            neighbors[v].insert(u);
        }
    }

    let rows = neighbors
        .into_iter()
        .map(|row| row.into_iter().map(|j| (j, 1.0)).collect())
        .collect();

    let adjacency = SparseMatrix::from_rows(rows)?;
    debug!(
        "built adjacency: {num_vertices} vertices, {} faces, {} stored entries",
        faces.len(),
        adjacency.nnz()
    );

    Ok(adjacency)
}

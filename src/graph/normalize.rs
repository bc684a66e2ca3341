use super::SparseMatrix;

/// Computes the symmetric degree normalization `D^-1/2 · A · D^-1/2`, where `D` holds the row
/// sums of `adjacency`. Vertices whose degree is zero get a scaling factor of zero instead of an
/// infinite one, so they contribute nothing downstream.
///
/// The returned matrix keeps the sparsity pattern of `adjacency`.
pub fn normalize(adjacency: &SparseMatrix) -> SparseMatrix {
    let d_inv_sqrt: Vec<f32> = adjacency
        .row_sums()
        .into_iter()
        .map(|degree| {
            let s = degree.powf(-0.5);
            if degree == 0.0 || !s.is_finite() {
                0.0
            } else {
                s
            }
        })
        .collect();

    adjacency.map_entries(|i, j, v| d_inv_sqrt[i] * v * d_inv_sqrt[j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_adjacency;

    #[test]
    fn degenerate_face_and_isolated_vertex() {
        let adj = build_adjacency(&[[0, 1, 1]], 3).unwrap();
        let norm = normalize(&adj);

        // degrees: 2, 2, 1
        assert!((norm.get(0, 1) - 0.5).abs() < 1e-6);
        assert!((norm.get(0, 0) - 0.5).abs() < 1e-6);
        assert!((norm.get(2, 2) - 1.0).abs() < 1e-6);
        assert_eq!(norm.nnz(), adj.nnz());
    }

    #[test]
    fn keeps_symmetry() {
        let adj = build_adjacency(&[[0, 1, 2], [0, 2, 3], [3, 4, 0]], 6).unwrap();
        let norm = normalize(&adj);
        assert!(norm.is_symmetric());
    }

    #[test]
    fn keeps_sparsity_pattern() {
        let adj = build_adjacency(&[[0, 1, 2], [2, 3, 4]], 5).unwrap();
        let norm = normalize(&adj);

        for i in 0..5 {
            let a: Vec<usize> = adj.row(i).map(|(j, _)| j).collect();
            let n: Vec<usize> = norm.row(i).map(|(j, _)| j).collect();
            assert_eq!(a, n);
        }
    }

    #[test]
    fn zero_degree_rows_stay_finite() {
        let adj = SparseMatrix::from_rows(vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 1.0)], vec![]])
            .unwrap();
        let norm = normalize(&adj);

        assert!(norm.to_dense().iter().all(|v| v.is_finite()));
        assert_eq!(norm.row(2).count(), 0);
    }

    #[test]
    fn isolated_vertex_only_has_its_self_loop() {
        let adj = build_adjacency(&[[0, 1, 2]], 4).unwrap();
        let norm = normalize(&adj);

        assert_eq!(norm.get(3, 3), 1.0);
        assert!(norm.to_dense().iter().all(|v| v.is_finite()));
    }
}

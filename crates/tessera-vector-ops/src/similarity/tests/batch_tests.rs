//! Batch engine: row order, pairwise consistency, scheduling invariance.

use super::{
    both_kernels, make_rng, mixed_scale_matrix, random_matrix, random_vector, scaled,
    EXTREME_AXIS_ROWS, HUGE, TINY,
};
use crate::config::BatchConfig;
use crate::error::VectorOpsError;
use crate::similarity::batch::score_rows;
use crate::similarity::cpu::cosine_with;
use crate::similarity::kernel::Kernel;
use crate::similarity::{
    batch_cosine_similarity, batch_cosine_similarity_into, batch_cosine_similarity_into_with,
    batch_cosine_similarity_with, cosine_similarity, EmbeddingMatrix,
};

/// Forces the rayon path even for tiny batches.
fn eager_parallel(chunk_rows: usize) -> BatchConfig {
    BatchConfig {
        parallel: true,
        min_parallel_rows: 1,
        chunk_rows,
    }
}

#[test]
fn test_batch_axis_scenario() {
    let embeddings = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
    let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
    let scores = batch_cosine_similarity(&[1.0, 0.0], &matrix).unwrap();
    assert_eq!(scores, vec![1.0, 0.0, -1.0]);
}

#[test]
fn test_batch_matches_pairwise_exactly() {
    let mut rng = make_rng();
    for (rows, dim) in [(1, 1), (10, 7), (257, 37), (64, 384)] {
        let query = random_vector(&mut rng, dim);
        let data = random_matrix(&mut rng, rows, dim);
        let matrix = EmbeddingMatrix::new(&data, dim).unwrap();

        let scores = batch_cosine_similarity_with(&BatchConfig::sequential(), &query, &matrix)
            .unwrap();

        assert_eq!(scores.len(), rows);
        for (i, row) in matrix.iter_rows().enumerate() {
            let pairwise = cosine_similarity(&query, row).unwrap();
            assert_eq!(
                scores[i].to_bits(),
                pairwise.to_bits(),
                "row {} of {}x{}: batch {} vs pairwise {}",
                i,
                rows,
                dim,
                scores[i],
                pairwise
            );
        }
    }
}

#[test]
fn test_batch_portable_matches_detected() {
    let mut rng = make_rng();
    let (rows, dim) = (300, 131);
    let query = random_vector(&mut rng, dim);
    let data = random_matrix(&mut rng, rows, dim);
    let matrix = EmbeddingMatrix::new(&data, dim).unwrap();
    let config = BatchConfig::sequential();

    let mut detected = vec![0.0f32; rows];
    let mut portable = vec![0.0f32; rows];
    score_rows(&config, Kernel::detect(), &query, &matrix, &mut detected);
    score_rows(&config, Kernel::portable(), &query, &matrix, &mut portable);

    assert_eq!(detected, portable);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut rng = make_rng();
    let (rows, dim) = (1000, 24);
    let query = random_vector(&mut rng, dim);
    let data = random_matrix(&mut rng, rows, dim);
    let matrix = EmbeddingMatrix::new(&data, dim).unwrap();

    let sequential =
        batch_cosine_similarity_with(&BatchConfig::sequential(), &query, &matrix).unwrap();

    for chunk_rows in [1, 7, 64, 999] {
        let parallel = batch_cosine_similarity_with(&eager_parallel(chunk_rows), &query, &matrix)
            .unwrap();
        assert_eq!(parallel, sequential, "chunk_rows {}", chunk_rows);
    }
}

#[test]
fn test_zero_magnitude_row_scores_zero() {
    let embeddings = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0];
    let matrix = EmbeddingMatrix::new(&embeddings, 3).unwrap();
    let scores = batch_cosine_similarity(&[1.0, 1.0, 1.0], &matrix).unwrap();
    assert_eq!(scores[0], 0.0);
    assert!((scores[1] - 1.0 / 3.0f32.sqrt()).abs() < 1e-6);
}

#[test]
fn test_zero_query_scores_all_zero() {
    let mut rng = make_rng();
    let data = random_matrix(&mut rng, 20, 5);
    let matrix = EmbeddingMatrix::new(&data, 5).unwrap();
    let scores = batch_cosine_similarity(&[0.0; 5], &matrix).unwrap();
    assert!(scores.iter().all(|&s| s == 0.0));
}

#[test]
fn test_writes_only_first_rows() {
    let embeddings = [1.0, 0.0, 0.0, 1.0];
    let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
    let mut out = [7.5f32; 5];

    batch_cosine_similarity_into(&[1.0, 0.0], &matrix, &mut out).unwrap();

    assert_eq!(&out[..2], &[1.0, 0.0]);
    assert_eq!(&out[2..], &[7.5, 7.5, 7.5]);
}

#[test]
fn test_zero_dim_rows_score_zero() {
    let matrix = EmbeddingMatrix::from_parts(&[], 4, 0).unwrap();
    let mut out = [9.0f32; 4];
    batch_cosine_similarity_into(&[], &matrix, &mut out).unwrap();
    assert_eq!(out, [0.0; 4]);
}

#[test]
fn test_empty_matrix_is_ok() {
    let matrix = EmbeddingMatrix::new(&[], 3).unwrap();
    let scores = batch_cosine_similarity(&[1.0, 2.0, 3.0], &matrix).unwrap();
    assert!(scores.is_empty());
}

#[test]
fn test_rejects_query_dimension_mismatch() {
    let embeddings = [1.0, 0.0, 0.0, 1.0];
    let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
    let err = batch_cosine_similarity(&[1.0, 0.0, 0.0], &matrix).unwrap_err();
    assert_eq!(
        err,
        VectorOpsError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn test_rejects_short_output() {
    let embeddings = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
    let mut out = [0.0f32; 2];
    let err = batch_cosine_similarity_into_with(
        &BatchConfig::default(),
        &[1.0, 0.0],
        &matrix,
        &mut out,
    )
    .unwrap_err();
    assert_eq!(
        err,
        VectorOpsError::OutputTooSmall {
            buffer: "results",
            required: 3,
            actual: 2
        }
    );
    assert_eq!(out, [0.0, 0.0]);
}

// ========== Extreme Magnitudes ==========

#[test]
fn test_extreme_axis_rows_score_exactly() {
    let matrix = EmbeddingMatrix::new(&EXTREME_AXIS_ROWS, 2).unwrap();
    let config = BatchConfig::sequential();

    for query in [[1.0, 0.0], [HUGE, 0.0], [TINY, 0.0]] {
        for kernel in both_kernels() {
            let mut out = [f32::NAN; 4];
            score_rows(&config, kernel, &query, &matrix, &mut out);
            assert_eq!(out, [1.0, 0.0, 1.0, -1.0], "query {:?} on {:?}", query, kernel);
        }
        assert_eq!(
            batch_cosine_similarity(&query, &matrix).unwrap(),
            vec![1.0, 0.0, 1.0, -1.0]
        );
    }
}

#[test]
fn test_mixed_scale_batch_matches_pairwise() {
    let mut rng = make_rng();
    let (rows, dim) = (90, 21);
    let data = mixed_scale_matrix(&mut rng, rows, dim);
    let matrix = EmbeddingMatrix::new(&data, dim).unwrap();
    let base = random_vector(&mut rng, dim);

    for factor in [HUGE, TINY, 1.0] {
        let query = scaled(&base, factor);
        for kernel in both_kernels() {
            let mut out = vec![0.0f32; rows];
            score_rows(&BatchConfig::sequential(), kernel, &query, &matrix, &mut out);

            for (i, row) in matrix.iter_rows().enumerate() {
                assert!((-1.0..=1.0).contains(&out[i]), "row {}: {}", i, out[i]);
                assert_eq!(
                    out[i].to_bits(),
                    cosine_with(kernel, &query, row).to_bits(),
                    "row {} query x{} on {:?}",
                    i,
                    factor,
                    kernel
                );
            }
        }
    }
}

//! Blocked cosine-similarity kernel and edge-file export

pub mod topk;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use anyhow::{bail, Context, Result};
use ndarray::{s, Array2};
use rayon::prelude::*;

use crate::io::{LeReader, LeWriter};

use self::topk::partition_topk;

/// Read a token vector matrix: `[n: i32][dim: i32]` header followed by
/// `n * dim` row-major f32 values, all little-endian.
pub fn read_vectors(path: &str) -> Result<Array2<f32>> {
    let file = File::open(path).with_context(|| format!("opening vector file {path}"))?;
    read_vectors_from(BufReader::new(file))
}

pub fn read_vectors_from(source: impl Read) -> Result<Array2<f32>> {
    let mut reader = LeReader::new(source);
    let rows = reader.read_i32()?;
    let dim = reader.read_i32()?;
    if rows <= 0 || dim <= 0 {
        bail!("invalid vector matrix header: {rows} x {dim}");
    }
    let (rows, dim) = (rows as usize, dim as usize);

    let mut data = Vec::with_capacity(rows * dim);
    for _ in 0..rows * dim {
        data.push(reader.read_f32()?);
    }
    Ok(Array2::from_shape_vec((rows, dim), data)?)
}

/// L2-normalize each row in place so that cosine similarity reduces to a dot
/// product. Zero rows are left untouched.
pub fn normalize_rows(vectors: &mut Array2<f32>) {
    for mut row in vectors.rows_mut() {
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }
}

/// Compute the top-`n_neighbors` cosine-similarity edges for every token.
///
/// Tokens are processed in contiguous batches of `batch_size` rows; each
/// batch multiplies `V[s:e] · Vᵀ` as one dense GEMM and the batches run in
/// parallel. Per row, the n+1 highest similarities are selected with a
/// negated-score top-k partition (the extra slot absorbs the token itself,
/// which scores 1.0 on normalized input) and emitted as directed triples.
/// Batch results land in row order, so the output is grouped by token.
pub fn nearest_neighbor_edges(
    vectors: &Array2<f32>,
    n_neighbors: usize,
    batch_size: usize,
) -> Vec<(i32, i32, f32)> {
    let n_rows = vectors.nrows();
    if n_rows == 0 || n_neighbors == 0 {
        return Vec::new();
    }
    let batch_size = batch_size.max(1);
    let k = (n_neighbors + 1).min(n_rows);
    let transposed = vectors.t();

    let starts: Vec<usize> = (0..n_rows).step_by(batch_size).collect();
    let per_batch: Vec<Vec<(i32, i32, f32)>> = starts
        .into_par_iter()
        .map(|start| {
            let end = (start + batch_size).min(n_rows);
            let sims = vectors.slice(s![start..end, ..]).dot(&transposed);

            let mut edges = Vec::with_capacity((end - start) * n_neighbors);
            let mut scores = vec![0.0f32; n_rows];
            let mut idx: Vec<i32> = Vec::with_capacity(n_rows);
            for row in 0..end - start {
                let token = (start + row) as i32;
                // negate so the k smallest scores are the k most similar
                for (score, &sim) in scores.iter_mut().zip(sims.row(row).iter()) {
                    *score = -sim;
                }
                idx.clear();
                idx.extend(0..n_rows as i32);
                partition_topk(&mut idx, &scores, k);

                // the extra slot usually holds the token itself; when ties
                // push it out of the head, still emit at most n edges
                let mut kept = 0;
                for &candidate in &idx[..k] {
                    if candidate == token || kept == n_neighbors {
                        continue;
                    }
                    edges.push((token, candidate, -scores[candidate as usize]));
                    kept += 1;
                }
            }
            edges
        })
        .collect();

    per_batch.into_iter().flatten().collect()
}

/// Write edge triples as a headerless little-endian stream.
pub fn write_edges(sink: impl Write, edges: &[(i32, i32, f32)]) -> Result<()> {
    let mut writer = LeWriter::new(sink);
    for &(from, to, weight) in edges {
        writer.write_i32(from)?;
        writer.write_i32(to)?;
        writer.write_f32(weight)?;
    }
    writer.flush()
}

pub fn write_edge_file(path: &str, edges: &[(i32, i32, f32)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating graph file {path}"))?;
    write_edges(BufWriter::new(file), edges)
}

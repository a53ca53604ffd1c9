//! Matching utilities for detection-to-track association.

use ndarray::Array2;

use crate::tracker::detection::Detection;
use crate::tracker::track::Track;

/// Build the gated center-distance matrix between tracks (rows) and
/// detections (columns).
///
/// Pairs of different class, or whose distance is not strictly below
/// `proximity_threshold`, get an infinite cost.
pub fn gated_distance(tracks: &[&Track], detections: &[Detection], proximity_threshold: f32) -> Array2<f32> {
    let mut dists = Array2::from_elem((tracks.len(), detections.len()), f32::INFINITY);
    for (i, t) in tracks.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            if t.class_name() != d.class_name {
                continue;
            }
            let dist = t.distance_to(d);
            if dist < proximity_threshold {
                dists[[i, j]] = dist;
            }
        }
    }
    dists
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(track row, detection column)` pairs
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy nearest-neighbour assignment.
///
/// Detections are visited in column order; each takes the cheapest row not
/// yet claimed in this call. Ties keep the lowest row. This is not a minimum
/// cost assignment: an earlier detection can take a row a later one needed.
pub fn greedy_assignment(cost_matrix: &Array2<f32>) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    let mut claimed = vec![false; num_rows];
    let mut matches = vec![];
    let mut unmatched_detections = vec![];

    for col in 0..num_cols {
        let mut best: Option<(usize, f32)> = None;
        for row in 0..num_rows {
            if claimed[row] {
                continue;
            }
            let cost = cost_matrix[[row, col]];
            if !cost.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((row, cost));
            }
        }

        match best {
            Some((row, _)) => {
                claimed[row] = true;
                matches.push((row, col));
            }
            None => unmatched_detections.push(col),
        }
    }

    let unmatched_tracks = claimed
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c { None } else { Some(i) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// Minimum total cost assignment (Jonker-Volgenant), keeping only pairs with
/// cost strictly below `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    // lapjv needs finite costs: gated and padding cells cost more than any
    // full assignment of real pairs.
    let size = num_rows.max(num_cols);
    let max_cost = cost_matrix
        .iter()
        .filter(|c| c.is_finite())
        .fold(0.0_f64, |acc, &c| acc.max(c as f64));
    let pad = (max_cost + 1.0) * size as f64 + 1.0;
    let mut padded = Array2::<f64>::from_elem((size, size), pad);

    for i in 0..num_rows {
        for j in 0..num_cols {
            let cost = cost_matrix[[i, j]];
            if cost.is_finite() {
                padded[[i, j]] = cost as f64;
            }
        }
    }

    let result = lapjv::lapjv(&padded);
    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match result {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx >= num_cols {
                    unmatched_tracks.push(row_idx);
                } else if cost_matrix[[row_idx, col_idx]] < thresh {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(_) => {
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    // Report matches in detection order, the order tracks are updated in.
    matches.sort_by_key(|&(_, col)| col);

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

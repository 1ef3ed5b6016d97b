// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Merge/dedup of near-duplicate features within one frame.
//!
//! The algorithm is greedy and single-pass. Candidates are visited
//! in detection order; each surviving candidate absorbs up to
//! [`MERGE_FANOUT`] of its nearest surviving neighbours closer than the cutoff.
//! The survivor moves to the mean position of its group and takes the summed
//! intensity, keeping its own shape value.
//!
//! Because absorbed points are excluded immediately, an elongated cluster of
//! three or more points can end up only partially merged when a point at the
//! edge of the cluster is visited first. Output depends on input order.

use crate::config::consts::MERGE_FANOUT;
use crate::features::Point;

/// Merge features within `cutoff` of each other. `cutoff <= 0` returns the input unchanged.
pub fn merge_groups(points: &[Point], cutoff: f64) -> Vec<Point> {
    if cutoff <= 0.0 || points.len() < 2 {
        return points.to_vec();
    }

    // Distances are measured between the original detections; merged
    // positions are only used for the output.
    let mut merged = points.to_vec();
    let mut absorbed = vec![false; points.len()];

    for i in 0..points.len() {
        if absorbed[i] {
            continue;
        }

        let mut neighbours: Vec<(f64, usize)> = (0..points.len())
            .filter(|&j| j != i && !absorbed[j])
            .map(|j| (points[i].distance_to(&points[j]), j))
            .filter(|&(d, _)| d < cutoff)
            .collect();
        if neighbours.is_empty() {
            continue;
        }
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        neighbours.truncate(MERGE_FANOUT);

        let group: Vec<usize> = std::iter::once(i)
            .chain(neighbours.iter().map(|&(_, j)| j))
            .collect();
        let n = group.len() as f64;
        let x = group.iter().map(|&k| merged[k].x).sum::<f64>() / n;
        let y = group.iter().map(|&k| merged[k].y).sum::<f64>() / n;
        let intensity = group.iter().map(|&k| merged[k].intensity).sum::<f64>();

        merged[i] = Point { x, y, intensity, shape: merged[i].shape };
        for &(_, j) in &neighbours {
            absorbed[j] = true;
        }
    }

    merged
        .into_iter()
        .zip(absorbed)
        .filter_map(|(p, gone)| (!gone).then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, intensity: f64) -> Point {
        Point::new(x, y, intensity, 1.0)
    }

    #[test]
    fn test_close_pair_merges_to_mean_with_summed_intensity() {
        let d = 4.0;
        let points = vec![pt(10.0, 10.0, 2.0), pt(10.0 + d / 2.0, 10.0, 3.0)];

        let merged = merge_groups(&points, d);

        assert_eq!(merged.len(), 1);
        assert!((merged[0].x - 11.0).abs() < 1e-12);
        assert!((merged[0].y - 10.0).abs() < 1e-12);
        assert!((merged[0].intensity - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distant_pair_is_untouched() {
        let d = 4.0;
        let points = vec![pt(10.0, 10.0, 2.0), pt(10.0 + 2.0 * d, 10.0, 3.0)];

        assert_eq!(merge_groups(&points, d), points);
    }

    #[test]
    fn test_non_positive_cutoff_is_a_no_op() {
        let points = vec![pt(0.0, 0.0, 1.0), pt(0.1, 0.0, 1.0)];
        assert_eq!(merge_groups(&points, 0.0), points);
        assert_eq!(merge_groups(&points, -1.0), points);
    }

    #[test]
    fn test_chain_merge_depends_on_order() {
        // a - b - c spaced 1.5 apart with cutoff 2: a and c are 3 apart.
        let a = pt(0.0, 0.0, 1.0);
        let b = pt(1.5, 0.0, 1.0);
        let c = pt(3.0, 0.0, 1.0);

        // Edge point first: a absorbs b, then c has no surviving neighbour.
        let edge_first = merge_groups(&[a, b, c], 2.0);
        assert_eq!(edge_first.len(), 2);
        assert!((edge_first[0].x - 0.75).abs() < 1e-12);
        assert_eq!(edge_first[1], c);

        // Middle point first: b absorbs both.
        let middle_first = merge_groups(&[b, a, c], 2.0);
        assert_eq!(middle_first.len(), 1);
        assert!((middle_first[0].x - 1.5).abs() < 1e-12);
        assert!((middle_first[0].intensity - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fanout_limits_group_size() {
        // Seven points on top of each other: the first absorbs its five nearest,
        // then the leftover point absorbs the first survivor in turn.
        let points: Vec<Point> = (0..7).map(|i| pt(i as f64 * 0.01, 0.0, 1.0)).collect();
        let merged = merge_groups(&points, 1.0);

        assert_eq!(merged.len(), 1);
        assert!((merged[0].intensity - 7.0).abs() < 1e-12);
        assert!((merged[0].x - 0.0425).abs() < 1e-9);
    }
}

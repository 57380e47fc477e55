//! Iso-contour extraction on rectilinear grids (marching squares).
//!
//! The grid is padded with a virtual ring of nodes that lie below every
//! level, so a region touching the grid edge is closed along that edge
//! instead of leaking out as an open line. NaN nodes count as below.
use ndarray::Array2;
use std::collections::BTreeMap;

/// A contour line. Closed polylines repeat their first vertex at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

impl Polyline {
    /// Euclidean length along the vertices.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0).hypot(w[1].1 - w[0].1))
            .sum()
    }
}

/// Grid edge in padded coordinates: `H(i, j)` joins `(i, j)`–`(i+1, j)`,
/// `V(i, j)` joins `(i, j)`–`(i, j+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    H(usize, usize),
    V(usize, usize),
}

struct PaddedGrid<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
    values: &'a Array2<f64>,
}

impl PaddedGrid<'_> {
    fn nx(&self) -> usize {
        self.xs.len() + 2
    }

    fn ny(&self) -> usize {
        self.ys.len() + 2
    }

    /// Value at padded node `(i, j)`; the padding ring is `-∞`.
    fn value(&self, i: usize, j: usize) -> f64 {
        if i == 0 || j == 0 || i > self.xs.len() || j > self.ys.len() {
            return f64::NEG_INFINITY;
        }
        let v = self.values[[i - 1, j - 1]];
        if v.is_nan() { f64::NEG_INFINITY } else { v }
    }

    /// Coordinates of padded node `(i, j)`; padding reuses the nearest real node.
    fn point(&self, i: usize, j: usize) -> (f64, f64) {
        let ii = i.clamp(1, self.xs.len()) - 1;
        let jj = j.clamp(1, self.ys.len()) - 1;
        (self.xs[ii], self.ys[jj])
    }

    fn crossing(&self, edge: Edge, level: f64) -> (f64, f64) {
        let (a, b) = match edge {
            Edge::H(i, j) => ((i, j), (i + 1, j)),
            Edge::V(i, j) => ((i, j), (i, j + 1)),
        };
        let (va, vb) = (self.value(a.0, a.1), self.value(b.0, b.1));
        let t = if va.is_infinite() {
            1.0
        } else if vb.is_infinite() {
            0.0
        } else {
            ((level - va) / (vb - va)).clamp(0.0, 1.0)
        };
        let (pa, pb) = (self.point(a.0, a.1), self.point(b.0, b.1));
        (pa.0 + t * (pb.0 - pa.0), pa.1 + t * (pb.1 - pa.1))
    }
}

/// Extract the `level` iso-lines of `values[[i, j]]` sampled at `(xs[i], ys[j])`.
///
/// Nodes with `value >= level` are inside. Saddle cells are resolved with the
/// cell-centre average. Returns an empty vector for mismatched shapes.
pub fn contour_lines(xs: &[f64], ys: &[f64], values: &Array2<f64>, level: f64) -> Vec<Polyline> {
    if values.dim() != (xs.len(), ys.len()) || xs.is_empty() || ys.is_empty() {
        return Vec::new();
    }
    let grid = PaddedGrid { xs, ys, values };
    let segments = march(&grid, level);
    link(&segments)
        .into_iter()
        .map(|(edges, closed)| Polyline {
            points: edges.into_iter().map(|e| grid.crossing(e, level)).collect(),
            closed,
        })
        .collect()
}

fn march(grid: &PaddedGrid<'_>, level: f64) -> Vec<[Edge; 2]> {
    let mut segments = Vec::new();
    for i in 0..grid.nx() - 1 {
        for j in 0..grid.ny() - 1 {
            let v = [
                grid.value(i, j),
                grid.value(i + 1, j),
                grid.value(i + 1, j + 1),
                grid.value(i, j + 1),
            ];
            let inside = v.map(|x| x >= level);
            let case = inside.iter().enumerate().fold(0u8, |acc, (k, &b)| acc | ((b as u8) << k));
            let (bottom, right, top, left) =
                (Edge::H(i, j), Edge::V(i + 1, j), Edge::H(i, j + 1), Edge::V(i, j));
            match case {
                0 | 15 => {}
                1 | 14 => segments.push([left, bottom]),
                2 | 13 => segments.push([bottom, right]),
                3 | 12 => segments.push([left, right]),
                4 | 11 => segments.push([right, top]),
                6 | 9 => segments.push([bottom, top]),
                7 | 8 => segments.push([left, top]),
                5 | 10 => {
                    let centre_inside = v.iter().sum::<f64>() / 4.0 >= level;
                    // Corners 0 and 2 share a state in case 5, corners 1 and 3 in case 10.
                    if (case == 5) == centre_inside {
                        segments.push([bottom, right]);
                        segments.push([top, left]);
                    } else {
                        segments.push([left, bottom]);
                        segments.push([right, top]);
                    }
                }
                _ => unreachable!("marching-squares case index is four bits"),
            }
        }
    }
    segments
}

/// Chain segments sharing an edge into polylines of edges.
fn link(segments: &[[Edge; 2]]) -> Vec<(Vec<Edge>, bool)> {
    let mut by_edge: BTreeMap<Edge, Vec<usize>> = BTreeMap::new();
    for (s, seg) in segments.iter().enumerate() {
        for &e in seg {
            by_edge.entry(e).or_default().push(s);
        }
    }
    let mut used = vec![false; segments.len()];
    let next_from = |edge: Edge, used: &[bool]| -> Option<usize> {
        by_edge.get(&edge).and_then(|ids| ids.iter().copied().find(|&s| !used[s]))
    };

    // Open chains start at edges touched by a single segment.
    let mut starts: Vec<usize> = by_edge
        .values()
        .filter(|ids| ids.len() == 1)
        .map(|ids| ids[0])
        .collect();
    starts.extend(0..segments.len());

    let mut lines = Vec::new();
    for s in starts {
        if used[s] {
            continue;
        }
        used[s] = true;
        let [a, b] = segments[s];
        let first_is_open = by_edge.get(&b).is_some_and(|ids| ids.len() == 1);
        let mut chain = if first_is_open { vec![b, a] } else { vec![a, b] };
        while let Some(n) = chain.last().and_then(|&e| next_from(e, &used)) {
            used[n] = true;
            let [p, q] = segments[n];
            let tail = chain[chain.len() - 1];
            chain.push(if p == tail { q } else { p });
        }
        let closed = chain.len() > 2 && chain.first() == chain.last();
        if !closed {
            while let Some(n) = chain.first().and_then(|&e| next_from(e, &used)) {
                used[n] = true;
                let [p, q] = segments[n];
                chain.insert(0, if p == chain[0] { q } else { p });
            }
        }
        lines.push((chain, closed));
    }
    lines
}

/// Whether `(x, y)` lies inside the polygon (ray casting, boundary excluded).
pub fn point_in_polygon(polygon: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - A single closed contour around the peak of a radial bowl.
    // - Regions touching the grid edge being closed by the padding ring.
    // - Two separated peaks producing two closed contours.
    // - Ray-casting point-in-polygon.
    // -------------------------------------------------------------------------

    fn axis(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        (0..n).map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64).collect()
    }

    #[test]
    // Purpose
    // -------
    // The level set of a radial bowl is a closed ring near the true circle.
    //
    // Given
    // -----
    // - `f(x, y) = −(x² + y²)/2` on a 41×41 grid over `[−3, 3]²`, level `−2`.
    //
    // Expect
    // ------
    // - Exactly one closed polyline whose vertices lie within 0.02 of radius 2.
    fn bowl_contour_is_closed_circle() {
        let xs = axis(-3.0, 3.0, 41);
        let ys = xs.clone();
        let values =
            Array2::from_shape_fn((41, 41), |(i, j)| -0.5 * (xs[i] * xs[i] + ys[j] * ys[j]));
        let lines = contour_lines(&xs, &ys, &values, -2.0);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.closed);
        assert_eq!(line.points.first(), line.points.last());
        for &(x, y) in &line.points {
            assert!((x.hypot(y) - 2.0).abs() < 0.02, "({x}, {y})");
        }
    }

    #[test]
    fn region_touching_edge_is_closed_by_padding() {
        let xs = axis(0.0, 1.0, 5);
        let ys = axis(0.0, 1.0, 5);
        let values = Array2::from_elem((5, 5), 1.0);
        let lines = contour_lines(&xs, &ys, &values, 0.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].closed);
        // The ring runs along the outer nodes of the grid.
        for &(x, y) in &lines[0].points {
            assert!(x == 0.0 || x == 1.0 || y == 0.0 || y == 1.0, "({x}, {y})");
        }
    }

    #[test]
    fn separated_peaks_give_two_contours() {
        let xs = axis(-4.0, 4.0, 33);
        let ys = axis(-2.0, 2.0, 17);
        let bump = |x: f64, y: f64, cx: f64| (-(x - cx).powi(2) - y * y).exp();
        let values =
            Array2::from_shape_fn((33, 17), |(i, j)| {
                bump(xs[i], ys[j], -2.0) + bump(xs[i], ys[j], 2.0)
            });
        let lines = contour_lines(&xs, &ys, &values, 0.5);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.closed));
    }

    #[test]
    fn point_in_polygon_uses_even_odd_rule() {
        let square = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert!(point_in_polygon(&square, 1.0, 1.0));
        assert!(!point_in_polygon(&square, 3.0, 1.0));
        assert!(!point_in_polygon(&square[..2], 1.0, 0.0));
    }
}

//! Candidate values for profiled parameters.
//!
//! - [`ParamRange`]: two monotone rays from the optimum to each bound (1-D).
//! - [`ProfileGrid`]: per-axis step sizes for signed offsets around a 2-D
//!   optimum, plus the number of layers the grid supports.
//! - [`SquareArena`]: fixed-size square storage addressed by signed offsets,
//!   filled layer by layer.
//! - [`layer_ring`]: the perimeter of one layer in visiting order.

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|k| start + step * k as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Candidate values on both sides of an optimum.
///
/// Both sequences start at the optimum; `left` descends to the lower bound
/// and `right` ascends to the upper bound, `resolution` points each. A side
/// whose bound equals the optimum holds the optimum alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRange {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl ParamRange {
    pub fn new(optimum: f64, lower: f64, upper: f64, resolution: usize) -> Self {
        let ray = |bound: f64| {
            if bound == optimum { vec![optimum] } else { linspace(optimum, bound, resolution) }
        };
        Self { left: ray(lower), right: ray(upper) }
    }
}

/// One axis of a bivariate grid: offset `k` maps to `centre + k·step`, with
/// separate steps below and above the centre so that offset `±resolution`
/// lands exactly on a bound.
///
/// When the centre sits on a bound that side is closed: its offsets borrow
/// the other side's step so coordinates stay strictly increasing, but they
/// lie outside the box and are never solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub centre: f64,
    pub step_lower: f64,
    pub step_upper: f64,
    pub resolution: usize,
    pub lower_open: bool,
    pub upper_open: bool,
}

impl GridAxis {
    pub fn new(centre: f64, lower: f64, upper: f64, resolution: usize) -> Self {
        let r = resolution.max(1) as f64;
        let (below, above) = ((centre - lower) / r, (upper - centre) / r);
        let (lower_open, upper_open) = (below > 0.0, above > 0.0);
        let fallback = if lower_open { below } else if upper_open { above } else { 1.0 };
        Self {
            centre,
            step_lower: if lower_open { below } else { fallback },
            step_upper: if upper_open { above } else { fallback },
            resolution,
            lower_open,
            upper_open,
        }
    }

    /// Whether `offset` lies inside the bounds.
    pub fn admits(&self, offset: isize) -> bool {
        offset == 0 || (offset < 0 && self.lower_open) || (offset > 0 && self.upper_open)
    }

    /// Nearest admitted offset to `offset`.
    pub fn clamp_offset(&self, offset: isize) -> isize {
        if self.admits(offset) { offset } else { 0 }
    }

    pub fn coordinate(&self, offset: isize) -> f64 {
        if offset < 0 {
            self.centre + offset as f64 * self.step_lower
        } else {
            self.centre + offset as f64 * self.step_upper
        }
    }

    /// Coordinates of offsets `-radius..=radius`, ascending.
    pub fn coordinates(&self, radius: usize) -> Vec<f64> {
        let r = radius as isize;
        (-r..=r).map(|k| self.coordinate(k)).collect()
    }
}

/// Offset grid around a bivariate optimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileGrid {
    pub axes: [GridAxis; 2],
}

impl ProfileGrid {
    pub fn new(first: GridAxis, second: GridAxis) -> Self {
        Self { axes: [first, second] }
    }

    /// Largest layer the grid can hold: the finer of the two resolutions.
    pub fn max_layers(&self) -> usize {
        self.axes[0].resolution.min(self.axes[1].resolution)
    }

    pub fn point(&self, offset: (isize, isize)) -> (f64, f64) {
        (self.axes[0].coordinate(offset.0), self.axes[1].coordinate(offset.1))
    }

    /// Whether both coordinates of `offset` lie inside the bounds.
    pub fn admits(&self, offset: (isize, isize)) -> bool {
        self.axes[0].admits(offset.0) && self.axes[1].admits(offset.1)
    }

    /// Nearest admitted offset, clamping each axis independently.
    pub fn clamp_offset(&self, offset: (isize, isize)) -> (isize, isize) {
        (self.axes[0].clamp_offset(offset.0), self.axes[1].clamp_offset(offset.1))
    }
}

/// Offsets of layer `layer` (Chebyshev distance `layer` from the centre).
///
/// Order: bottom row left→right, right column bottom→top, top row
/// right→left, left column top→bottom. Layer 0 is the centre alone.
pub fn layer_ring(layer: usize) -> Vec<(isize, isize)> {
    if layer == 0 {
        return vec![(0, 0)];
    }
    let l = layer as isize;
    let mut ring = Vec::with_capacity(8 * layer);
    ring.extend((-l..=l).map(|i| (i, -l)));
    ring.extend((-l + 1..=l).map(|j| (l, j)));
    ring.extend((-l..l).rev().map(|i| (i, l)));
    ring.extend((-l + 1..l).rev().map(|j| (-l, j)));
    ring
}

/// Square buffer of side `2·radius + 1` addressed by offsets in
/// `-radius..=radius`, stored at `index = centre + offset`.
///
/// `filled` is the outermost layer whose admitted cells are all written;
/// cells beyond it are never read by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareArena<T> {
    radius: usize,
    cells: Vec<Option<T>>,
    filled: Option<usize>,
}

impl<T> SquareArena<T> {
    pub fn new(radius: usize) -> Self {
        let side = 2 * radius + 1;
        let mut cells = Vec::with_capacity(side * side);
        cells.resize_with(side * side, || None);
        Self { radius, cells, filled: None }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    fn slot(&self, offset: (isize, isize)) -> Option<usize> {
        let r = self.radius as isize;
        let (i, j) = offset;
        if i.abs() > r || j.abs() > r {
            return None;
        }
        let side = self.side();
        Some((i + r) as usize * side + (j + r) as usize)
    }

    pub fn get(&self, offset: (isize, isize)) -> Option<&T> {
        self.slot(offset).and_then(|s| self.cells[s].as_ref())
    }

    /// Write a cell; offsets outside the arena are ignored and reported as `false`.
    pub fn set(&mut self, offset: (isize, isize), value: T) -> bool {
        match self.slot(offset) {
            Some(s) => {
                self.cells[s] = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn filled_layers(&self) -> Option<usize> {
        self.filled
    }

    pub fn mark_filled(&mut self, layer: usize) {
        self.filled = Some(layer.min(self.radius));
    }

    /// Consume the arena, keeping only the square of radius `radius`.
    pub fn crop(mut self, radius: usize) -> SquareArena<T> {
        let radius = radius.min(self.radius);
        let r = radius as isize;
        let mut out = SquareArena::new(radius);
        for i in -r..=r {
            for j in -r..=r {
                if let Some(value) = self.slot((i, j)).and_then(|s| self.cells[s].take()) {
                    out.set((i, j), value);
                }
            }
        }
        out.filled = self.filled.map(|f| f.min(radius));
        out
    }
}

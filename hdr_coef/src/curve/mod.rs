use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{HdrCoefError, Result};

pub mod atm;
pub mod bezier;
pub mod eotf;


pub use atm::StaticToneMapper;
pub use bezier::BezierCurve;
pub use eotf::EotfCurve;

/// Fixed point domain of a sampled curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveRange {
    pub input: i64,
    pub output: i64,
    /// Smallest x the evaluators query, also the leaf width of the sampler
    pub min_x: i64,
}

/// Bit widths of a curve sub-module, as declared by the module specifiers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CurveBits {
    pub x_bits: u32,
    pub y_bits: u32,
    pub min_x_bits: u32,
}

impl CurveBits {
    pub fn tone_map_range(&self) -> CurveRange {
        CurveRange {
            input: 1 << self.x_bits,
            output: 1 << self.y_bits,
            min_x: 1 << self.min_x_bits,
        }
    }

    /// EOTF outputs saturate one below the power of two.
    pub fn eotf_range(&self) -> CurveRange {
        CurveRange {
            output: (1 << self.y_bits) - 1,
            ..self.tone_map_range()
        }
    }
}

/// A total, side effect free function over `[0, range.input]`.
pub trait CurveEvaluator {
    fn range(&self) -> CurveRange;

    fn get_y(&self, x: i64) -> i64;
}

/// Breakpoints ready to be packed: ascending x, the last pair stored as a
/// delta from the one before it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CurvePoints {
    pub xs: Vec<i64>,
    pub ys: Vec<i64>,
}

impl CurvePoints {
    /// Breakpoints with the final pair restored to absolute coordinates
    pub fn absolute(&self) -> Vec<(i64, i64)> {
        let mut points: Vec<(i64, i64)> = self
            .xs
            .iter()
            .copied()
            .zip(self.ys.iter().copied())
            .collect();

        let n = points.len();
        if n >= 2 {
            points[n - 1].0 += points[n - 2].0;
            points[n - 1].1 += points[n - 2].1;
        }

        points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    left_x: i64,
    left_y: i64,
    right_x: i64,
    right_y: i64,
    cur_x: i64,
    cur_y: i64,
    prev_y: i64,
    next_y: i64,
    cost: i64,
}

impl Candidate {
    fn new(
        (left_x, left_y): (i64, i64),
        (right_x, right_y): (i64, i64),
        eval: &dyn CurveEvaluator,
    ) -> Self {
        let cur_x = (left_x + right_x) >> 1;
        let quarter = (right_x - left_x) >> 2;

        let cur_y = eval.get_y(cur_x);
        let prev_y = eval.get_y(cur_x - quarter);
        let next_y = eval.get_y(cur_x + quarter);

        let cost = (cur_y - ((left_y + right_y) >> 1)).abs()
            + (prev_y - ((left_y * 3 + right_y) >> 2)).abs()
            + (next_y - ((left_y + right_y * 3) >> 2)).abs();

        Self {
            left_x,
            left_y,
            right_x,
            right_y,
            cur_x,
            cur_y,
            prev_y,
            next_y,
            cost,
        }
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then(self.cur_x.cmp(&other.cur_x))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Picks `count` breakpoints approximating `eval` by recursive bisection,
/// always splitting the interval that deviates most from linear.
pub fn sample_curve(eval: &dyn CurveEvaluator, count: usize) -> Result<CurvePoints> {
    if count < 2 {
        return Err(HdrCoefError::InvalidSampleCount(count));
    }

    let range = eval.range();

    let left = (0, eval.get_y(0));
    let right = (range.input, eval.get_y(range.input));

    let mut selected = BTreeMap::new();
    selected.insert(left.0, left.1);
    selected.entry(right.0).or_insert(right.1);

    let mut candidates = BinaryHeap::new();
    candidates.push(Candidate::new(left, right, eval));

    for _ in 0..count - 2 {
        let Some(node) = candidates.pop() else {
            break;
        };

        selected.entry(node.cur_x).or_insert(node.cur_y);

        if node.right_x - node.left_x <= range.min_x << 1 {
            continue;
        }

        let cur = (node.cur_x, node.cur_y);
        candidates.push(Candidate::new((node.left_x, node.left_y), cur, eval));
        candidates.push(Candidate::new(cur, (node.right_x, node.right_y), eval));
    }

    if selected.len() < count {
        return Err(HdrCoefError::SampleUnderflow {
            requested: count,
            produced: selected.len(),
        });
    }

    let (mut xs, mut ys): (Vec<i64>, Vec<i64>) = selected.into_iter().unzip();

    let n = xs.len();
    xs[n - 1] -= xs[n - 2];
    ys[n - 1] -= ys[n - 2];

    Ok(CurvePoints { xs, ys })
}

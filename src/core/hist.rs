//! Purpose: Bin samples into 1-D and 2-D histograms ready for plotting.
//! Exports: `BinRule`, `Histogram1D`, `Histogram2D`, `hist1d`, `hist2d`.
//! Role: The binding's only computation beyond formatting; output feeds the
//! data-block serializer.
//! Invariants: Values equal to the upper edge land in the last bin.
//! Invariants: Non-finite samples are skipped and counted, never binned.

use crate::core::datablock::{DataInput, Grid, Value};
use crate::core::error::{Error, ErrorKind};

/// How to choose bins: a fixed count, a fixed width, or `Auto` (⌈√n⌉).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinRule {
    Count(usize),
    Width(f64),
    Auto,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram1D {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub skipped: u64,
}

impl Histogram1D {
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect()
    }

    /// Centers and counts as two columns, ready for a boxes-style plot.
    pub fn to_datablock(&self) -> DataInput {
        let centers = self.centers().into_iter().map(Value::Num).collect();
        let counts = self.counts.iter().map(|n| Value::Num(*n as f64)).collect();
        DataInput::Columns(vec![centers, counts])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram2D {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub counts: Grid,
    pub skipped: u64,
}

impl Histogram2D {
    /// Center coordinates plus the count grid, ready for an image plot.
    pub fn to_datablock(&self) -> DataInput {
        let rows = centers_of(&self.x_edges).into_iter().map(Value::Num).collect();
        let cols = centers_of(&self.y_edges).into_iter().map(Value::Num).collect();
        let values = Grid::from_fn(self.counts.rows(), self.counts.cols(), |r, c| {
            self.counts.get(r, c).unwrap_or(0.0)
        });
        DataInput::LabeledGrid { rows, cols, values }
    }
}

fn centers_of(edges: &[f64]) -> Vec<f64> {
    edges
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

struct Axis {
    lo: f64,
    hi: f64,
    bins: usize,
}

impl Axis {
    fn plan(samples: &[f64], rule: BinRule) -> Result<Self, Error> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in samples {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        // A single distinct value still needs a nonzero span.
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let bins = match rule {
            BinRule::Count(0) => {
                return Err(
                    Error::new(ErrorKind::Usage).with_message("bin count must be positive")
                );
            }
            BinRule::Count(n) => n,
            BinRule::Width(w) if w > 0.0 && w.is_finite() => {
                let bins = ((hi - lo) / w).ceil().max(1.0) as usize;
                hi = lo + bins as f64 * w;
                bins
            }
            BinRule::Width(_) => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("bin width must be positive and finite"));
            }
            BinRule::Auto => (samples.len() as f64).sqrt().ceil().max(1.0) as usize,
        };
        Ok(Self { lo, hi, bins })
    }

    fn edges(&self) -> Vec<f64> {
        let step = (self.hi - self.lo) / self.bins as f64;
        let mut edges: Vec<f64> = (0..self.bins).map(|i| self.lo + i as f64 * step).collect();
        edges.push(self.hi);
        edges
    }

    fn index(&self, v: f64) -> usize {
        let frac = (v - self.lo) / (self.hi - self.lo);
        ((frac * self.bins as f64) as usize).min(self.bins - 1)
    }
}

pub fn hist1d(data: &[f64], rule: BinRule) -> Result<Histogram1D, Error> {
    let mut finite = Vec::with_capacity(data.len());
    let mut skipped = 0u64;
    for &v in data {
        if v.is_finite() {
            finite.push(v);
        } else {
            skipped += 1;
        }
    }
    if finite.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("no finite samples to bin"));
    }

    let axis = Axis::plan(&finite, rule)?;
    let mut counts = vec![0u64; axis.bins];
    for &v in &finite {
        counts[axis.index(v)] += 1;
    }

    Ok(Histogram1D {
        edges: axis.edges(),
        counts,
        skipped,
    })
}

pub fn hist2d(x: &[f64], y: &[f64], rule: BinRule) -> Result<Histogram2D, Error> {
    if x.len() != y.len() {
        return Err(Error::new(ErrorKind::ShapeMismatch).with_message(format!(
            "sample lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    let mut xs = Vec::with_capacity(x.len());
    let mut ys = Vec::with_capacity(y.len());
    let mut skipped = 0u64;
    for (&a, &b) in x.iter().zip(y) {
        if a.is_finite() && b.is_finite() {
            xs.push(a);
            ys.push(b);
        } else {
            skipped += 1;
        }
    }
    if xs.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("no finite sample pairs to bin"));
    }

    let x_axis = Axis::plan(&xs, rule)?;
    let y_axis = Axis::plan(&ys, rule)?;
    let mut counts = vec![0u64; x_axis.bins * y_axis.bins];
    for (&a, &b) in xs.iter().zip(&ys) {
        counts[x_axis.index(a) * y_axis.bins + y_axis.index(b)] += 1;
    }

    let grid = Grid::from_fn(x_axis.bins, y_axis.bins, |r, c| {
        counts[r * y_axis.bins + c] as f64
    });
    Ok(Histogram2D {
        x_edges: x_axis.edges(),
        y_edges: y_axis.edges(),
        counts: grid,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::{BinRule, hist1d, hist2d};
    use crate::core::datablock::{DataInput, render};
    use crate::core::error::ErrorKind;

    #[test]
    fn fixed_count_bins_and_upper_edge_inclusion() {
        let hist = hist1d(&[1.0, 2.0, 2.0, 3.0], BinRule::Count(2)).expect("hist");
        assert_eq!(hist.edges, vec![1.0, 2.0, 3.0]);
        // 3.0 sits on the upper edge and belongs to the last bin.
        assert_eq!(hist.counts, vec![1, 3]);
        assert_eq!(hist.skipped, 0);
    }

    #[test]
    fn width_rule_extends_the_upper_edge() {
        let hist = hist1d(&[0.0, 1.0, 2.0, 3.0], BinRule::Width(1.5)).expect("hist");
        assert_eq!(hist.edges, vec![0.0, 1.5, 3.0]);
        assert_eq!(hist.counts, vec![2, 2]);
    }

    #[test]
    fn auto_rule_uses_sqrt_of_sample_count() {
        let data: Vec<f64> = (0..9).map(f64::from).collect();
        let hist = hist1d(&data, BinRule::Auto).expect("hist");
        assert_eq!(hist.counts.len(), 3);
    }

    #[test]
    fn degenerate_span_widens_around_the_value() {
        let hist = hist1d(&[5.0, 5.0], BinRule::Count(1)).expect("hist");
        assert_eq!(hist.edges, vec![4.5, 5.5]);
        assert_eq!(hist.counts, vec![2]);
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let hist = hist1d(&[1.0, f64::NAN, 2.0, f64::INFINITY], BinRule::Count(1)).expect("hist");
        assert_eq!(hist.counts, vec![2]);
        assert_eq!(hist.skipped, 2);
    }

    #[test]
    fn empty_input_is_a_usage_error() {
        let err = hist1d(&[], BinRule::Auto).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = hist1d(&[f64::NAN], BinRule::Auto).expect_err("all skipped");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn zero_bins_and_bad_widths_are_usage_errors() {
        assert_eq!(
            hist1d(&[1.0], BinRule::Count(0)).expect_err("count").kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            hist1d(&[1.0], BinRule::Width(0.0)).expect_err("width").kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn centers_sit_between_edges() {
        let hist = hist1d(&[1.0, 2.0, 2.0, 3.0], BinRule::Count(2)).expect("hist");
        assert_eq!(hist.centers(), vec![1.5, 2.5]);
    }

    #[test]
    fn hist2d_requires_equal_sample_lengths() {
        let err = hist2d(&[1.0, 2.0], &[1.0], BinRule::Auto).expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn hist2d_counts_land_in_the_right_cells() {
        let x = [0.0, 0.0, 1.0, 1.0, 1.0];
        let y = [0.0, 1.0, 0.0, 1.0, 1.0];
        let hist = hist2d(&x, &y, BinRule::Count(2)).expect("hist");
        assert_eq!(hist.counts.get(0, 0), Some(1.0));
        assert_eq!(hist.counts.get(0, 1), Some(1.0));
        assert_eq!(hist.counts.get(1, 0), Some(1.0));
        assert_eq!(hist.counts.get(1, 1), Some(2.0));
    }

    #[test]
    fn histogram_datablocks_serialize() {
        let hist = hist1d(&[1.0, 2.0, 2.0, 3.0], BinRule::Count(2)).expect("hist");
        let lines = render(&hist.to_datablock()).expect("render");
        assert_eq!(lines, vec![" 1.5   1", " 2.5   3"]);

        let x = [0.0, 0.0, 1.0, 1.0];
        let y = [0.0, 1.0, 0.0, 1.0];
        let hist = hist2d(&x, &y, BinRule::Count(2)).expect("hist");
        match hist.to_datablock() {
            DataInput::LabeledGrid { rows, cols, values } => {
                assert_eq!(rows.len(), 2);
                assert_eq!(cols.len(), 2);
                assert_eq!((values.rows(), values.cols()), (2, 2));
            }
            other => panic!("expected labeled grid, got {other:?}"),
        }
    }
}

//! Purpose: Serialize arrays and grids into the engine's data-block text format.
//! Exports: `Value`, `Grid`, `DataInput`, `render`, `column`.
//! Role: The one pure formatting core; every data block sent to the engine
//! is produced here, line for line.
//! Invariants: Output is a pure function of the input; no I/O, no state.
//! Invariants: Shape disagreements fail the whole call; lines are never
//! truncated or padded to cover a mismatch.

use crate::core::error::{Error, ErrorKind};

/// One cell of a data block: a number or a piece of text.
///
/// Numbers format with the default `f64` display (`1`, not `1.0`); text is
/// double-quoted in the output. Non-finite numbers format as `?`, the
/// engine's conventional missing-value marker.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Num(f64),
    Text(String),
}

impl Value {
    fn field_text(&self) -> String {
        match self {
            Value::Num(v) if v.is_finite() => format!("{v}"),
            Value::Num(_) => "?".to_string(),
            Value::Text(s) => format!("\"{}\"", escape_text(s)),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Num(_))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Num(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Num(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Num(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Num(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Build a column from anything iterable over cell-convertible values.
pub fn column<I, T>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Dense row-major 2-D numeric array.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Build from nested rows. Ragged input is a shape error.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::new(ErrorKind::ShapeMismatch).with_message(format!(
                    "grid row {index} has {} values, expected {cols}",
                    row.len()
                )));
            }
        }
        let row_count = rows.len();
        let values = rows.into_iter().flatten().collect();
        Ok(Self {
            rows: row_count,
            cols,
            values,
        })
    }

    /// Build from a generator over zero-based (row, col) coordinates.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(f(r, c));
            }
        }
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// The shapes of data one call can serialize.
///
/// One variant per accepted combination, dispatched by a single formatting
/// function: plain columns, a lone grid, a grid pair, or a grid with
/// coordinate labels along both axes.
#[derive(Clone, Debug, PartialEq)]
pub enum DataInput {
    /// One or more equal-length 1-D arrays, combined column-wise.
    Columns(Vec<Vec<Value>>),
    /// A lone 2-D grid; zero-based indices become the coordinate columns.
    Grid(Grid),
    /// Two grids of identical shape, emitted value-pair per cell.
    GridPair(Grid, Grid),
    /// Row and column coordinate arrays plus the grid of cell values.
    LabeledGrid {
        rows: Vec<Value>,
        cols: Vec<Value>,
        values: Grid,
    },
}

impl DataInput {
    pub fn columns(columns: Vec<Vec<Value>>) -> Self {
        DataInput::Columns(columns)
    }

    /// Serialize into data-block lines. See [`render`].
    pub fn render(&self) -> Result<Vec<String>, Error> {
        render(self)
    }

    fn check_shape(&self) -> Result<(), Error> {
        match self {
            DataInput::Columns(columns) => {
                if columns.is_empty() {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("a data block needs at least one column"));
                }
                let len = columns[0].len();
                if columns.iter().any(|column| column.len() != len) {
                    let lengths: Vec<usize> = columns.iter().map(Vec::len).collect();
                    return Err(Error::new(ErrorKind::ShapeMismatch)
                        .with_message(format!("column lengths differ: {lengths:?}")));
                }
                Ok(())
            }
            DataInput::Grid(_) => Ok(()),
            DataInput::GridPair(a, b) => {
                if (a.rows, a.cols) != (b.rows, b.cols) {
                    return Err(Error::new(ErrorKind::ShapeMismatch).with_message(format!(
                        "grid shapes differ: {}x{} vs {}x{}",
                        a.rows, a.cols, b.rows, b.cols
                    )));
                }
                Ok(())
            }
            DataInput::LabeledGrid { rows, cols, values } => {
                if rows.len() != values.rows || cols.len() != values.cols {
                    return Err(Error::new(ErrorKind::ShapeMismatch).with_message(format!(
                        "labels {}x{} do not match grid {}x{}",
                        rows.len(),
                        cols.len(),
                        values.rows,
                        values.cols
                    )));
                }
                Ok(())
            }
        }
    }

    // Widest formatted numeric value among the call's data. Grid indices
    // are not data and do not participate.
    fn numeric_width(&self) -> usize {
        let widths = |values: &[Value]| {
            values
                .iter()
                .filter(|value| value.is_numeric())
                .map(|value| value.field_text().len())
                .max()
                .unwrap_or(0)
        };
        let grid_width = |grid: &Grid| {
            grid.values
                .iter()
                .map(|v| Value::Num(*v).field_text().len())
                .max()
                .unwrap_or(0)
        };
        match self {
            DataInput::Columns(columns) => columns.iter().map(|c| widths(c)).max().unwrap_or(0),
            DataInput::Grid(grid) => grid_width(grid),
            DataInput::GridPair(a, b) => grid_width(a).max(grid_width(b)),
            DataInput::LabeledGrid { rows, cols, values } => widths(rows)
                .max(widths(cols))
                .max(grid_width(values)),
        }
    }
}

// A rendered field carries its own separator: numeric text is right-aligned
// into (widest numeric + 1) columns, so single-digit data renders as " 1".
// Text fields are a space plus the quoted value, never aligned.
fn field(value: &Value, width: usize) -> String {
    match value {
        Value::Num(_) => format!("{:>width$}", value.field_text()),
        Value::Text(_) => format!(" {}", value.field_text()),
    }
}

fn num_field(v: f64, width: usize) -> String {
    field(&Value::Num(v), width)
}

/// Serialize one input into the engine's data-block line format.
///
/// Columns produce one line per row. Grid-shaped inputs are emitted in
/// column-major groups, one blank separator line after every group
/// including the last, matching what the engine expects for gridded data.
pub fn render(input: &DataInput) -> Result<Vec<String>, Error> {
    input.check_shape()?;
    let width = input.numeric_width() + 1;
    let mut lines = Vec::new();

    match input {
        DataInput::Columns(columns) => {
            for row in 0..columns[0].len() {
                let mut line = String::new();
                for col in columns {
                    line.push_str(&field(&col[row], width));
                }
                lines.push(line);
            }
        }
        DataInput::Grid(grid) => {
            for c in 0..grid.cols {
                for r in 0..grid.rows {
                    lines.push(format!("{r} {c} {}", num_field(grid.at(r, c), width)));
                }
                lines.push(String::new());
            }
        }
        DataInput::GridPair(a, b) => {
            for c in 0..a.cols {
                for r in 0..a.rows {
                    let mut line = num_field(a.at(r, c), width);
                    line.push_str(&num_field(b.at(r, c), width));
                    lines.push(line);
                }
                lines.push(String::new());
            }
        }
        DataInput::LabeledGrid { rows, cols, values } => {
            for c in 0..values.cols {
                for r in 0..values.rows {
                    let mut line = field(&rows[r], width);
                    line.push_str(&field(&cols[c], width));
                    line.push_str(&num_field(values.at(r, c), width));
                    lines.push(line);
                }
                lines.push(String::new());
            }
        }
    }

    Ok(lines)
}

//! Purpose: Parse column-oriented text streams into data-block columns.
//! Exports: `Delimiter`, `ErrorPolicy`, `IngestConfig`, `IngestOutcome`,
//! `read_columns`, `parse_row`.
//! Role: Input ingestion engine used by the CLI; isolates stream parsing
//! from command dispatch.
//! Invariants: The first data row fixes the column count; later rows either
//! match it, fail the call, or are skipped under the skip policy.
//! Invariants: Per-line buffering is capped; no unbounded reads.

use std::io::{BufRead, BufReader, Read};

use plotpipe::api::{Error, ErrorKind, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Delimiter {
    Auto,
    Whitespace,
    Comma,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub struct IngestConfig {
    pub delimiter: Delimiter,
    pub errors: ErrorPolicy,
    pub max_line_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Auto,
            errors: ErrorPolicy::Stop,
            max_line_bytes: 1024 * 1024,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct IngestOutcome {
    pub rows_total: u64,
    pub ok: u64,
    pub failed: u64,
}

/// Split one data line into cells; numbers parse, everything else is text.
/// Returns `None` for blank lines and `#` comments.
pub fn parse_row(line: &str, delimiter: Delimiter) -> Option<Vec<Value>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let cells: Vec<&str> = match delimiter {
        Delimiter::Comma => line.split(',').map(str::trim).collect(),
        Delimiter::Whitespace => line.split_whitespace().collect(),
        Delimiter::Auto => {
            if line.contains(',') {
                line.split(',').map(str::trim).collect()
            } else {
                line.split_whitespace().collect()
            }
        }
    };
    Some(cells.into_iter().map(parse_cell).collect())
}

fn parse_cell(cell: &str) -> Value {
    if let Ok(number) = cell.parse::<f64>() {
        return Value::Num(number);
    }
    let text = cell
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(cell);
    Value::Text(text.to_string())
}

/// Read a whole stream into equal-length columns.
pub fn read_columns<R: Read>(
    reader: R,
    config: IngestConfig,
) -> Result<(Vec<Vec<Value>>, IngestOutcome), Error> {
    let mut reader = BufReader::new(reader);
    let mut columns: Vec<Vec<Value>> = Vec::new();
    let mut outcome = IngestOutcome::default();
    let mut delimiter = config.delimiter;
    let mut line = String::new();
    let mut line_number = 0u64;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input")
                .with_source(err)
        })?;
        if read == 0 {
            break;
        }
        line_number += 1;
        if line.len() > config.max_line_bytes {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("input line {line_number} exceeds the size cap"))
                .with_hint("Raise --max-line-bytes or split the input."));
        }

        let Some(row) = parse_row(&line, delimiter) else {
            continue;
        };
        outcome.rows_total += 1;

        if columns.is_empty() {
            // Auto delimiter commits on the first data row.
            if delimiter == Delimiter::Auto {
                delimiter = if line.contains(',') {
                    Delimiter::Comma
                } else {
                    Delimiter::Whitespace
                };
            }
            columns = row.into_iter().map(|cell| vec![cell]).collect();
            outcome.ok += 1;
            continue;
        }

        if row.len() != columns.len() {
            match config.errors {
                ErrorPolicy::Stop => {
                    return Err(Error::new(ErrorKind::ShapeMismatch).with_message(format!(
                        "line {line_number} has {} fields, expected {}",
                        row.len(),
                        columns.len()
                    )));
                }
                ErrorPolicy::Skip => {
                    outcome.failed += 1;
                    continue;
                }
            }
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
        outcome.ok += 1;
    }

    Ok((columns, outcome))
}

//! Plot writer: renders the first numeric column of the result as a
//! horizontal bar chart in the terminal.
//!
//! Bars are scaled to the largest absolute value. Labels come from the
//! first string column when one exists, otherwise from the row number.
//! NULL and non-numeric values in the plotted column draw an empty bar.

use crate::rowql::sql::error::{SqlError, SqlResult};
use crate::rowql::sql::execution::types::{OutputRow, Value};
use crate::rowql::writer::Writer;
use std::io::Write as IoWrite;

const MAX_BAR_WIDTH: usize = 50;

pub struct PlotWriter {
    output: Box<dyn IoWrite>,
    name: String,
    rows: Vec<OutputRow>,
}

impl PlotWriter {
    pub fn new(output: Box<dyn IoWrite>, name: &str) -> Self {
        PlotWriter {
            output,
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    fn numeric_column(&self) -> Option<usize> {
        self.rows.iter().flat_map(|row| {
            row.columns
                .iter()
                .enumerate()
                .filter(|(_, (_, v))| v.is_numeric())
                .map(|(i, _)| i)
        }).next()
    }

    fn label_column(&self, skip: usize) -> Option<usize> {
        self.rows.first().and_then(|row| {
            row.columns
                .iter()
                .enumerate()
                .find(|(i, (_, v))| *i != skip && matches!(v, Value::Str(_)))
                .map(|(i, _)| i)
        })
    }
}

impl Writer for PlotWriter {
    fn write(&mut self, row: &OutputRow) -> SqlResult<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finalize(&mut self) -> SqlResult<()> {
        let io = |e| SqlError::io(&self.name, e);
        let column = match self.numeric_column() {
            Some(column) => column,
            None => {
                if !self.rows.is_empty() {
                    writeln!(self.output, "(no numeric column to plot)").map_err(io)?;
                }
                return self.output.flush().map_err(io);
            }
        };
        let label_column = self.label_column(column);

        let magnitudes: Vec<Option<f64>> = self
            .rows
            .iter()
            .map(|row| row.columns.get(column).and_then(|(_, v)| numeric(v)))
            .collect();
        let scale = magnitudes
            .iter()
            .flatten()
            .fold(0.0f64, |acc, m| acc.max(m.abs()));

        let labels: Vec<String> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| match label_column {
                Some(l) => row.columns[l].1.to_string(),
                None => (i + 1).to_string(),
            })
            .collect();
        let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        for (label, magnitude) in labels.iter().zip(&magnitudes) {
            let (text, bar) = match magnitude {
                Some(m) => {
                    let width = if scale > 0.0 {
                        ((m.abs() / scale) * MAX_BAR_WIDTH as f64).round() as usize
                    } else {
                        0
                    };
                    (m.to_string(), "█".repeat(width))
                }
                None => (String::new(), String::new()),
            };
            writeln!(
                self.output,
                "{:label_width$}  {:>10}  {}",
                label,
                text,
                bar,
                label_width = label_width
            )
            .map_err(io)?;
        }
        self.output.flush().map_err(io)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

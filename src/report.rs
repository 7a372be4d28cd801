// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

//! Collected results: table display and CSV output.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Column headers, matching the CSV output.
const COLUMNS: [&str; 3] = ["id", "coint_t", "pval"];

/// One scored input item.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Item identifier, derived from the input file name.
    pub id: String,
    /// Dickey-Fuller t-statistic.
    pub t_stat: f64,
    /// Approximate p-value.
    pub p_value: f64,
}

/// All collected rows, ordered by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<Row>,
}

impl ResultTable {
    /// Build a table from unordered rows; rows are sorted by id.
    pub fn new(mut rows: Vec<Row>) -> Self {
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        ResultTable { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows, in id order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Write the table as CSV.
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", COLUMNS.join(","))?;

        for row in &self.rows {
            writeln!(writer, "{},{},{}", row.id, row.t_stat, row.p_value)?;
        }

        Ok(())
    }

    /// Write the table as CSV to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);

        self.write_csv(&mut writer)
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id_width = self
            .rows
            .iter()
            .map(|r| r.id.len())
            .chain(Some(COLUMNS[0].len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:<idw$}  {:>12}  {:>12}",
            COLUMNS[0],
            COLUMNS[1],
            COLUMNS[2],
            idw = id_width
        )?;

        for row in &self.rows {
            writeln!(
                f,
                "{:<idw$}  {:>12.6}  {:>12.6}",
                row.id,
                row.t_stat,
                row.p_value,
                idw = id_width
            )?;
        }

        write!(f, "[{} rows]", self.rows.len())
    }
}

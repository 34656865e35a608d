//! Plain-text table rendering.
//!
//! Models print summaries (posterior tables, utterance costs, …) as aligned
//! columns. The output is stable plain text for terminals and logs:
//!
//! ```text
//! utterance  cost  p
//! blue       1     0.5
//! square     1     0.25
//! ```

use std::fmt::Display;

use crate::error::CoreError;

/// Trailing spaces after the widest cell of each column.
pub const DEFAULT_PADDING: usize = 2;

/// Render `rows` as left-justified columns padded by [`DEFAULT_PADDING`].
///
/// See [`render_ascii_table_padded`].
pub fn render_ascii_table<R, C>(rows: &[R]) -> Result<String, CoreError>
where
    R: AsRef<[C]>,
    C: Display,
{
    render_ascii_table_padded(rows, DEFAULT_PADDING)
}

/// Render `rows` as left-justified columns.
///
/// The first row fixes the column count. Cells past that count are ignored;
/// a row with fewer cells is [`CoreError::RaggedTable`]. A column's width is
/// the widest display string in that column across *all* rows, measured in
/// characters. Each cell is padded to `width + padding`,
/// cells are joined without a separator, and every row ends with `\n`.
pub fn render_ascii_table_padded<R, C>(rows: &[R], padding: usize) -> Result<String, CoreError>
where
    R: AsRef<[C]>,
    C: Display,
{
    let columns = rows.first().ok_or(CoreError::EmptyTable)?.as_ref().len();

    let cells = rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cells = cells.as_ref();
            if cells.len() < columns {
                return Err(CoreError::RaggedTable {
                    row,
                    expected: columns,
                    found: cells.len(),
                });
            }
            Ok(cells[..columns]
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut widths = vec![0usize; columns];
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &cells {
        for (cell, width) in row.iter().zip(&widths) {
            out.push_str(&format!("{:<w$}", cell, w = width + padding));
        }
        out.push('\n');
    }
    Ok(out)
}

// --- tests -------------------------------------------------------------------

//! Result tables rendered as an SVG image.
//!
//! Some experiments have no curve to show; their deliverable is the table of
//! readings and derived values, drawn here as a simple ruled grid.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::ResultTable;
use crate::error::AppError;
use crate::plot::charts::{Area, DrawResult, render};

const FONT_SIZE: u32 = 14;
/// Rough advance of one character at `FONT_SIZE`.
const CHAR_WIDTH: u32 = 8;
const CELL_PADDING: u32 = 16;
const ROW_HEIGHT: u32 = 26;
const TITLE_HEIGHT: u32 = 36;
const MARGIN: u32 = 20;
const TABLE_GAP: u32 = 24;

const HEADER_FILL: RGBColor = RGBColor(230, 230, 230);

/// Stack `tables` vertically in one SVG.
pub fn write_tables_svg(path: &Path, tables: &[ResultTable]) -> Result<(), AppError> {
    let layouts: Vec<Vec<u32>> = tables.iter().map(column_widths).collect();
    let width = layouts
        .iter()
        .map(|cols| cols.iter().sum::<u32>())
        .max()
        .unwrap_or(0)
        + 2 * MARGIN;
    let height = tables.iter().map(table_height).sum::<u32>()
        + TABLE_GAP * tables.len().saturating_sub(1) as u32
        + 2 * MARGIN;

    render(path, (width, height), |root| {
        let mut y = MARGIN as i32;
        for (table, cols) in tables.iter().zip(&layouts) {
            draw_table(root, table, cols, MARGIN as i32, y)?;
            y += (table_height(table) + TABLE_GAP) as i32;
        }
        Ok(())
    })
}

fn draw_table(root: &Area<'_>, table: &ResultTable, cols: &[u32], x0: i32, y0: i32) -> DrawResult {
    let text_style = ("sans-serif", FONT_SIZE).into_font().color(&BLACK);
    let title_style = ("sans-serif", FONT_SIZE + 4).into_font().color(&BLACK);

    root.draw(&Text::new(table.title.as_str(), (x0, y0 + 8), title_style))?;

    let header: Vec<String> = table.headers.clone();
    let body = table.rows.iter().map(|row| row.iter().map(|c| c.display()).collect::<Vec<_>>());
    let mut y = y0 + TITLE_HEIGHT as i32;

    for (row_idx, cells) in std::iter::once(header).chain(body).enumerate() {
        let mut x = x0;
        for (col_idx, width) in cols.iter().enumerate() {
            let w = *width as i32;
            let corners = [(x, y), (x + w, y + ROW_HEIGHT as i32)];
            if row_idx == 0 {
                root.draw(&Rectangle::new(corners, HEADER_FILL.filled()))?;
            }
            root.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))?;
            if let Some(text) = cells.get(col_idx) {
                let text_y = y + ((ROW_HEIGHT - FONT_SIZE) / 2) as i32;
                root.draw(&Text::new(text.as_str(), (x + (CELL_PADDING / 2) as i32, text_y), text_style.clone()))?;
            }
            x += w;
        }
        y += ROW_HEIGHT as i32;
    }

    Ok(())
}

fn column_widths(table: &ResultTable) -> Vec<u32> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.display().chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
        .into_iter()
        .map(|chars| chars as u32 * CHAR_WIDTH + CELL_PADDING)
        .collect()
}

fn table_height(table: &ResultTable) -> u32 {
    TITLE_HEIGHT + (table.rows.len() as u32 + 1) * ROW_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;

    fn sample_table() -> ResultTable {
        ResultTable {
            title: "Readings".to_string(),
            headers: vec!["#".to_string(), "E (V)".to_string()],
            rows: vec![
                vec![Cell::text("1"), Cell::Fixed(1.0571, 6)],
                vec![Cell::text("mean"), Cell::Fixed(1.05712, 6)],
            ],
        }
    }

    #[test]
    fn column_widths_fit_longest_cell() {
        let widths = column_widths(&sample_table());
        // "mean" vs "#", and "1.057120" vs "E (V)".
        assert_eq!(widths, vec![4 * CHAR_WIDTH + CELL_PADDING, 8 * CHAR_WIDTH + CELL_PADDING]);
        assert_eq!(table_height(&sample_table()), TITLE_HEIGHT + 3 * ROW_HEIGHT);
    }

    #[test]
    fn writes_svg_with_cell_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.svg");
        write_tables_svg(&path, &[sample_table()]).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("1.057120"));
        assert!(svg.contains("Readings"));
    }
}

// Table geometry - column widths and row heights over multi-line cells

use console::measure_text_width;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Widest single line per column, header included
    pub widths: Vec<usize>,
    /// Printed lines per row, at least one
    pub heights: Vec<usize>,
}

impl Layout {
    /// `None` when there is nothing to draw
    pub fn measure(rows: &[Vec<String>]) -> Option<Layout> {
        let columns = rows.first()?.len();
        if columns == 0 {
            return None;
        }

        let mut widths = vec![0; columns];
        let mut heights = vec![1; rows.len()];

        for (row_idx, row) in rows.iter().enumerate() {
            for (col, width) in widths.iter_mut().enumerate() {
                let cell = row.get(col).map(String::as_str).unwrap_or_default();
                let mut lines = 0;
                for line in cell.split('\n') {
                    *width = (*width).max(measure_text_width(line));
                    lines += 1;
                }
                heights[row_idx] = heights[row_idx].max(lines);
            }
        }

        Some(Layout { widths, heights })
    }

    /// Width including the three characters of padding and border per column
    pub fn total_width(&self) -> usize {
        self.widths.iter().map(|w| w + 3).sum()
    }
}

/// Line `index` of a cell, empty once the cell runs out of lines
pub fn cell_line(row: &[String], col: usize, index: usize) -> &str {
    row.get(col)
        .and_then(|cell| cell.split('\n').nth(index))
        .unwrap_or_default()
}

pub fn pad_left(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(measure_text_width(text));
    format!("{}{}", " ".repeat(fill), text)
}

/// Centered; an odd leftover space goes to the right
pub fn center(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(measure_text_width(text));
    let left = fill / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_multiline_cell_sets_row_height() {
        let rows = grid(&[&["NAME", "IP ADDRESSES"], &["eth0", "10.0.0.5/24\n10.0.0.6/24"], &["eth1", ""]]);
        let layout = Layout::measure(&rows).unwrap();

        assert_eq!(layout.widths, vec![4, 12]);
        assert_eq!(layout.heights, vec![1, 2, 1]);
        assert_eq!(layout.total_width(), 22);
    }

    #[test]
    fn test_nothing_to_measure() {
        assert!(Layout::measure(&[]).is_none());
        assert!(Layout::measure(&[vec![]]).is_none());
    }

    #[test]
    fn test_styled_text_measures_by_visible_width() {
        let rows = vec![vec!["\x1b[92mUP\x1b[0m".to_string()]];
        assert_eq!(Layout::measure(&rows).unwrap().widths, vec![2]);
    }

    #[test]
    fn test_cell_line_pads_missing_lines() {
        let row = vec!["a\nb".to_string(), "c".to_string()];
        assert_eq!(cell_line(&row, 0, 1), "b");
        assert_eq!(cell_line(&row, 1, 1), "");
        assert_eq!(cell_line(&row, 2, 0), "");
    }

    #[test]
    fn test_padding() {
        assert_eq!(pad_left("UP", 5), "   UP");
        assert_eq!(center("NAME", 7), " NAME  ");
        assert_eq!(center("TOO LONG", 3), "TOO LONG");
    }
}

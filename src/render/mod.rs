// Render module - box-drawn and plain text tables

pub mod layout;

use std::io::{self, Write};

use colored::*;

use layout::{cell_line, center, pad_left, Layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Boxed,
    Barebones,
}

/// Titled grid of text cells; the first row holds the headers
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        Table {
            title: title.to_string(),
            rows: vec![headers.iter().map(|h| h.to_string()).collect()],
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn has_data(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn render<W: Write>(&self, out: &mut W, style: Style) -> io::Result<()> {
        render(out, &self.title, &self.rows, style)
    }
}

/// Draw `rows` under `title`. Writes nothing for an empty grid.
pub fn render<W: Write>(out: &mut W, title: &str, rows: &[Vec<String>], style: Style) -> io::Result<()> {
    let Some(layout) = Layout::measure(rows) else {
        return Ok(());
    };

    match style {
        Style::Boxed => write_boxed(out, title, rows, &layout),
        Style::Barebones => write_barebones(out, title, rows, &layout),
    }
}

fn border(text: &str) -> ColoredString {
    text.bold().black()
}

/// Reserved link states get a color; everything else stays plain
fn paint_cell(raw: &str, padded: String) -> ColoredString {
    match raw {
        "UP" => padded.bright_green(),
        "DOWN" | "LOWERLAYERDOWN" => padded.red(),
        _ => padded.normal(),
    }
}

fn rule(widths: &[usize], left: char, joint: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (col, width) in widths.iter().enumerate() {
        if col > 0 {
            line.push(joint);
        }
        line.push_str(&"─".repeat(width + 2));
    }
    line.push(right);
    line
}

fn write_boxed<W: Write>(out: &mut W, title: &str, rows: &[Vec<String>], layout: &Layout) -> io::Result<()> {
    let widths = &layout.widths;

    writeln!(out, "{}", border(&rule(widths, '╭', '─', '╮')))?;
    writeln!(
        out,
        "{}{}{}",
        border("│ "),
        center(title, layout.total_width().saturating_sub(3)).black().on_white(),
        border(" │")
    )?;
    writeln!(out, "{}", border(&rule(widths, '├', '┬', '┤')))?;

    let mut header = String::new();
    for (col, width) in widths.iter().enumerate() {
        let text = cell_line(&rows[0], col, 0);
        header.push_str(&format!("{}{}", border("│"), center(text, width + 2).bold()));
    }
    writeln!(out, "{}{}", header, border("│"))?;
    writeln!(out, "{}", border(&rule(widths, '├', '┼', '┤')))?;

    for (row_idx, row) in rows.iter().enumerate().skip(1) {
        for line_idx in 0..layout.heights[row_idx] {
            let mut line = String::new();
            for (col, width) in widths.iter().enumerate() {
                let text = cell_line(row, col, line_idx);
                line.push_str(&format!("{}{} ", border("│"), paint_cell(text, pad_left(text, width + 1))));
            }
            writeln!(out, "{}{}", line, border("│"))?;
        }

        if row_idx < rows.len() - 1 {
            writeln!(out, "{}", border(&rule(widths, '├', '┼', '┤')))?;
        }
    }

    writeln!(out, "{}", border(&rule(widths, '╰', '┴', '╯')))
}

fn write_barebones<W: Write>(out: &mut W, title: &str, rows: &[Vec<String>], layout: &Layout) -> io::Result<()> {
    let widths = &layout.widths;

    writeln!(out, "### {} ###", title)?;

    let header: String = widths
        .iter()
        .enumerate()
        .map(|(col, width)| center(cell_line(&rows[0], col, 0), width + 2))
        .collect();
    writeln!(out, "{}", header)?;

    for (row_idx, row) in rows.iter().enumerate().skip(1) {
        for line_idx in 0..layout.heights[row_idx] {
            let line: String = widths
                .iter()
                .enumerate()
                .map(|(col, width)| format!("{} ", pad_left(cell_line(row, col, line_idx), width + 1)))
                .collect();
            writeln!(out, "{}", line)?;
        }
    }

    writeln!(out)
}

#[cfg(test)]
pub mod tests {
    use std::sync::LazyLock;

    use regex::Regex;

    use super::*;

    static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

    pub fn strip_ansi(text: &str) -> String {
        ANSI.replace_all(text, "").into_owned()
    }

    pub fn rendered(table: &Table, style: Style) -> String {
        let mut out = Vec::new();
        table.render(&mut out, style).unwrap();
        strip_ansi(&String::from_utf8(out).unwrap())
    }

    fn demo() -> Table {
        let mut table = Table::new("Demo", &["NAME", "STATE"]);
        table.push_row(["eth0", "UP"]);
        table.push_row(["eth1\nalias", "DOWN"]);
        table
    }

    #[test]
    fn test_barebones_multiline_row() {
        let expected = [
            "### Demo ###",
            " NAME   STATE ",
            "  eth0     UP ",
            "  eth1   DOWN ",
            " alias        ",
            "",
        ];
        let output = rendered(&demo(), Style::Barebones);
        assert_eq!(output.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_boxed_grid() {
        let expected = [
            "╭───────────────╮",
            "│     Demo      │",
            "├───────┬───────┤",
            "│ NAME  │ STATE │",
            "├───────┼───────┤",
            "│  eth0 │    UP │",
            "├───────┼───────┤",
            "│  eth1 │  DOWN │",
            "│ alias │       │",
            "╰───────┴───────╯",
        ];
        let output = rendered(&demo(), Style::Boxed);
        assert_eq!(output.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let table = demo();
        for style in [Style::Boxed, Style::Barebones] {
            let mut first = Vec::new();
            let mut second = Vec::new();
            table.render(&mut first, style).unwrap();
            table.render(&mut second, style).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_grid_writes_nothing() {
        let mut out = Vec::new();
        render(&mut out, "Empty", &[], Style::Boxed).unwrap();
        render(&mut out, "Empty", &[vec![]], Style::Barebones).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_header_only_table() {
        let table = Table::new("Route Table", &["DESTINATION"]);
        assert!(!table.has_data());
        assert_eq!(rendered(&table, Style::Barebones), "### Route Table ###\n DESTINATION \n\n");
    }
}

//! Plain-text table rendering for previews and profile summaries.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Renders `rows` under `headers`. Columns without an entry in `align`
/// are left-aligned; cells past the header width are dropped.
pub fn render_table(headers: &[String], align: &[Align], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, align));
    }
    output
}

pub fn print_table(headers: &[String], align: &[Align], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, align, rows));
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let cell = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&cell)));
            match align.get(idx).copied().unwrap_or_default() {
                Align::Left => format!("{cell}{padding}"),
                Align::Right => format!("{padding}{cell}"),
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

/// Control characters would break the grid; render them as spaces.
fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn columns_pad_to_widest_cell() {
        let rendered = render_table(
            &strings(&["id", "city"]),
            &[Align::Right, Align::Left],
            &[strings(&["7", "Oslo"]), strings(&["1234", "Lima"])],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "id    city");
        assert_eq!(lines[1], "----  ----");
        assert_eq!(lines[2], "   7  Oslo");
        assert_eq!(lines[3], "1234  Lima");
    }

    #[test]
    fn newlines_inside_cells_are_flattened() {
        let rendered = render_table(&strings(&["note"]), &[], &[strings(&["a\nb"])]);
        assert_eq!(rendered.lines().nth(2), Some("a b"));
    }
}

use tabline_core::extraction::TableMatrix;
use tabline_core::layout::PageLines;

/// Column-aligned listing of each page's lines with their boxes.
pub fn format_lines(pages: &[PageLines]) -> String {
    let mut out = String::new();
    let multi_page = pages.len() > 1;

    for (i, page) in pages.iter().enumerate() {
        if multi_page {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("--- Page {} ---\n\n", page.page_number));
        }

        if page.lines.is_empty() {
            out.push_str("  (no lines)\n");
            continue;
        }

        out.push_str(&format!(
            "  {:>9} {:>9} {:>9} {:>9}  Text\n",
            "Left", "Top", "Width", "Height"
        ));
        for line in &page.lines {
            let b = &line.bbox;
            out.push_str(&format!(
                "  {:>9.2} {:>9.2} {:>9.2} {:>9.2}  {}\n",
                b.left, b.top, b.width, b.height, line.text
            ));
        }
    }

    out
}

/// Rows padded into aligned columns separated by ` | `.
pub fn format_matrix(matrix: &TableMatrix) -> String {
    if matrix.rows.is_empty() {
        return "(no rows)\n".to_string();
    }

    let columns = matrix.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &matrix.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_cell(cell).chars().count());
        }
    }

    let mut out = String::new();
    for row in &matrix.rows {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let cell = row.get(i).map(|c| display_cell(c)).unwrap_or_default();
                let pad = widths[i].saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

/// Multi-line cells are shown on one line.
fn display_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabline_core::geometry::GeometryBox;
    use tabline_core::layout::TextLine;

    #[test]
    fn test_format_matrix_aligns_ragged_rows() {
        let matrix = TableMatrix {
            rows: vec![
                vec!["Item".into(), "Qty".into()],
                vec!["Hex\nbolt".into(), "12".into(), "extra".into()],
                vec!["Nut".into()],
            ],
        };
        assert_eq!(
            format_matrix(&matrix),
            "Item     | Qty |\nHex bolt | 12  | extra\nNut      |     |\n"
        );
    }

    #[test]
    fn test_format_lines_single_page() {
        let pages = vec![PageLines {
            page_number: 1,
            lines: vec![TextLine {
                bbox: GeometryBox::new(10.0, 5.0, 100.0, 12.0).unwrap(),
                text: "Hello World".into(),
            }],
        }];
        let text = format_lines(&pages);
        assert!(!text.contains("--- Page"));
        assert!(text.contains("    10.00      5.00    100.00     12.00  Hello World"));
    }
}

use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns two spaces apart, a dashed rule under the header,
/// no trailing whitespace. Widths count characters so phase names with
/// accents still line up.
pub fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = table_line(headers.into_iter(), &widths);
    let rule = widths.map(|w| "-".repeat(w));
    out.push_str(&table_line(rule.iter().map(String::as_str), &widths));
    for row in rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:width$}"))
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

/// Operator-facing warnings share stdout with the rest of the report.
pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        println!("WARNING: {w}");
    }
}

/// Blocking issues, one bullet each.
pub fn print_issues(issues: &[String]) {
    for issue in issues {
        println!("  - {issue}");
    }
}

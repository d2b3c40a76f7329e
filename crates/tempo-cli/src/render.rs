//! Plain-text tables and panels for terminal output.

/// Render a titled table with left-aligned columns.
///
/// ```
/// let out = tempo_cli::render::table("Env", &["Key", "Value"], &[vec!["A".into(), "1".into()]]);
/// assert!(out.contains("│ A   │ 1     │"));
/// ```
pub fn table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(mid))
    };
    let line = |cells: &[&str]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).copied().unwrap_or("");
                format!(" {cell}{} ", " ".repeat(w - cell.chars().count()))
            })
            .collect();
        format!("│{}│", padded.join("│"))
    };

    let mut out = Vec::with_capacity(rows.len() + 5);
    if !title.is_empty() {
        out.push(title.to_string());
    }
    out.push(rule("┌", "┬", "┐"));
    out.push(line(headers));
    out.push(rule("├", "┼", "┤"));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(line(&cells));
    }
    out.push(rule("└", "┴", "┘"));
    out.join("\n")
}

/// Render `body` inside a box, with `title` in the top border.
pub fn panel(title: &str, body: &str) -> String {
    let lines: Vec<&str> = if body.is_empty() { vec![""] } else { body.lines().collect() };
    let title_width = if title.is_empty() { 0 } else { title.chars().count() + 2 };
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(title_width);

    let top = if title.is_empty() {
        format!("╭{}╮", "─".repeat(width + 2))
    } else {
        format!("╭─ {title} {}╮", "─".repeat(width + 2 - title_width - 1))
    };
    let mut out = vec![top];
    for l in lines {
        out.push(format!("│ {l}{} │", " ".repeat(width - l.chars().count())));
    }
    out.push(format!("╰{}╯", "─".repeat(width + 2)));
    out.join("\n")
}

/// `SET` when a secret is present, `-` otherwise.
pub fn secret_status(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => "SET".to_string(),
        _ => "-".to_string(),
    }
}

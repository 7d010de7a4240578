use anyhow::Result;
use client_core::UserTable;
use shared::domain::UserField;

pub fn print_table(table: &UserTable, json: bool) -> Result<()> {
    if json {
        let records: Vec<_> = table.rows().map(|row| row.record()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", format_table(table));
    }
    Ok(())
}

pub fn format_table(table: &UserTable) -> String {
    let mut header = vec!["ID".to_string()];
    header.extend(UserField::ALL.iter().map(|field| field.label().to_string()));

    let lines: Vec<Vec<String>> = table
        .rows()
        .map(|row| {
            let mut line = vec![row.id().to_string()];
            line.extend(UserField::ALL.iter().map(|field| row.cell(*field).to_string()));
            line
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(&header).chain(&lines) {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    if lines.is_empty() {
        out.push_str("(no users)\n");
    }
    out
}

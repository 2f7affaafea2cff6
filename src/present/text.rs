//! Plain-text rendering of section views.

use std::iter;

use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
};

use super::{SectionView, TableView};

/// Render a table with the label column left-aligned and every other
/// column right-aligned.
pub fn table(view: &TableView) -> String {
    let mut builder = Builder::default();
    builder.push_record(iter::once(String::new()).chain(view.headers.iter().cloned()));
    for row in &view.rows {
        builder.push_record(iter::once(row.index.to_string()).chain(row.cells.iter().cloned()));
    }

    let mut table = builder.build();
    table
        .with(Style::blank())
        .modify(Columns::first(), Alignment::right())
        .modify(Columns::new(2..), Alignment::right());
    table.to_string()
}

pub fn section(view: &SectionView) -> String {
    let mut lines = vec![format!("## {}", view.title)];

    if let Some(error) = &view.error {
        lines.push(format!("error: {}", error));
        return lines.join("\n") + "\n";
    }

    if let Some(table_view) = &view.table {
        if table_view.rows.is_empty() {
            lines.push("(no transfers in the selected range)".to_string());
        } else {
            lines.push(table(table_view));
            if view.total_rows > table_view.rows.len() {
                lines.push(format!(
                    "... {} of {} rows shown",
                    table_view.rows.len(),
                    view.total_rows
                ));
            }
        }
    }

    lines.push(String::new());
    lines.extend(view.headlines.iter().map(|headline| {
        format!(
            "{}: {}",
            headline.caption,
            headline.value.as_deref().unwrap_or("-")
        )
    }));

    if let Some(trend) = &view.trend {
        lines.push(String::new());
        lines.push(table(trend));
    }
    lines.join("\n") + "\n"
}

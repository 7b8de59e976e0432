//! Terminal rendering of the task list and query results.

use ansi_term::{Colour, Style};
use parqtodo_core::view::EMPTY_PLACEHOLDER;
use parqtodo_core::{QueryResult, SqlValue, TaskListView, Theme};

/// Styles for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    heading: Style,
    open: Style,
    done: Style,
    muted: Style,
    empty: Style,
    error: Style,
    pub prompt: Style,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                heading: Colour::Blue.bold(),
                open: Colour::Black.normal(),
                done: Colour::Green.dimmed(),
                muted: Colour::Purple.italic(),
                empty: Colour::Purple.italic().dimmed(),
                error: Colour::Red.bold(),
                prompt: Colour::Blue.normal(),
            },
            Theme::Dark => Self {
                heading: Colour::Cyan.bold(),
                open: Colour::White.normal(),
                done: Colour::Green.normal().dimmed(),
                muted: Colour::Yellow.italic().dimmed(),
                empty: Colour::Yellow.italic(),
                error: Colour::Red.bold().italic(),
                prompt: Colour::Cyan.normal(),
            },
        }
    }

    /// No escape codes; used when stdout is not a terminal and in tests.
    pub fn plain() -> Self {
        let plain = Style::new();
        Self {
            heading: plain,
            open: plain,
            done: plain,
            muted: plain,
            empty: plain,
            error: plain,
            prompt: plain,
        }
    }
}

pub fn paint_view(view: &TaskListView, palette: &Palette) -> String {
    view.render_lines()
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let style = if index == 0 {
                palette.heading
            } else if line.starts_with("[x]") {
                palette.done
            } else if line.starts_with("[ ]") {
                palette.open
            } else if line.starts_with("error:") || line.starts_with("unavailable:") {
                palette.error
            } else if line == EMPTY_PLACEHOLDER {
                palette.empty
            } else {
                palette.muted
            };
            style.paint(line).to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn paint_error(message: &str, palette: &Palette) -> String {
    palette.error.paint(format!("error: {message}")).to_string()
}

/// Pipe-separated table with a header row.
pub fn format_rows(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.len() + 2);
    lines.push(result.columns.join(" | "));
    lines.extend(
        result
            .rows
            .iter()
            .map(|row| row.iter().map(format_value).collect::<Vec<_>>().join(" | ")),
    );
    lines.push(format!("({} rows)", result.len()));
    lines.join("\n")
}

fn format_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(value) => value.to_string(),
        SqlValue::Real(value) => value.to_string(),
        SqlValue::Text(value) => value.clone(),
        SqlValue::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_rows, paint_error, paint_view, Palette};
    use parqtodo_core::{QueryResult, SqlValue, TaskListView};

    #[test]
    fn plain_palette_keeps_view_lines() {
        let view = TaskListView::new();
        let painted = paint_view(&view, &Palette::plain());
        assert_eq!(painted, view.render_lines().join("\n"));
    }

    #[test]
    fn plain_palette_writes_no_escape_codes() {
        let mut view = TaskListView::new();
        view.mark_unavailable("engine failed");
        let painted = paint_view(&view, &Palette::plain());
        assert!(painted.contains("Empty task"));
        assert!(!painted.contains('\u{1b}'));
        assert!(!paint_error("boom", &Palette::plain()).contains('\u{1b}'));
    }

    #[test]
    fn rows_render_with_header_and_count() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "title".to_string()],
            rows: vec![
                vec![SqlValue::Integer(1), SqlValue::Text("a".to_string())],
                vec![SqlValue::Integer(2), SqlValue::Null],
            ],
        };
        assert_eq!(format_rows(&result), "id | title\n1 | a\n2 | NULL\n(2 rows)");
    }
}

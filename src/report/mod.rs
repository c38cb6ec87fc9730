//! Human-readable and JSON renderings of a [`SchemaDiff`].
//!
//! Rendering is a pure function of the diff and [`RenderOptions`]; colors
//! only wrap the event labels, so plain and colored output carry the same
//! text.

use crate::diff::{ColumnDiff, PropertyChange, SchemaDiff, TableDiff};
use crate::model::Value;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;

pub const NULL_TOKEN: &str = "NULL";
pub const EMPTY_STRING_TOKEN: &str = "<empty string>";
pub const IDENTICAL_MESSAGE: &str = "Schemas are identical.";
pub const DIFFERENT_MESSAGE: &str = "Target database differs from base database:";

const PROPERTY_WIDTH: usize = 30;

/// Styles for the three kinds of event.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub added: Style,
    pub removed: Style,
    pub changed: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            added: Style::new().green().bold(),
            removed: Style::new().red().bold(),
            changed: Style::new().yellow().bold(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// `None` renders without any escape sequences.
    pub palette: Option<Palette>,
}

impl RenderOptions {
    pub fn colored() -> Self {
        Self {
            palette: Some(Palette::default()),
        }
    }

    pub fn plain() -> Self {
        Self { palette: None }
    }
}

#[derive(Clone, Copy)]
enum Event {
    Added,
    Removed,
    Changed,
}

impl RenderOptions {
    fn label(&self, event: Event, text: &str) -> String {
        let Some(palette) = self.palette else {
            return text.to_string();
        };
        let style = match event {
            Event::Added => palette.added,
            Event::Removed => palette.removed,
            Event::Changed => palette.changed,
        };
        text.style(style).to_string()
    }
}

/// One line per table event, column event and property change. Each table
/// block is preceded by an empty line.
pub fn render_lines(diff: &SchemaDiff, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::new();

    for (table_name, table_diff) in &diff.tables {
        let label = match table_diff {
            TableDiff::Added => options.label(Event::Added, "+ [extra table] "),
            TableDiff::Removed => options.label(Event::Removed, "- [missing table] "),
            TableDiff::Changed { .. } => options.label(Event::Changed, "* [changed table] "),
        };
        lines.push(String::new());
        lines.push(format!("{label}{table_name}"));

        let Some(columns) = table_diff.changed_columns() else {
            continue;
        };
        for (column_name, column_diff) in columns {
            let label = match column_diff {
                ColumnDiff::Added => options.label(Event::Added, "+ [extra column] "),
                ColumnDiff::Removed => options.label(Event::Removed, "- [missing column] "),
                ColumnDiff::Changed { .. } => {
                    options.label(Event::Changed, "* [changed column] ")
                }
            };
            lines.push(format!("\t{label}{column_name}"));

            if let Some(changes) = column_diff.changes() {
                for (prop, change) in changes {
                    lines.push(property_line(&prop.to_string(), change));
                }
            }
        }
    }

    lines
}

fn property_line(prop: &str, change: &PropertyChange) -> String {
    format!(
        "\t\t{:-<width$} base `{}` -> target `{}`",
        format!("{prop} "),
        readable(&change.base),
        readable(&change.target),
        width = PROPERTY_WIDTH
    )
}

fn readable(value: &Value) -> String {
    match value {
        Value::Null => NULL_TOKEN.to_string(),
        Value::Text(s) if s.is_empty() => EMPTY_STRING_TOKEN.to_string(),
        other => other.to_string(),
    }
}

/// Full text report: a summary line, then the rendered diff.
pub fn render_text(diff: &SchemaDiff, options: &RenderOptions) -> String {
    if diff.is_empty() {
        return format!("{IDENTICAL_MESSAGE}\n");
    }

    let mut out = String::from(DIFFERENT_MESSAGE);
    out.push('\n');
    for line in render_lines(diff, options) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub identical: bool,
    pub base_fingerprint: String,
    pub target_fingerprint: String,
    #[serde(flatten)]
    pub diff: &'a SchemaDiff,
}

pub fn render_json(report: &JsonReport<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnProp;
    use indexmap::IndexMap;

    fn sample_diff() -> SchemaDiff {
        let mut changes = IndexMap::new();
        changes.insert(
            ColumnProp::CharacterMaximumLength,
            PropertyChange {
                base: Value::Int(50),
                target: Value::Int(100),
            },
        );
        changes.insert(
            ColumnProp::ColumnDefault,
            PropertyChange {
                base: Value::Null,
                target: Value::from(""),
            },
        );

        let mut columns = IndexMap::new();
        columns.insert("name".to_string(), ColumnDiff::Changed { changes });
        columns.insert("email".to_string(), ColumnDiff::Added);
        columns.insert("legacy".to_string(), ColumnDiff::Removed);

        let mut tables = IndexMap::new();
        tables.insert("audit".to_string(), TableDiff::Removed);
        tables.insert("t".to_string(), TableDiff::Changed { columns });
        tables.insert("tags".to_string(), TableDiff::Added);
        SchemaDiff { tables }
    }

    #[test]
    fn plain_rendering() {
        let lines = render_lines(&sample_diff(), &RenderOptions::plain());
        assert_eq!(
            lines,
            vec![
                "".to_string(),
                "- [missing table] audit".to_string(),
                "".to_string(),
                "* [changed table] t".to_string(),
                "\t* [changed column] name".to_string(),
                "\t\tCHARACTER_MAXIMUM_LENGTH ----- base `50` -> target `100`".to_string(),
                "\t\tCOLUMN_DEFAULT --------------- base `NULL` -> target `<empty string>`"
                    .to_string(),
                "\t+ [extra column] email".to_string(),
                "\t- [missing column] legacy".to_string(),
                "".to_string(),
                "+ [extra table] tags".to_string(),
            ]
        );
    }

    #[test]
    fn plain_rendering_has_no_escape_sequences() {
        let text = render_text(&sample_diff(), &RenderOptions::plain());
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn colored_rendering_has_same_content() {
        let colored = render_lines(&sample_diff(), &RenderOptions::colored());
        let plain = render_lines(&sample_diff(), &RenderOptions::plain());
        assert_eq!(colored.len(), plain.len());
        assert!(colored.iter().any(|line| line.contains('\u{1b}')));

        let strip = regex::Regex::new("\u{1b}\\[[0-9;]*m").unwrap();
        for (c, p) in colored.iter().zip(&plain) {
            assert_eq!(strip.replace_all(c, ""), p.as_str());
        }
    }

    #[test]
    fn null_and_empty_string_render_distinctly() {
        assert_eq!(readable(&Value::Null), "NULL");
        assert_eq!(readable(&Value::from("")), "<empty string>");
        assert_eq!(readable(&Value::from("x")), "x");
    }

    #[test]
    fn empty_diff_reports_identical() {
        let text = render_text(&SchemaDiff::default(), &RenderOptions::plain());
        assert_eq!(text, "Schemas are identical.\n");
    }

    #[test]
    fn text_report_starts_with_summary() {
        let text = render_text(&sample_diff(), &RenderOptions::plain());
        assert!(text.starts_with("Target database differs from base database:\n\n- [missing table] audit\n"));
    }

    #[test]
    fn json_report_shape() {
        let diff = sample_diff();
        let json = render_json(&JsonReport {
            identical: false,
            base_fingerprint: "aa".to_string(),
            target_fingerprint: "bb".to_string(),
            diff: &diff,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["identical"], false);
        assert_eq!(value["tables"]["audit"]["status"], "removed");
        let name = &value["tables"]["t"]["columns"]["name"];
        assert_eq!(name["status"], "changed");
        assert_eq!(name["changes"]["CHARACTER_MAXIMUM_LENGTH"]["base"], 50);
        assert_eq!(name["changes"]["COLUMN_DEFAULT"]["base"], serde_json::Value::Null);
    }
}

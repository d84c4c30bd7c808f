//! Result widgets: the data table and the error panel

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use serde_json::Value;

use super::{accent, danger, header, text, text_dim};
use crate::api::payload::{ErrorPayload, KNOWN_ERROR_FIELDS};
use crate::endpoint::state::EndpointView;
use crate::endpoint::transform::MULTI_VALUE_SEPARATOR;

/// One cell; identity values are drawn one per line
fn cell_text(value: &str, multi_line: bool) -> Text<'static> {
    if multi_line {
        Text::from(
            value
                .split(MULTI_VALUE_SEPARATOR)
                .map(|part| Line::from(part.to_string()))
                .collect::<Vec<_>>(),
        )
    } else {
        Text::from(value.to_string())
    }
}

pub fn draw_data_table(f: &mut Frame, view: &EndpointView, scroll: usize, area: Rect) {
    let categories = &view.descriptor.categories;
    let multi_line = view.descriptor.is_identity();
    let total = view.transformed_data.len();
    let scroll = scroll.min(total.saturating_sub(1));

    let block = Block::default()
        .title(Span::styled(
            format!(" {} rows ", total),
            Style::default().fg(accent()),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    if categories.is_empty() || total == 0 {
        let empty = Paragraph::new(Span::styled(
            "No data returned",
            Style::default().fg(text_dim()),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_style = Style::default().fg(header()).add_modifier(Modifier::BOLD);
    let header_row = Row::new(
        categories
            .iter()
            .map(|c| Cell::from(Span::styled(c.title.clone(), header_style))),
    );

    let rows: Vec<Row> = view
        .transformed_data
        .iter()
        .skip(scroll)
        .map(|item| {
            let cells: Vec<Text> = categories
                .iter()
                .map(|c| {
                    let value = item.get(&c.field).map(String::as_str).unwrap_or("");
                    cell_text(value, multi_line)
                })
                .collect();
            let height = cells.iter().map(|t| t.height()).max().unwrap_or(1).max(1) as u16;
            let cells = cells
                .into_iter()
                .map(|t| Cell::from(t).style(Style::default().fg(text())));
            Row::new(cells).height(height)
        })
        .collect();

    let widths = vec![Constraint::Ratio(1, categories.len() as u32); categories.len()];
    let table = Table::new(rows, widths)
        .header(header_row)
        .block(block)
        .column_spacing(2);

    f.render_widget(table, area);
}

fn field_line(label: String, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(text_dim())),
        Span::styled(value, Style::default().fg(text())),
    ])
}

/// Well-known fields first, then every other key of the error object
fn error_lines(error: &ErrorPayload) -> Vec<Line<'static>> {
    let fields = [
        ("Error code", error.error_code()),
        ("Type", error.error_type()),
        ("Message", error.error_message()),
        ("Display message", error.display_message()),
        ("Status code", error.status_code()),
    ];

    let mut lines: Vec<Line> = fields
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| field_line(label.to_string(), v)))
        .collect();

    // Unknown shapes are shown as sent
    if lines.is_empty() {
        let raw = match error.plain_text() {
            Some(s) => s.to_string(),
            None => serde_json::to_string_pretty(error.raw())
                .unwrap_or_else(|_| error.raw().to_string()),
        };
        return raw
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(text()))))
            .collect();
    }

    if let Some(object) = error.raw().as_object() {
        for (key, value) in object {
            if KNOWN_ERROR_FIELDS.contains(&key.as_str()) || value.is_null() {
                continue;
            }
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(field_line(key.clone(), value));
        }
    }

    lines
}

pub fn draw_error_panel(f: &mut Frame, error: &ErrorPayload, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Error ",
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(danger()));

    let panel = Paragraph::new(error_lines(error))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::endpoint::state::{Action, EndpointView};
use crate::theme::Theme;

// Theme is fixed for the lifetime of the process
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme built from config. Later calls are ignored.
pub fn set_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(6),    // Endpoints + view
            Constraint::Length(1), // Footer
        ])
        .split(area);

    // Narrow terminals get a thinner endpoint list
    let list_width = if area.width < 90 { 22 } else { 28 };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(list_width),
            Constraint::Min(30),
        ])
        .split(chunks[1]);

    draw_info_line(f, app, chunks[0]);
    draw_endpoint_list(f, app, body[0]);
    match app.selected_view() {
        Some(view) => draw_endpoint_view(f, app, view, body[1]),
        None => draw_empty(f, body[1]),
    }
    draw_footer(f, app, chunks[2]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(warning())))
    } else {
        Line::from(vec![
            Span::styled("Backend ", Style::default().fg(text_dim())),
            Span::styled(app.base_url(), Style::default().fg(text())),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_endpoint_list(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Endpoints ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let rows: Vec<Row> = app
        .views
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let (marker, marker_color) = if view.is_busy() {
                ("…", warning())
            } else if view.error.is_some() {
                ("!", danger())
            } else if view.show_table {
                ("●", success())
            } else {
                (" ", text_dim())
            };

            let style = if i == app.selected {
                Style::default().bg(bg_selected()).fg(text())
            } else {
                Style::default()
            };

            Row::new(vec![
                Span::styled(marker, Style::default().fg(marker_color)),
                Span::styled(
                    view.descriptor.display_name().to_string(),
                    Style::default().fg(text()),
                ),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(2), Constraint::Min(8)]).block(block);
    f.render_widget(table, area);
}

fn draw_empty(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(Line::from(Span::styled(
        "No endpoints configured",
        Style::default().fg(text_dim()),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(inactive())));
    f.render_widget(msg, area);
}

fn draw_endpoint_view(f: &mut Frame, app: &App, view: &EndpointView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Endpoint card
            Constraint::Min(3),    // Results
        ])
        .split(area);

    draw_endpoint_card(f, view, chunks[0]);

    let results = chunks[1];
    match (view.show_table, view.error.as_ref()) {
        (true, Some(error)) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(results);
            components::draw_data_table(f, view, app.table_scroll, split[0]);
            components::draw_error_panel(f, error, split[1]);
        }
        (true, None) => components::draw_data_table(f, view, app.table_scroll, results),
        (false, Some(error)) => components::draw_error_panel(f, error, results),
        (false, None) => {
            let hint = Paragraph::new(Line::from(vec![
                Span::styled("Press ", Style::default().fg(text_dim())),
                Span::styled("Enter", Style::default().fg(accent())),
                Span::styled(" to send a request", Style::default().fg(text_dim())),
            ]))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(inactive())),
            );
            f.render_widget(hint, results);
        }
    }
}

/// Badge, name, schema, description and the action buttons
fn draw_endpoint_card(f: &mut Frame, view: &EndpointView, area: Rect) {
    let descriptor = &view.descriptor;

    let mut title = vec![
        Span::styled(
            " POST ",
            Style::default()
                .fg(Color::Black)
                .bg(accent())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    if let Some(name) = &descriptor.name {
        title.push(Span::styled(
            name.as_str(),
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        ));
        title.push(Span::raw(" "));
    }
    title.push(Span::styled(descriptor.schema.as_str(), Style::default().fg(text_dim())));

    let buttons: Vec<Span> = view
        .actions()
        .into_iter()
        .flat_map(|action| {
            let color = match action {
                Action::DownloadPdf => success(),
                _ if view.action_label(action) == "Loading..." => warning(),
                _ => accent(),
            };
            vec![
                Span::styled(format!("[{}] ", action.key_hint()), Style::default().fg(text_dim())),
                Span::styled(
                    view.action_label(action),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw("   "),
            ]
        })
        .collect();

    let card = Paragraph::new(vec![
        Line::from(title),
        Line::from(Span::styled(descriptor.description.as_str(), Style::default().fg(text_dim()))),
        Line::from(""),
        Line::from(buttons),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(
                format!(" /api/{} ", descriptor.endpoint),
                Style::default().fg(accent()),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );

    f.render_widget(card, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut hints: Vec<(&str, &str)> = vec![("↑↓", "Nav"), ("Enter", "Send")];
    if let Some(view) = app.selected_view() {
        if view.offers(Action::GetTransactions) {
            hints.push(("t", "Sync"));
        }
        if view.offers(Action::DownloadPdf) {
            hints.push(("p", "Save"));
        }
    }
    hints.extend([("x", "Reset"), ("h", "Help"), ("q", "Quit")]);

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 90 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };
    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        section("═══ Navigation ═══"),
        key_line("↑/↓ j/k", "Select endpoint"),
        key_line("PgUp/PgDn", "Scroll results"),
        Line::from(""),
        section("═══ Requests ═══"),
        key_line("Enter/s", "Send request to the selected endpoint"),
        key_line("t", "Sync transactions and save transactions.pdf"),
        key_line("p", "Save the current PDF as Asset Report.pdf"),
        key_line("x", "Reset the selected endpoint view"),
        Line::from(""),
        section("═══ Command Line ═══"),
        key_line("--list", "Print the endpoint catalog"),
        key_line("--fetch", "Print one endpoint's rows as JSON"),
        key_line("--sync", "Sync transactions without the TUI"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" quickstart-tui Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::app::ApiEvent;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn select(app: &mut App, endpoint: &str) {
        app.selected = app.views.iter().position(|v| v.descriptor.endpoint == endpoint).unwrap();
    }

    #[test]
    fn test_get_transactions_button_only_on_transactions() {
        let (mut app, _) = test_app("http://localhost:8000");
        for i in 0..app.views.len() {
            app.selected = i;
            let screen = render(&app);
            let is_transactions = app.views[i].descriptor.endpoint == "transactions";
            assert_eq!(screen.contains("Get Transactions"), is_transactions, "view {}", i);
        }
    }

    #[test]
    fn test_pdf_button_appears_after_sync() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "transactions");
        assert!(!render(&app).contains("Download PDF"));

        let (view, mount_id) = (app.selected, app.selected_view().unwrap().mount_id);
        let body = json!({ "pdf": "JVBERi0xLjQ=" });
        app.apply_event(ApiEvent::Synced { view, mount_id, result: Ok(body) });
        assert!(render(&app).contains("Download PDF"));
    }

    #[test]
    fn test_loading_label_while_pending() {
        let (mut app, _) = test_app("http://localhost:8000");
        app.views[0].begin_request();
        let screen = render(&app);
        assert!(screen.contains("Loading..."));
        assert!(!screen.contains("Send request"));
    }

    #[test]
    fn test_table_and_error_rendering() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "transactions");
        let (view, mount_id) = (app.selected, app.selected_view().unwrap().mount_id);

        let body = json!({ "latest_transactions": [
            { "name": "Uber 063015 SF**POOL**", "amount": 5.4, "date": "2024-02-01" }
        ] });
        app.apply_event(ApiEvent::Fetched { view, mount_id, result: Ok(body) });
        let screen = render(&app);
        assert!(screen.contains("Uber 063015"));
        assert!(screen.contains("5.40"));

        let body = json!({ "error": {
            "error_code": "PRODUCT_NOT_READY",
            "error_message": "not ready yet"
        } });
        app.apply_event(ApiEvent::Fetched { view, mount_id, result: Ok(body) });
        let screen = render(&app);
        assert!(screen.contains("PRODUCT_NOT_READY"));
        assert!(!screen.contains("Uber 063015"));
    }
}

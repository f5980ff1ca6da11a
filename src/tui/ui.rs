use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, ViewMode};
use crate::commands::time_left;
use crate::zone::{classify, TaskZone};

fn zone_style(zone: TaskZone) -> Style {
    match zone {
        TaskZone::Urgent => Style::default().fg(Color::Red),
        TaskZone::Future => Style::default().fg(Color::Yellow),
        TaskZone::NoDate => Style::default(),
        TaskZone::Done => Style::default().fg(Color::DarkGray),
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let today = app.clock.today();

            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let zone = classify(t, today);
                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(if t.is_effectively_pinned() { "*" } else { "" }),
                        Cell::from(t.title.clone()),
                        Cell::from(t.priority.map(|p| p.to_string()).unwrap_or_default()),
                        Cell::from(t.status.to_string()),
                        Cell::from(t.due_date.map(|d| d.to_string()).unwrap_or_default()),
                        Cell::from(time_left(t.due_date, today)),
                        Cell::from(zone.label()),
                        Cell::from(t.owners.join(", ")),
                    ])
                    .style(zone_style(zone))
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(20),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(14),
            ];

            let table = Table::new(rows, widths)
                .header(
                    Row::new(vec!["ID", "", "Title", "Priority", "Status", "Due", "Time Left", "Zone", "Owners"])
                        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                        .bottom_margin(1),
                )
                .block(Block::default().borders(Borders::ALL).title("Cadence - Tasks"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Templates => {
            let rows: Vec<Row> = app
                .templates
                .iter()
                .map(|t| {
                    let style = if t.active {
                        Style::default()
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(t.rule.schedule_type.to_string()),
                        Cell::from(t.rule.effective_interval().to_string()),
                        Cell::from(t.due_strategy.to_string()),
                        Cell::from(if t.active { "yes" } else { "no" }),
                    ])
                    .style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(14),
                Constraint::Length(6),
            ];

            let table = Table::new(rows, widths)
                .header(
                    Row::new(vec!["ID", "Title", "Schedule", "Every", "Due", "Active"])
                        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                        .bottom_margin(1),
                )
                .block(Block::default().borders(Borders::ALL).title("Cadence - Templates"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.template_state);
        }
    }

    let keys = match app.view_mode {
        ViewMode::Tasks => "q: Quit | j/k: Move | Space: Done | p: Pin | c: Toggle Done | m: Materialize | v: Templates",
        ViewMode::Templates => "q: Quit | j/k: Move | m: Materialize | v: Tasks",
    };
    let help_text = match &app.message {
        Some(msg) => format!("{}  ·  {}", msg, keys),
        None => keys.to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);
}

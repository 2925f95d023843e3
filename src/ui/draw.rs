//! Dashboard layout and rendering

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Cell, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;

use crate::activity::Level;
use crate::limits::fmt_bound;

use super::App;

pub(super) fn draw(frame: &mut Frame, app: &mut App) {
    let [control, status, limits, processes, logs] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(10),
        Constraint::Min(4),
    ])
    .areas(frame.area());

    draw_control(frame, control);
    draw_status(frame, status, app);
    draw_limits(frame, limits, app);
    draw_processes(frame, processes, app);
    draw_logs(frame, logs, app);
}

fn draw_control(frame: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("[R] Run Sandbox", Style::default().fg(Color::Magenta)),
        Span::raw("   "),
        Span::styled("[M] Mode", Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("[E] Edit Limits", Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("[Q] Quit", Style::default().fg(Color::Red)),
        Span::raw("   "),
        Span::styled("Up/Down Scroll", Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(
        Paragraph::new(hints).block(title_block(" Sandbox Control ")),
        area,
    );
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let active = !app.report.rows.is_empty();
    let state = if active { "ACTIVE" } else { "IDLE" };
    let state_style = if active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    let top_pid = app
        .report
        .rows
        .first()
        .map(|r| r.pid.to_string())
        .unwrap_or_else(|| "-".to_string());

    let uptime = app.started.elapsed().as_secs();
    let lines = vec![
        Line::from(vec![
            Span::styled("State: ", Style::default().fg(Color::Yellow)),
            Span::styled(state, state_style),
            Span::raw("    "),
            Span::styled(format!("Top PID: {}", top_pid), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("Uptime: {:02}:{:02}", uptime / 60, uptime % 60),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("    "),
            Span::styled(
                format!("Mode: {}", app.engine.policy().mode()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("    "),
            Span::styled(
                format!("Tracked: {}", app.engine.registry().len()),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(title_block(" Status ")), area);
}

fn draw_limits(frame: &mut Frame, area: Rect, app: &App) {
    let profile = app.engine.policy().profile();
    let label = Style::default().fg(Color::Yellow);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("CPU Time (s):   {}", fmt_bound(profile.cpu_time_secs)),
            label,
        )),
        Line::from(Span::styled(
            format!("RAM (MB):       {}", fmt_bound(profile.ram_mb)),
            label,
        )),
        Line::from(Span::styled(
            format!("Max Processes:  {}", fmt_bound(profile.max_processes)),
            label,
        )),
        Line::from(Span::styled(
            format!("Max Open Files: {}", fmt_bound(profile.max_open_files)),
            label,
        )),
    ];
    match app.edit_prompt() {
        Some(prompt) => lines.push(Line::from(Span::styled(
            prompt,
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))),
        None => lines.push(Line::from(Span::styled(
            "(Press M to change mode; E to edit limits)",
            Style::default().fg(Color::Magenta),
        ))),
    }
    frame.render_widget(
        Paragraph::new(lines).block(title_block(" Resource Limits ")),
        area,
    );
}

fn draw_processes(frame: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(vec!["PID", "CPU%", "MEM%", "CPUsec", "COMMAND", "STATE"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .report
        .rows
        .iter()
        .map(|r| {
            let cpu_style = threshold_style(r.cpu_percent, 20.0, 60.0);
            let mem_style = threshold_style(r.memory_percent, 5.0, 20.0);
            let state_style = if r.status.contains("zombie") {
                Style::default().fg(Color::Magenta)
            } else if r.status.contains("sleep") {
                Style::default().fg(Color::Blue)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Row::new(vec![
                Cell::from(r.pid.to_string()),
                Cell::from(format!("{:>5.1}", r.cpu_percent)).style(cpu_style),
                Cell::from(format!("{:>5.1}", r.memory_percent)).style(mem_style),
                Cell::from(format!("{:>7.2}", r.cpu_secs)),
                Cell::from(r.command.clone()),
                Cell::from(r.status.clone()).style(state_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Min(20),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(title_block(" Sandbox Processes "));

    frame.render_widget(table, area);
}

fn draw_logs(frame: &mut Frame, area: Rect, app: &mut App) {
    let visible = area.height.saturating_sub(2) as usize;
    app.log_visible = visible;
    let items: Vec<ListItem> = app
        .engine
        .log()
        .tail(visible, app.scroll)
        .iter()
        .map(|entry| {
            let style = match entry.level {
                Level::Info => Style::default().fg(Color::Green),
                Level::Warn => Style::default().fg(Color::Magenta),
                Level::Err => Style::default().fg(Color::Red),
            };
            ListItem::new(Line::from(Span::styled(entry.render(), style)))
        })
        .collect();

    frame.render_widget(List::new(items).block(title_block(" Activity Logs ")), area);
}

fn title_block(title: &str) -> Block<'static> {
    Block::bordered().title(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn threshold_style(value: f32, warn: f32, high: f32) -> Style {
    if value >= high {
        Style::default().fg(Color::Red)
    } else if value >= warn {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::Green)
    }
}

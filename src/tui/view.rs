//! Rendering for the board. Pure: widgets are rebuilt from the app state
//! every frame.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{App, Form, Mode, FIELD_CATEGORY, FIELD_DESCRIPTION, FIELD_DUE, FIELD_PRIORITY,
    FIELD_STATUS, FIELD_TITLE};
use crate::tasks::{LoadState, Priority, Status, Task};

const KEY_HINTS: &str =
    "n new · e edit · d delete · / search · s status · p priority · c clear · r reload · q quit";

pub(super) fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_filter_bar(frame, app, chunks[1]);
    draw_task_list(frame, app, chunks[2]);
    draw_status_line(frame, app, chunks[3]);

    match &app.mode {
        Mode::Form(form) => draw_form(frame, form),
        Mode::ConfirmDelete(id) => draw_confirm(frame, *id),
        _ => {}
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Line::from(vec![
        Span::styled("My Tasks", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" ({})", app.store.len())),
        Span::raw("  —  "),
        Span::styled(app.user.username.as_str(), Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn draw_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let search = if app.filter.search.is_empty() && !matches!(app.mode, Mode::Search) {
        Span::styled("(search)", Style::default().fg(Color::DarkGray))
    } else {
        let caret = if matches!(app.mode, Mode::Search) { "_" } else { "" };
        Span::raw(format!("{}{}", app.filter.search, caret))
    };
    let status = match app.filter.status {
        Some(status) => status.to_string(),
        None => "All".to_string(),
    };
    let priority = match app.filter.priority {
        Some(priority) => priority.to_string(),
        None => "All".to_string(),
    };
    let bar = Line::from(vec![
        Span::raw("/ "),
        search,
        Span::raw("   status: "),
        Span::styled(status, filter_style(app.filter.status.is_some())),
        Span::raw("   priority: "),
        Span::styled(priority, filter_style(app.filter.priority.is_some())),
    ]);
    frame.render_widget(Paragraph::new(bar), area);
}

fn filter_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_task_list(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible();

    if visible.is_empty() {
        let message = match app.store.state() {
            LoadState::Loading => "Loading...",
            LoadState::Errored => "Failed to load tasks.",
            _ if app.filter.is_active() => "No tasks match the current filters.",
            _ => "No tasks found. Press n to create your first task.",
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Tasks"));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = visible.iter().map(|task| task_line(task)).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Rgb(40, 40, 40)),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_line(task: &Task) -> ListItem<'_> {
    let status_style = match task.status {
        Status::ToDo => Style::default().fg(Color::White),
        Status::InProgress => Style::default().fg(Color::Yellow),
        Status::Done => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::CROSSED_OUT),
    };
    let priority_style = match task.priority {
        Priority::Low => Style::default().fg(Color::DarkGray),
        Priority::Medium => Style::default().fg(Color::Blue),
        Priority::High => Style::default().fg(Color::Red),
    };

    let mut spans = vec![
        Span::raw(format!("[#{}] ", task.id)),
        Span::styled(task.title.clone(), status_style),
        Span::styled(format!(" {}", task.priority), priority_style),
    ];
    if let Some(due) = task.due_date {
        spans.push(Span::raw(format!(" (Due: {})", due)));
    }
    if !task.category.is_empty() {
        spans.push(Span::styled(
            format!(" [{}]", task.category),
            Style::default().fg(Color::Magenta),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn draw_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(label) = app.pending {
        Line::from(Span::styled(
            format!("{}...", label),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Cyan),
        ))
    } else {
        Line::from(Span::styled(
            KEY_HINTS,
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_form(frame: &mut Frame, form: &Form) {
    let area = centered_rect(60, 14, frame.area());
    frame.render_widget(Clear, area);

    let title = if form.editing.is_some() {
        "Edit Task"
    } else {
        "New Task"
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let mut lines = vec![
        field_line("Title *", &form.title, form.field == FIELD_TITLE),
        field_line("Details", &form.description, form.field == FIELD_DESCRIPTION),
        field_line("Due", &form.due, form.field == FIELD_DUE),
        field_line("Category", &form.category, form.field == FIELD_CATEGORY),
        choice_line("Priority", &form.priority.to_string(), form.field == FIELD_PRIORITY),
        choice_line("Status", &form.status.to_string(), form.field == FIELD_STATUS),
        Line::raw(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter save · Esc cancel · Tab next field · ←/→ change choice",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line<'a>(label: &'a str, value: &'a str, active: bool) -> Line<'a> {
    let style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let caret = if active { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{:<10}", label), style),
        Span::raw(format!("{}{}", value, caret)),
    ])
}

fn choice_line<'a>(label: &'a str, value: &str, active: bool) -> Line<'a> {
    let style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{:<10}", label), style),
        Span::raw(format!("< {} >", value)),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_confirm(frame: &mut Frame, id: i64) {
    let area = centered_rect(40, 5, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Confirm");
    let lines = vec![
        Line::raw(format!("Delete task #{}?", id)),
        Line::raw(""),
        Line::from(Span::styled(
            "y delete · n cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

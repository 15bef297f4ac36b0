use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tokio::runtime::Runtime;

use crate::api::Backend;
use crate::dates;
use crate::form::{FieldKind, Form};
use crate::gantt;
use crate::models::{Focus, PopupMode, ProjectCreate, TaskStatus};
use crate::projects::ProjectList;
use crate::tasks::TaskView;

const MAX_CHART_ROWS: u16 = 10;

pub struct App<B: Backend> {
    api: B,
    pub api_url: String,
    pub list: ProjectList,
    pub task_view: Option<TaskView>,
    pub focus: Focus,
    pub project_state: TableState,
    pub task_state: TableState,
    pub popup_mode: PopupMode,
    pub form: Option<Form>,
    pub should_quit: bool,
}

impl<B: Backend> App<B> {
    pub fn new(api: B, api_url: impl Into<String>) -> Self {
        App {
            api,
            api_url: api_url.into(),
            list: ProjectList::new(),
            task_view: None,
            focus: Focus::Projects,
            project_state: TableState::default(),
            task_state: TableState::default(),
            popup_mode: PopupMode::None,
            form: None,
            should_quit: false,
        }
    }

    pub async fn refresh_data(&mut self) {
        self.list.list(&self.api).await;
        self.sync_task_view();
    }

    /// Re-derives the task view from the (possibly refreshed) selection.
    fn sync_task_view(&mut self) {
        match &self.list.selected {
            Some(project) => {
                if let Some(view) = self.task_view.as_mut() {
                    view.sync(project);
                } else {
                    self.task_view = Some(TaskView::new(project));
                }
            }
            None => self.task_view = None,
        }

        if self.task_view.is_none() {
            self.focus = Focus::Projects;
        }
        clamp(&mut self.project_state, self.list.projects.len());
        let task_count = self.task_view.as_ref().map_or(0, |v| v.tasks.len());
        clamp(&mut self.task_state, task_count);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Projects if self.task_view.is_some() => Focus::Tasks,
            _ => Focus::Projects,
        };
    }

    pub fn next_item(&mut self) {
        let (state, len) = self.focused_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        let (state, len) = self.focused_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn focused_table(&mut self) -> (&mut TableState, usize) {
        match self.focus {
            Focus::Projects => (&mut self.project_state, self.list.projects.len()),
            Focus::Tasks => (
                &mut self.task_state,
                self.task_view.as_ref().map_or(0, |v| v.tasks.len()),
            ),
        }
    }

    fn highlighted_project_id(&self) -> Option<i64> {
        let i = self.project_state.selected()?;
        self.list.projects.get(i).map(|p| p.id)
    }

    fn highlighted_task_id(&self) -> Option<i64> {
        let i = self.task_state.selected()?;
        self.task_view.as_ref()?.tasks.get(i).map(|t| t.id)
    }

    /// "View Tasks" on the highlighted project.
    pub fn select_highlighted(&mut self) {
        if let Some(id) = self.highlighted_project_id() {
            self.list.select(id);
            self.task_state = TableState::default();
            self.sync_task_view();
        }
    }

    pub fn clear_selection(&mut self) {
        self.list.clear_selection();
        self.sync_task_view();
    }

    pub fn open_new_dialog(&mut self) {
        match self.focus {
            Focus::Projects => {
                self.form = Some(Form::project(&self.list.new_project));
                self.popup_mode = PopupMode::NewProject;
            }
            Focus::Tasks => {
                if let Some(view) = &self.task_view {
                    self.form = Some(Form::task(&view.project_name, &view.new_task));
                    self.popup_mode = PopupMode::NewTask;
                }
            }
        }
    }

    /// Closes the dialog; typed values stay in the pending payload.
    pub fn close_popup(&mut self) {
        self.write_back_form();
        self.form = None;
        self.popup_mode = PopupMode::None;
    }

    fn write_back_form(&mut self) {
        let Some(form) = &self.form else {
            return;
        };
        match self.popup_mode {
            PopupMode::NewProject => form.apply_to_project(&mut self.list.new_project),
            PopupMode::NewTask => {
                if let Some(view) = self.task_view.as_mut() {
                    form.apply_to_task(&mut view.new_task);
                }
            }
            PopupMode::None => {}
        }
    }

    /// Submits the open dialog. It stays open when the request fails.
    pub async fn submit_form(&mut self) {
        self.write_back_form();
        let created = match self.popup_mode {
            PopupMode::NewProject => {
                let created = self.list.create(&self.api).await;
                if created {
                    self.sync_task_view();
                }
                created
            }
            PopupMode::NewTask => {
                let created = match self.task_view.as_mut() {
                    Some(view) => view.create(&self.api).await,
                    None => false,
                };
                if created {
                    self.refresh_data().await;
                }
                created
            }
            PopupMode::None => false,
        };

        if created {
            self.form = None;
            self.popup_mode = PopupMode::None;
        }
    }

    /// Resubmits the highlighted project's current name and description.
    pub async fn update_highlighted_project(&mut self) {
        let Some(i) = self.project_state.selected() else {
            return;
        };
        let Some(project) = self.list.projects.get(i) else {
            return;
        };
        let (id, payload) = (project.id, ProjectCreate::from_project(project));
        if self.list.update(&self.api, id, &payload).await {
            self.sync_task_view();
        }
    }

    pub async fn delete_highlighted(&mut self) {
        match self.focus {
            Focus::Projects => {
                if let Some(id) = self.highlighted_project_id() {
                    if self.list.delete(&self.api, id).await {
                        self.sync_task_view();
                    }
                }
            }
            Focus::Tasks => {
                let Some(task_id) = self.highlighted_task_id() else {
                    return;
                };
                let deleted = match self.task_view.as_mut() {
                    Some(view) => view.delete(&self.api, task_id).await,
                    None => false,
                };
                if deleted {
                    self.refresh_data().await;
                }
            }
        }
    }

    pub async fn cycle_highlighted_task(&mut self) {
        let Some(task_id) = self.highlighted_task_id() else {
            return;
        };
        let updated = match self.task_view.as_mut() {
            Some(view) => view.cycle_status(&self.api, task_id).await,
            None => false,
        };
        if updated {
            self.refresh_data().await;
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if self.popup_mode != PopupMode::None {
            self.handle_popup_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Down => self.next_item(),
            KeyCode::Up => self.previous_item(),
            KeyCode::Enter => {
                if self.focus == Focus::Projects {
                    self.select_highlighted();
                }
            }
            KeyCode::Esc => self.clear_selection(),
            KeyCode::Char('n') => self.open_new_dialog(),
            KeyCode::Char('r') => self.refresh_data().await,
            KeyCode::Char('d') => self.delete_highlighted().await,
            KeyCode::Char('u') => {
                if self.focus == Focus::Projects {
                    self.update_highlighted_project().await;
                }
            }
            KeyCode::Char('s') => {
                if self.focus == Focus::Tasks {
                    self.cycle_highlighted_task().await;
                }
            }
            _ => {}
        }
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.close_popup();
                return;
            }
            KeyCode::Enter => {
                self.submit_form().await;
                return;
            }
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => form.focused_field().move_left(),
            KeyCode::Right => form.focused_field().move_right(),
            KeyCode::Home => form.focused_field().move_home(),
            KeyCode::End => form.focused_field().move_end(),
            KeyCode::Backspace => form.focused_field().delete_char(),
            KeyCode::Char(c) => form.focused_field().insert_char(c),
            _ => {}
        }
    }
}

fn clamp(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

pub fn run_tui<B: Backend>(rt: &Runtime, api: B, api_url: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api, api_url);
    rt.block_on(app.refresh_data());
    let res = run_app(&mut terminal, &mut app, rt);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<T: ratatui::backend::Backend, B: Backend>(
    terminal: &mut Terminal<T>,
    app: &mut App<B>,
    rt: &Runtime,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                rt.block_on(app.handle_key(key));
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Done => Color::Green,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Todo => Color::Blue,
    }
}

fn table_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        })
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
}

fn ui<B: Backend>(f: &mut Frame, app: &mut App<B>) {
    let mut constraints = vec![Constraint::Length(3)];
    let chart_height = app
        .task_view
        .as_ref()
        .map(|v| (v.tasks.len() as u16).min(MAX_CHART_ROWS) + 3);
    match chart_height {
        Some(height) => constraints.extend([
            Constraint::Percentage(35),
            Constraint::Length(height),
            Constraint::Min(5),
        ]),
        None => constraints.push(Constraint::Min(0)),
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let title = Paragraph::new(format!("Project Management  ·  {}", app.api_url))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    render_projects(f, app, chunks[1]);
    if app.task_view.is_some() {
        render_gantt(f, app, chunks[2]);
        render_tasks(f, app, chunks[3]);
    }
    render_help(f, app, chunks[chunks.len() - 1]);

    if app.form.is_some() {
        render_form(f, app);
    }
}

fn render_projects<B: Backend>(f: &mut Frame, app: &mut App<B>, area: Rect) {
    let selected_id = app.list.selected_id();
    let rows: Vec<Row> = app
        .list
        .projects
        .iter()
        .map(|project| {
            let marker = if Some(project.id) == selected_id { "● " } else { "" };
            Row::new(vec![
                Cell::from(format!("{}{}", marker, project.name)),
                Cell::from(project.description.clone().unwrap_or_default()),
                Cell::from(dates::display_date(&project.created_at)),
                Cell::from(project.tasks.len().to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Length(12),
            Constraint::Length(6),
        ],
    )
    .header(header_row(&["Name", "Description", "Created", "Tasks"]))
    .block(table_block("Projects".to_string(), app.focus == Focus::Projects))
    .highlight_style(
        Style::default()
            .bg(Color::LightGreen)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.project_state);
}

fn render_gantt<B: Backend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let Some(view) = &app.task_view else {
        return;
    };
    let block = Block::default().title("Timeline").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.tasks.is_empty() {
        f.render_widget(Paragraph::new("No tasks yet. Press Tab then n to add one."), inner);
        return;
    }

    let rows = gantt::derive_rows(&view.tasks, dates::now_millis());
    let label_width = rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(20);
    let bar_width = (inner.width as usize).saturating_sub(label_width + 2);

    let Some(layout) = gantt::layout(&rows, bar_width) else {
        // No room left for bars.
        let labels: Vec<Line> = rows
            .iter()
            .take(MAX_CHART_ROWS as usize)
            .map(|row| Line::from(Span::styled(row.label.clone(), Style::default().fg(status_color(row.status)))))
            .collect();
        f.render_widget(Paragraph::new(labels), inner);
        return;
    };

    let mut lines: Vec<Line> = rows
        .iter()
        .zip(&layout.bars)
        .take(MAX_CHART_ROWS as usize)
        .map(|(row, bar)| {
            let label: String = row.label.chars().take(label_width).collect();
            Line::from(vec![
                Span::styled(format!("{:<label_width$} ", label), Style::default().fg(Color::White)),
                Span::styled("░".repeat(bar.offset), Style::default().fg(Color::DarkGray)),
                Span::styled("█".repeat(bar.duration), Style::default().fg(status_color(row.status))),
            ])
        })
        .collect();

    let start = dates::axis_label(layout.domain_start);
    let end = dates::axis_label(layout.domain_end);
    let gap = bar_width.saturating_sub(start.len() + end.len());
    lines.push(Line::from(Span::styled(
        format!("{:<label_width$} {}{}{}", "", start, " ".repeat(gap), end),
        Style::default().fg(Color::DarkGray),
    )));

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_tasks<B: Backend>(f: &mut Frame, app: &mut App<B>, area: Rect) {
    let Some(view) = &app.task_view else {
        return;
    };
    let rows: Vec<Row> = view
        .tasks
        .iter()
        .map(|task| {
            Row::new(vec![
                Cell::from(task.title.clone()),
                Cell::from(task.description.clone().unwrap_or_default()),
                Cell::from(dates::display_date(&task.start_date)),
                Cell::from(dates::display_date(&task.end_date)),
                Cell::from(Span::styled(
                    task.status.as_str(),
                    Style::default().fg(status_color(task.status)),
                )),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(35),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Title", "Description", "Start Date", "End Date", "Status"]))
    .block(table_block(
        format!("Tasks for {}", view.project_name),
        app.focus == Focus::Tasks,
    ))
    .highlight_style(
        Style::default()
            .bg(Color::LightGreen)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.task_state);
}

fn render_help<B: Backend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let help = match (app.popup_mode, app.focus) {
        (PopupMode::None, Focus::Projects) => {
            "↑/↓: Navigate • Enter: View tasks • n: New • u: Update • d: Delete • Tab: Tasks • r: Refresh • q: Quit"
        }
        (PopupMode::None, Focus::Tasks) => {
            "↑/↓: Navigate • s: Next status • n: New • d: Delete • Tab: Projects • Esc: Close • r: Refresh • q: Quit"
        }
        _ => "Tab: Next field • ←/→: Move / change status • Enter: Create • Esc: Cancel",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_form<B: Backend>(f: &mut Frame, app: &App<B>) {
    let Some(form) = &app.form else {
        return;
    };
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focused;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));

        let value_line = match (&field.kind, focused) {
            (FieldKind::Choice(_), true) => Line::from(vec![
                Span::raw("  ‹ "),
                Span::styled(field.value.clone(), Style::default().bg(Color::Cyan).fg(Color::Black)),
                Span::raw(" ›"),
            ]),
            (FieldKind::Text, true) => {
                let (before, after) = field.split_at_cursor();
                let mut chars = after.chars();
                let cursor = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
                Line::from(vec![
                    Span::raw(format!("  {}", before)),
                    Span::styled(cursor, Style::default().bg(Color::Cyan).fg(Color::Black)),
                    Span::raw(chars.as_str().to_string()),
                ])
            }
            _ => Line::from(Span::raw(format!("  {}", field.value))),
        };
        lines.push(value_line);
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .title(form.title.clone())
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(Color::White)),
        area,
    );
}

// Helper function to create centered rectangles for popups
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

//! The interactive board: a filterable task list with a create/edit form and
//! delete confirmation, driven by a single event loop.
//!
//! Remote calls never block the loop. A request is spawned onto the runtime
//! and completes through an mpsc channel the loop polls between key events,
//! so the board keeps drawing (with a loading indicator) while a call is
//! outstanding. One request at a time: input that would start a second one is
//! refused with a busy notice. Quitting drops the receiver, so a response
//! from an abandoned request has nowhere to land and is simply discarded.

mod view;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{ApiError, TaskApi};
use crate::session::User;
use crate::tasks::{Priority, Status, Task, TaskDraft, TaskFilter, TaskStore};

const BUSY_NOTICE: &str = "Still working on the previous request...";

/// A remote operation requested by the UI.
#[derive(Debug, Clone, PartialEq)]
enum Request {
    Load,
    Create(TaskDraft),
    Update(i64, TaskDraft),
    Delete(i64),
}

/// The completion of a remote operation, delivered through the channel.
enum Response {
    Loaded(Result<Vec<Task>, ApiError>),
    Saved(Result<Task, ApiError>),
    Deleted(i64, Result<(), ApiError>),
}

enum Mode {
    List,
    Search,
    Form(Form),
    ConfirmDelete(i64),
}

/// The create/edit form. Text fields are edited as strings and parsed on
/// submit; priority and status are cycled in place.
struct Form {
    editing: Option<i64>,
    field: usize,
    title: String,
    description: String,
    due: String,
    category: String,
    priority: Priority,
    status: Status,
    error: Option<String>,
}

/// Field indices; 0..=3 take text, the last two cycle.
const FIELD_TITLE: usize = 0;
const FIELD_DESCRIPTION: usize = 1;
const FIELD_DUE: usize = 2;
const FIELD_CATEGORY: usize = 3;
const FIELD_PRIORITY: usize = 4;
const FIELD_STATUS: usize = 5;
const FIELD_COUNT: usize = 6;

impl Form {
    fn new() -> Self {
        let draft = TaskDraft::default();
        Self {
            editing: None,
            field: FIELD_TITLE,
            title: draft.title,
            description: draft.description,
            due: String::new(),
            category: draft.category,
            priority: draft.priority,
            status: draft.status,
            error: None,
        }
    }

    /// Pre-fill from the task being edited.
    fn edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            field: FIELD_TITLE,
            title: task.title.clone(),
            description: task.description.clone(),
            due: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
            category: task.category.clone(),
            priority: task.priority,
            status: task.status,
            error: None,
        }
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.field {
            FIELD_TITLE => Some(&mut self.title),
            FIELD_DESCRIPTION => Some(&mut self.description),
            FIELD_DUE => Some(&mut self.due),
            FIELD_CATEGORY => Some(&mut self.category),
            _ => None,
        }
    }

    fn cycle_choice(&mut self, forward: bool) {
        match self.field {
            FIELD_PRIORITY => self.priority = cycle(&Priority::ALL, self.priority, forward),
            FIELD_STATUS => self.status = cycle(&Status::ALL, self.status, forward),
            _ => {}
        }
    }

    /// Validate and build the draft. An empty title or an unparseable due
    /// date stays in the form; nothing reaches the network.
    fn to_draft(&self) -> Result<TaskDraft, String> {
        if self.title.trim().is_empty() {
            return Err("Title is required.".to_string());
        }
        let due_date = if self.due.trim().is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(self.due.trim(), "%Y-%m-%d")
                    .map_err(|_| "Due date must be YYYY-MM-DD.".to_string())?,
            )
        };
        Ok(TaskDraft {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            due_date,
            priority: self.priority,
            status: self.status,
            category: self.category.clone(),
        })
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % all.len()
    } else {
        (idx + all.len() - 1) % all.len()
    };
    all[next]
}

struct App {
    user: User,
    store: TaskStore,
    filter: TaskFilter,
    selected: usize,
    mode: Mode,
    /// Label of the in-flight request, if any. Doubles as the busy flag.
    pending: Option<&'static str>,
    notice: Option<String>,
    should_quit: bool,
}

impl App {
    fn new(user: User) -> Self {
        Self {
            user,
            store: TaskStore::new(),
            filter: TaskFilter::default(),
            selected: 0,
            mode: Mode::List,
            pending: None,
            notice: None,
            should_quit: false,
        }
    }

    fn visible(&self) -> Vec<&Task> {
        self.store.filter(&self.filter)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.visible().get(self.selected).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Gate a request on the pending slot: at most one remote call at a time.
    fn request(&mut self, request: Request) -> Option<Request> {
        if self.pending.is_some() {
            self.notice = Some(BUSY_NOTICE.to_string());
            return None;
        }
        Some(request)
    }

    /// Called by the event loop when a request is actually dispatched.
    fn begin(&mut self, request: &Request) {
        self.pending = Some(match request {
            Request::Load => {
                self.store.begin_load();
                "Loading tasks"
            }
            Request::Create(_) | Request::Update(..) => "Saving",
            Request::Delete(_) => "Deleting",
        });
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        match &mut self.mode {
            Mode::List => self.handle_list_key(key),
            Mode::Search => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.mode = Mode::List,
                    KeyCode::Backspace => {
                        self.filter.search.pop();
                        self.clamp_selection();
                    }
                    KeyCode::Char(c) => {
                        self.filter.search.push(c);
                        self.clamp_selection();
                    }
                    _ => {}
                }
                None
            }
            Mode::Form(form) => match key.code {
                KeyCode::Esc => {
                    self.mode = Mode::List;
                    None
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.field = (form.field + 1) % FIELD_COUNT;
                    None
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.field = (form.field + FIELD_COUNT - 1) % FIELD_COUNT;
                    None
                }
                KeyCode::Left => {
                    form.cycle_choice(false);
                    None
                }
                KeyCode::Right => {
                    form.cycle_choice(true);
                    None
                }
                KeyCode::Backspace => {
                    if let Some(text) = form.active_text() {
                        text.pop();
                    }
                    None
                }
                KeyCode::Char(c) => {
                    if let Some(text) = form.active_text() {
                        text.push(c);
                    }
                    None
                }
                KeyCode::Enter => match form.to_draft() {
                    Ok(draft) => {
                        let request = match form.editing {
                            Some(id) => Request::Update(id, draft),
                            None => Request::Create(draft),
                        };
                        self.request(request)
                    }
                    Err(message) => {
                        form.error = Some(message);
                        None
                    }
                },
                _ => None,
            },
            Mode::ConfirmDelete(id) => {
                let id = *id;
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        self.mode = Mode::List;
                        self.request(Request::Delete(id))
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                        self.mode = Mode::List;
                        None
                    }
                    _ => None,
                }
            }
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Request> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('r') => self.request(Request::Load),
            KeyCode::Char('n') => {
                self.mode = Mode::Form(Form::new());
                None
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    self.mode = Mode::Form(Form::edit(task));
                }
                None
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.selected_task() {
                    self.mode = Mode::ConfirmDelete(task.id);
                }
                None
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                None
            }
            KeyCode::Char('s') => {
                self.filter.status = cycle_filter(&Status::ALL, self.filter.status);
                self.clamp_selection();
                None
            }
            KeyCode::Char('p') => {
                self.filter.priority = cycle_filter(&Priority::ALL, self.filter.priority);
                self.clamp_selection();
                None
            }
            KeyCode::Char('c') => {
                self.filter.clear();
                self.clamp_selection();
                None
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                let len = self.visible().len();
                if self.selected + 1 < len {
                    self.selected += 1;
                }
                None
            }
            _ => None,
        }
    }

    /// Absorb a completed request. May produce a follow-up request (a save
    /// triggers the full reload that picks up server-assigned fields).
    fn handle_response(&mut self, response: Response) -> Option<Request> {
        self.pending = None;
        match response {
            Response::Loaded(result) => {
                match self.store.finish_load(result) {
                    Ok(()) => self.clamp_selection(),
                    Err(_) => self.notice = Some("Failed to load tasks.".to_string()),
                }
                None
            }
            Response::Saved(result) => match result {
                Ok(_) => {
                    if matches!(self.mode, Mode::Form(_)) {
                        self.mode = Mode::List;
                    }
                    self.notice = Some("Saved.".to_string());
                    Some(Request::Load)
                }
                Err(_) => {
                    let message = "Failed to save task.".to_string();
                    if let Mode::Form(form) = &mut self.mode {
                        form.error = Some(message);
                    } else {
                        self.notice = Some(message);
                    }
                    None
                }
            },
            Response::Deleted(id, result) => {
                match result {
                    Ok(()) => {
                        self.store.remove(id);
                        self.clamp_selection();
                        self.notice = Some("Task deleted.".to_string());
                    }
                    Err(_) => self.notice = Some("Failed to delete task.".to_string()),
                }
                None
            }
        }
    }
}

/// Run the board until the user quits.
pub async fn run(api: Arc<dyn TaskApi>, user: User) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, api, user).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    api: Arc<dyn TaskApi>,
    user: User,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(user);
    dispatch(&api, &tx, &mut app, Request::Load);

    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, &app))?;

        // Completions first; a save's follow-up reload goes out immediately.
        while let Ok(response) = rx.try_recv() {
            if let Some(request) = app.handle_response(response) {
                dispatch(&api, &tx, &mut app, request);
            }
        }

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(request) = app.handle_key(key) {
                    dispatch(&api, &tx, &mut app, request);
                }
            }
        }
    }

    // Dropping rx abandons anything still in flight; the spawned task's send
    // fails and the late response is discarded.
    Ok(())
}

fn dispatch(
    api: &Arc<dyn TaskApi>,
    tx: &mpsc::UnboundedSender<Response>,
    app: &mut App,
    request: Request,
) {
    app.begin(&request);
    let api = Arc::clone(api);
    let tx = tx.clone();
    tokio::spawn(async move {
        let response = perform(api.as_ref(), request).await;
        let _ = tx.send(response);
    });
}

async fn perform(api: &dyn TaskApi, request: Request) -> Response {
    match request {
        Request::Load => Response::Loaded(api.list_tasks().await),
        Request::Create(draft) => Response::Saved(api.create_task(&draft).await),
        Request::Update(id, draft) => Response::Saved(api.update_task(id, &draft).await),
        Request::Delete(id) => Response::Deleted(id, api.delete_task(id).await),
    }
}

fn cycle_filter<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => Some(all[0]),
        Some(value) => {
            let idx = all.iter().position(|v| *v == value).unwrap_or(0);
            if idx + 1 < all.len() {
                Some(all[idx + 1])
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn task(id: i64, title: &str, status: Status) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority: Priority::Medium,
            status,
            category: String::new(),
            created_at: Utc::now(),
            user_id: 1,
        }
    }

    fn app_with_tasks(tasks: Vec<Task>) -> App {
        let mut app = App::new(User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        });
        app.store.finish_load(Ok(tasks)).unwrap();
        app
    }

    #[test]
    fn submitting_an_empty_title_stays_in_the_form() {
        let mut app = app_with_tasks(vec![]);
        app.handle_key(press(KeyCode::Char('n')));
        let request = app.handle_key(press(KeyCode::Enter));
        assert_eq!(request, None);
        match &app.mode {
            Mode::Form(form) => assert_eq!(form.error.as_deref(), Some("Title is required.")),
            _ => panic!("expected the form to stay open"),
        }
    }

    #[test]
    fn a_bad_due_date_never_produces_a_request() {
        let mut app = app_with_tasks(vec![]);
        app.handle_key(press(KeyCode::Char('n')));
        for c in "Milk".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Tab));
        for c in "tomorrow".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(app.handle_key(press(KeyCode::Enter)), None);
        match &app.mode {
            Mode::Form(form) => {
                assert_eq!(form.error.as_deref(), Some("Due date must be YYYY-MM-DD."))
            }
            _ => panic!("expected the form to stay open"),
        }
    }

    #[test]
    fn a_valid_form_submit_produces_a_create_request() {
        let mut app = app_with_tasks(vec![]);
        app.handle_key(press(KeyCode::Char('n')));
        for c in "Milk".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        match app.handle_key(press(KeyCode::Enter)) {
            Some(Request::Create(draft)) => {
                assert_eq!(draft.title, "Milk");
                assert_eq!(draft.priority, Priority::Medium);
                assert_eq!(draft.status, Status::ToDo);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn input_while_a_request_is_in_flight_is_refused() {
        let mut app = app_with_tasks(vec![task(1, "A", Status::ToDo)]);
        app.begin(&Request::Load);

        assert_eq!(app.handle_key(press(KeyCode::Char('r'))), None);
        assert_eq!(app.notice.as_deref(), Some(BUSY_NOTICE));
    }

    #[test]
    fn delete_requires_an_explicit_yes() {
        let mut app = app_with_tasks(vec![task(1, "A", Status::ToDo), task(2, "B", Status::Done)]);

        app.handle_key(press(KeyCode::Char('d')));
        assert!(matches!(app.mode, Mode::ConfirmDelete(1)));

        // Declining goes back without a request.
        assert_eq!(app.handle_key(press(KeyCode::Char('n'))), None);
        assert!(matches!(app.mode, Mode::List));

        app.handle_key(press(KeyCode::Char('d')));
        assert_eq!(
            app.handle_key(press(KeyCode::Char('y'))),
            Some(Request::Delete(1))
        );
    }

    #[test]
    fn a_successful_delete_splices_locally() {
        let mut app = app_with_tasks(vec![task(1, "A", Status::ToDo), task(2, "B", Status::Done)]);
        app.begin(&Request::Delete(1));

        app.handle_response(Response::Deleted(1, Ok(())));
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.tasks()[0].id, 2);
        assert_eq!(app.pending, None);
    }

    #[test]
    fn a_successful_save_closes_the_form_and_reloads() {
        let mut app = app_with_tasks(vec![]);
        app.handle_key(press(KeyCode::Char('n')));
        app.begin(&Request::Create(TaskDraft::default()));

        let follow_up = app.handle_response(Response::Saved(Ok(task(1, "A", Status::ToDo))));
        assert_eq!(follow_up, Some(Request::Load));
        assert!(matches!(app.mode, Mode::List));
    }

    #[test]
    fn search_narrows_and_clear_restores() {
        let mut app = app_with_tasks(vec![
            task(1, "Groceries run", Status::ToDo),
            task(2, "Work groceries", Status::Done),
            task(3, "Laundry", Status::ToDo),
        ]);

        app.handle_key(press(KeyCode::Char('/')));
        for c in "groceries".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.visible().iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);

        app.handle_key(press(KeyCode::Char('c')));
        assert_eq!(app.visible().len(), 3);
        assert!(!app.filter.is_active());
    }

    #[test]
    fn status_filter_cycles_through_all_and_back() {
        let mut app = app_with_tasks(vec![]);
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.filter.status, Some(Status::ToDo));
        app.handle_key(press(KeyCode::Char('s')));
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.filter.status, Some(Status::Done));
        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.filter.status, None);
    }

    #[test]
    fn edit_prefills_the_form_from_the_selected_task() {
        let mut existing = task(5, "Report", Status::InProgress);
        existing.category = "Work".to_string();
        let mut app = app_with_tasks(vec![existing]);

        app.handle_key(press(KeyCode::Char('e')));
        match &app.mode {
            Mode::Form(form) => {
                assert_eq!(form.editing, Some(5));
                assert_eq!(form.title, "Report");
                assert_eq!(form.status, Status::InProgress);
                assert_eq!(form.category, "Work");
            }
            _ => panic!("expected the edit form"),
        }
    }
}

use crate::commands::{describe_filter, Session};
use anyhow::Result;
use calboard::calendar::{day_key, CalendarDay};
use calboard::model::{DayKey, Label, Task, TaskId};
use calboard::storage::{screenshot_path, write_text};
use chrono::{Datelike, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::block::Title;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(session: Session) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

/// Draws the month grid into an off-screen buffer and returns it as text.
pub fn render_text(session: &Session, width: u16, height: u16) -> Result<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height))?;
    let today = today_key();
    let grid = GridView {
        session,
        today: &today,
        cursor: None,
        selected: None,
        editing: None,
        moving: None,
    };
    terminal.draw(|f| {
        let area = f.size();
        draw_month(f, area, &grid);
    })?;
    Ok(buffer_text(terminal.backend().buffer()))
}

struct App {
    session: Session,
    today: String,
    cursor: usize,
    selected: usize,
    status: String,
    mode: Mode,
    last_save: Option<Instant>,
}

enum Mode {
    Normal,
    Editing {
        day: DayKey,
        task: TaskId,
        input: FieldValue,
    },
    Moving {
        from: DayKey,
        task: TaskId,
    },
    Search {
        input: FieldValue,
    },
    Labels(LabelModal),
    Chips {
        idx: usize,
    },
}

struct LabelModal {
    day: DayKey,
    task: TaskId,
    available: Vec<Label>,
    idx: usize,
    text: FieldValue,
    color_idx: usize,
    focus: ModalFocus,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ModalFocus {
    Existing,
    Create,
}

/// Everything the month grid needs, borrowed for one frame.
struct GridView<'a> {
    session: &'a Session,
    today: &'a str,
    cursor: Option<usize>,
    selected: Option<usize>,
    editing: Option<(TaskId, &'a FieldValue)>,
    moving: Option<&'a str>,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.cursor, '▌');
        text
    }
}

impl App {
    fn new(session: Session) -> Self {
        let today = today_key();
        let first_of_month = day_key(session.month.with_day(1).unwrap_or(session.month));
        let cursor = session
            .days
            .iter()
            .position(|d| d.date == today)
            .or_else(|| session.days.iter().position(|d| d.date == first_of_month))
            .unwrap_or(0);
        let status = format!("Loaded board from {}", session.path.display());
        App {
            session,
            today,
            cursor,
            selected: 0,
            status,
            mode: Mode::Normal,
            last_save: None,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Editing { day, task, input } => self.handle_editing_key(key, day, task, input),
            Mode::Moving { from, task } => self.handle_moving_key(key, from, task),
            Mode::Search { input } => self.handle_search_key(key, input),
            Mode::Labels(modal) => self.handle_label_key(key, modal),
            Mode::Chips { idx } => self.handle_chips_key(key, idx),
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Left | KeyCode::Char('h') => self.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.shift_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.shift_cursor(7),
            KeyCode::Tab => self.step_task(1),
            KeyCode::BackTab => self.step_task(-1),
            KeyCode::Char('n') => self.create_task(),
            KeyCode::Enter | KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('m') => self.start_move(),
            KeyCode::Char('K') => self.swap_selected(-1),
            KeyCode::Char('J') => self.swap_selected(1),
            KeyCode::Char('t') => self.open_label_modal(),
            KeyCode::Char('/') => {
                self.mode = Mode::Search {
                    input: FieldValue::new(self.session.board.search_text()),
                };
            }
            KeyCode::Char('f') => {
                if self.session.board.labels().is_empty() {
                    self.status = "No labels defined yet".into();
                } else {
                    self.mode = Mode::Chips { idx: 0 };
                }
            }
            KeyCode::Char('c') => {
                self.session.board.clear_filter();
                self.clamp_selection();
                self.status = "Filter cleared".into();
            }
            KeyCode::Char('w') => self.save(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('s') => self.screenshot(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_editing_key(&mut self, key: KeyEvent, day: DayKey, task: TaskId, mut input: FieldValue) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                match self.session.board.commit_task(task, &day, &input.value, false) {
                    Ok(()) => {
                        self.select_task(task);
                        self.status = format!("Saved task {}", task);
                    }
                    Err(err) => self.status = format!("Could not save: {}", err),
                }
                return;
            }
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Char(c) if !is_chord(&key) => input.insert_char(c),
            _ => {}
        }
        self.mode = Mode::Editing { day, task, input };
    }

    fn handle_moving_key(&mut self, key: KeyEvent, from: DayKey, task: TaskId) {
        match key.code {
            KeyCode::Esc => {
                self.status = "Move canceled".into();
                return;
            }
            KeyCode::Enter => {
                let to = self.current_day().to_string();
                match self.session.board.move_task(&from, task, &to) {
                    Ok(()) => {
                        self.select_task(task);
                        self.status = format!("Moved task {} to {}", task, to);
                    }
                    Err(err) => self.status = format!("Move failed: {}", err),
                }
                return;
            }
            KeyCode::Left | KeyCode::Char('h') => self.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.shift_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.shift_cursor(7),
            _ => {}
        }
        self.mode = Mode::Moving { from, task };
    }

    fn handle_search_key(&mut self, key: KeyEvent, mut input: FieldValue) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.status = format!("Filter: {}", describe_filter(&self.session.board));
                return;
            }
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Backspace => {
                input.backspace();
                self.session.board.set_search_text(&input.value);
            }
            KeyCode::Char(c) if !is_chord(&key) => {
                input.insert_char(c);
                self.session.board.set_search_text(&input.value);
            }
            _ => {}
        }
        self.clamp_selection();
        self.mode = Mode::Search { input };
    }

    fn handle_label_key(&mut self, key: KeyEvent, mut modal: LabelModal) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Tab | KeyCode::BackTab => {
                modal.focus = match modal.focus {
                    ModalFocus::Existing => ModalFocus::Create,
                    ModalFocus::Create if !modal.available.is_empty() => ModalFocus::Existing,
                    ModalFocus::Create => ModalFocus::Create,
                };
            }
            KeyCode::Enter => {
                if self.submit_label(&modal) {
                    return;
                }
            }
            _ => match modal.focus {
                ModalFocus::Existing => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => modal.idx = modal.idx.saturating_sub(1),
                    KeyCode::Down | KeyCode::Char('j') => {
                        if modal.idx + 1 < modal.available.len() {
                            modal.idx += 1;
                        }
                    }
                    _ => {}
                },
                ModalFocus::Create => {
                    let palette = self.session.config.label_palette.len().max(1);
                    match key.code {
                        KeyCode::Left => modal.color_idx = (modal.color_idx + palette - 1) % palette,
                        KeyCode::Right => modal.color_idx = (modal.color_idx + 1) % palette,
                        KeyCode::Backspace => modal.text.backspace(),
                        KeyCode::Char(c) if !is_chord(&key) => modal.text.insert_char(c),
                        _ => {}
                    }
                }
            },
        }
        self.mode = Mode::Labels(modal);
    }

    /// Returns true when the modal should close.
    fn submit_label(&mut self, modal: &LabelModal) -> bool {
        let result = match modal.focus {
            ModalFocus::Existing => match modal.available.get(modal.idx) {
                Some(label) => self
                    .session
                    .board
                    .attach_existing_label(&modal.day, modal.task, label.id)
                    .map(|_| label.id),
                None => return false,
            },
            ModalFocus::Create => {
                let color = self
                    .session
                    .config
                    .label_palette
                    .get(modal.color_idx)
                    .cloned()
                    .unwrap_or_default();
                self.session.board.create_label_for_task(
                    &modal.day,
                    modal.task,
                    &color,
                    modal.text.value.trim(),
                )
            }
        };
        match result {
            Ok(id) => {
                self.status = format!("Label {} added to task {}", id, modal.task);
                true
            }
            Err(err) => {
                self.status = format!("Could not add label: {}", err);
                false
            }
        }
    }

    fn handle_chips_key(&mut self, key: KeyEvent, mut idx: usize) {
        let count = self.session.board.labels().len();
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Up | KeyCode::Char('k') => idx = idx.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if idx + 1 < count {
                    idx += 1;
                }
            }
            KeyCode::Enter => {
                let id = self.session.board.labels().as_slice().get(idx).map(|l| l.id);
                self.session.board.select_label(id);
                self.clamp_selection();
                self.status = format!("Filter: {}", describe_filter(&self.session.board));
                return;
            }
            _ => {}
        }
        self.mode = Mode::Chips { idx };
    }

    fn create_task(&mut self) {
        let day = self.current_day().to_string();
        match self.session.board.create_empty_task(&day) {
            Ok(task) => {
                self.select_task(task);
                self.mode = Mode::Editing {
                    day,
                    task,
                    input: FieldValue::new(""),
                };
                self.status = "New task (Enter or Esc to save)".into();
            }
            Err(err) => self.status = format!("Could not create: {}", err),
        }
    }

    fn edit_selected(&mut self) {
        let Some(task) = self.selected_task().map(|t| t.id) else {
            self.status = "No task selected to edit".into();
            return;
        };
        let day = self.current_day().to_string();
        if let Err(err) = self.session.board.begin_edit(&day, task) {
            self.status = format!("Could not edit: {}", err);
            return;
        }
        let text = self
            .session
            .board
            .task(&day, task)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.select_task(task);
        self.mode = Mode::Editing {
            day,
            task,
            input: FieldValue::new(&text),
        };
        self.status = format!("Editing task {}", task);
    }

    fn start_move(&mut self) {
        if self.session.board.is_filtering() {
            self.status = "Moving is disabled while a filter is active".into();
            return;
        }
        let Some(task) = self.selected_task().map(|t| t.id) else {
            self.status = "No task selected to move".into();
            return;
        };
        self.mode = Mode::Moving {
            from: self.current_day().to_string(),
            task,
        };
        self.status = format!("Moving task {}: pick a day, Enter to drop, Esc to cancel", task);
    }

    fn swap_selected(&mut self, delta: isize) {
        let day = self.current_day().to_string();
        let pair = {
            let tasks = self.session.board.project(&day);
            let target = self.selected as isize + delta;
            if target < 0 {
                None
            } else {
                tasks
                    .get(self.selected)
                    .zip(tasks.get(target as usize))
                    .map(|(drag, hover)| (drag.id, drag.order, hover.id, hover.order))
            }
        };
        let Some((drag_id, drag_order, hover_id, hover_order)) = pair else {
            return;
        };
        if drag_order == hover_order {
            self.status = "Tasks share a rank; nothing to swap".into();
            return;
        }
        match self
            .session
            .board
            .reorder_task(Some(drag_order), hover_order, drag_id, hover_id, &day)
        {
            Ok(()) => {
                self.select_task(drag_id);
                self.status = format!("Swapped task {} with task {}", drag_id, hover_id);
            }
            Err(err) => self.status = format!("Reorder failed: {}", err),
        }
    }

    fn open_label_modal(&mut self) {
        let Some(task) = self.selected_task().map(|t| t.id) else {
            self.status = "No task selected to label".into();
            return;
        };
        let day = self.current_day().to_string();
        let available = match self.session.board.available_labels(&day, task) {
            Ok(labels) => labels.into_iter().cloned().collect::<Vec<_>>(),
            Err(err) => {
                self.status = format!("Could not label: {}", err);
                return;
            }
        };
        let focus = if available.is_empty() {
            ModalFocus::Create
        } else {
            ModalFocus::Existing
        };
        self.mode = Mode::Labels(LabelModal {
            day,
            task,
            available,
            idx: 0,
            text: FieldValue::new(""),
            color_idx: 0,
            focus,
        });
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(()) => {
                self.last_save = Some(Instant::now());
                self.status = format!("Saved to {}", self.session.path.display());
            }
            Err(err) => self.status = format!("Save failed: {:#}", err),
        }
    }

    fn reload(&mut self) {
        match self.session.reload() {
            Ok(()) => {
                self.clamp_selection();
                self.status = format!("Reloaded {}", self.session.path.display());
            }
            Err(err) => self.status = format!("Reload failed: {:#}", err),
        }
    }

    fn screenshot(&mut self) {
        let (width, height) = terminal::size().unwrap_or((160, 48));
        let path = screenshot_path(&self.session.config.screenshot_dir, Local::now());
        let result = render_text(&self.session, width, height).and_then(|text| write_text(&path, &text));
        self.status = match result {
            Ok(()) => format!("Screenshot saved to {}", path.display()),
            Err(err) => format!("Screenshot failed: {:#}", err),
        };
    }

    fn shift_cursor(&mut self, delta: isize) {
        let max = self.session.days.len().saturating_sub(1) as isize;
        let target = (self.cursor as isize + delta).clamp(0, max) as usize;
        if target != self.cursor {
            self.cursor = target;
            self.selected = 0;
        }
    }

    fn step_task(&mut self, delta: isize) {
        let len = self.session.board.project(self.current_day()).len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(len as isize) as usize;
    }

    fn select_task(&mut self, id: TaskId) {
        let position = self.session.board.project(self.current_day()).position(id);
        if let Some(idx) = position {
            self.selected = idx;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.board.project(self.current_day()).len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn current_day(&self) -> &str {
        self.session
            .days
            .get(self.cursor)
            .map(|d| d.date.as_str())
            .unwrap_or_default()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.session.board.project(self.current_day()).get(self.selected)
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(10),
                Constraint::Length(1),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        let (editing, moving) = match &self.mode {
            Mode::Editing { task, input, .. } => (Some((*task, input)), None),
            Mode::Moving { from, .. } => (None, Some(from.as_str())),
            _ => (None, None),
        };
        let grid = GridView {
            session: &self.session,
            today: &self.today,
            cursor: Some(self.cursor),
            selected: Some(self.selected),
            editing,
            moving,
        };
        draw_month(f, layout[1], &grid);
        self.draw_chips(f, layout[2]);
        self.draw_footer(f, layout[3]);

        match &self.mode {
            Mode::Labels(modal) => self.draw_label_modal(f, modal),
            Mode::Chips { idx } => self.draw_chip_picker(f, *idx),
            _ => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let saved = match self.last_save {
            Some(at) => format!("saved {}", format_elapsed(at)),
            None => "not saved".to_string(),
        };
        let title = Line::from(vec![
            Span::styled(
                "calboard ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.session.month_title(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.session.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(saved, Style::default().fg(Color::Gray)),
            Span::raw("  •  "),
            Span::styled(
                format!("filter {}", describe_filter(&self.session.board)),
                Style::default().fg(if self.session.board.is_filtering() {
                    Color::LightYellow
                } else {
                    Color::Magenta
                }),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_chips(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let board = &self.session.board;
        let mut spans = vec![Span::styled("labels ", Style::default().fg(Color::Gray))];
        if board.labels().is_empty() {
            spans.push(Span::styled("none", Style::default().fg(Color::DarkGray)));
        }
        for label in board.labels().iter() {
            let mut style = Style::default()
                .fg(Color::Black)
                .bg(parse_color(&label.color));
            if board.selected_label() == Some(label.id) {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            spans.push(Span::styled(format!(" {} ", label.text), style));
            spans.push(Span::raw(" "));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = match &self.mode {
            Mode::Search { input } => format!("Search: {}", input.with_caret()),
            _ => self.status.clone(),
        };
        let status = Paragraph::new(status).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let spans = match &self.mode {
            Mode::Normal => vec![
                key("←↑↓→ / h j k l", Color::LightCyan),
                Span::raw(" day  "),
                key("Tab", Color::LightCyan),
                Span::raw(" task  "),
                key("n", Color::LightMagenta),
                Span::raw(" new  "),
                key("e", Color::LightYellow),
                Span::raw(" edit  "),
                key("m", Color::LightGreen),
                Span::raw(" move  "),
                key("K/J", Color::LightGreen),
                Span::raw(" swap  "),
                key("t", Color::LightMagenta),
                Span::raw(" label  "),
                key("/", Color::LightYellow),
                Span::raw(" search  "),
                key("f", Color::LightYellow),
                Span::raw(" filter  "),
                key("c", Color::LightYellow),
                Span::raw(" clear  "),
                key("w/r", Color::LightCyan),
                Span::raw(" write/reload  "),
                key("s", Color::LightCyan),
                Span::raw(" screenshot  "),
                key("q", Color::LightRed),
                Span::raw(" quit"),
            ],
            Mode::Editing { .. } => vec![
                key("type", Color::LightCyan),
                Span::raw(" text  "),
                key("Enter/Esc", Color::LightGreen),
                Span::raw(" save"),
            ],
            Mode::Moving { .. } => vec![
                key("←↑↓→", Color::LightCyan),
                Span::raw(" pick day  "),
                key("Enter", Color::LightGreen),
                Span::raw(" drop  "),
                key("Esc", Color::LightRed),
                Span::raw(" cancel"),
            ],
            Mode::Search { .. } => vec![
                key("type", Color::LightCyan),
                Span::raw(" filter as you type  "),
                key("Enter/Esc", Color::LightGreen),
                Span::raw(" done"),
            ],
            Mode::Labels(_) => vec![
                key("Tab", Color::LightCyan),
                Span::raw(" existing/new  "),
                key("←→", Color::LightCyan),
                Span::raw(" colour  "),
                key("Enter", Color::LightGreen),
                Span::raw(" add  "),
                key("Esc", Color::LightRed),
                Span::raw(" cancel"),
            ],
            Mode::Chips { .. } => vec![
                key("↑↓", Color::LightCyan),
                Span::raw(" browse  "),
                key("Enter", Color::LightGreen),
                Span::raw(" toggle  "),
                key("Esc", Color::LightRed),
                Span::raw(" close"),
            ],
        };
        Line::from(spans)
    }

    fn draw_label_modal(&self, f: &mut ratatui::Frame<'_>, modal: &LabelModal) {
        let area = centered_rect(60, 60, f.size());
        let heading = |text: &'static str, focused: bool| {
            Line::from(Span::styled(
                text,
                Style::default()
                    .fg(if focused { Color::Cyan } else { Color::Gray })
                    .add_modifier(Modifier::BOLD),
            ))
        };
        let mut lines = vec![heading("Existing labels", modal.focus == ModalFocus::Existing)];
        if modal.available.is_empty() {
            lines.push(Line::from(Span::styled(
                "  none left to add",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (idx, label) in modal.available.iter().enumerate() {
            let marker = if modal.focus == ModalFocus::Existing && idx == modal.idx {
                "› "
            } else {
                "  "
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!(" {} ", label.text),
                    Style::default().fg(Color::Black).bg(parse_color(&label.color)),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(heading("New label", modal.focus == ModalFocus::Create));
        let text = if modal.focus == ModalFocus::Create {
            modal.text.with_caret()
        } else {
            modal.text.value.clone()
        };
        lines.push(Line::from(vec![
            Span::styled("Text: ", Style::default().fg(Color::Gray)),
            Span::raw(text),
        ]));
        let mut swatches = vec![Span::styled("Colour: ", Style::default().fg(Color::Gray))];
        for (idx, color) in self.session.config.label_palette.iter().enumerate() {
            let symbol = if idx == modal.color_idx { "[■]" } else { " ■ " };
            swatches.push(Span::styled(symbol, Style::default().fg(parse_color(color))));
        }
        lines.push(Line::from(swatches));

        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        format!("Add label to task {}", modal.task),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_chip_picker(&self, f: &mut ratatui::Frame<'_>, idx: usize) {
        let area = centered_rect(40, 50, f.size());
        let selected = self.session.board.selected_label();
        let items: Vec<ListItem> = self
            .session
            .board
            .labels()
            .iter()
            .map(|label| {
                let mark = if selected == Some(label.id) { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::raw(mark),
                    Span::styled(
                        format!(" {} ", label.text),
                        Style::default().fg(Color::Black).bg(parse_color(&label.color)),
                    ),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(idx));
        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(
                        "Filter by label",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut state);
    }
}

fn draw_month(f: &mut ratatui::Frame<'_>, area: Rect, grid: &GridView<'_>) {
    let weeks = (grid.session.days.len() / 7).max(1);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        grid.session.month_title(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, sections[0]);

    let columns = || {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 7); 7])
    };
    let heading_cells = columns().split(sections[1]);
    for (cell, name) in heading_cells
        .iter()
        .zip(grid.session.config.week_start.headings())
    {
        let heading = Paragraph::new(Span::styled(name, Style::default().fg(Color::Gray)))
            .alignment(Alignment::Center);
        f.render_widget(heading, *cell);
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, weeks as u32); weeks])
        .split(sections[2]);
    for (week, row) in rows.iter().enumerate() {
        let cells = columns().split(*row);
        for (weekday, cell) in cells.iter().enumerate() {
            let idx = week * 7 + weekday;
            if let Some(day) = grid.session.days.get(idx) {
                draw_day(f, *cell, grid, idx, day);
            }
        }
    }
}

fn draw_day(f: &mut ratatui::Frame<'_>, area: Rect, grid: &GridView<'_>, idx: usize, day: &CalendarDay) {
    let is_cursor = grid.cursor == Some(idx);
    let holiday = grid.session.holidays.name_for(&day.date);
    let in_month = day
        .date
        .starts_with(&grid.session.month.format("%Y-%m").to_string());
    let accent = if is_cursor {
        Color::Cyan
    } else if grid.moving == Some(day.date.as_str()) {
        Color::LightRed
    } else if day.date == grid.today {
        Color::Magenta
    } else if holiday.is_some() {
        Color::Yellow
    } else if in_month {
        Color::DarkGray
    } else {
        Color::Rgb(48, 50, 56)
    };

    let mut title_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    if is_cursor {
        title_style = title_style.add_modifier(Modifier::UNDERLINED);
    }
    let mut block = Block::default()
        .title(Span::styled(format!(" {} ", day.day), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));
    if let Some(name) = holiday {
        let room = area.width.saturating_sub(8) as usize;
        block = block.title(
            Title::from(Span::styled(
                truncate_text(name, room),
                Style::default().fg(Color::Yellow),
            ))
            .alignment(Alignment::Right),
        );
    }

    let width = area.width.saturating_sub(2) as usize;
    let tasks = grid.session.board.project(&day.date);
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            let editing = grid
                .editing
                .filter(|(id, _)| *id == task.id)
                .map(|(_, field)| field);
            task_item(task, width, editing)
        })
        .collect();
    let mut state = ListState::default();
    if is_cursor && !items.is_empty() {
        state.select(grid.selected.map(|s| s.min(items.len() - 1)));
    }
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::Rgb(252, 214, 112))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, area, &mut state);
}

fn task_item(task: &Task, width: usize, editing: Option<&FieldValue>) -> ListItem<'static> {
    let mut lines = Vec::new();
    if !task.labels.is_empty() {
        let mut spans = Vec::new();
        for label in &task.labels {
            spans.push(Span::styled(
                truncate_text(&label.text, width),
                Style::default().fg(Color::Black).bg(parse_color(&label.color)),
            ));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }
    let text = match editing {
        Some(field) => Line::from(Span::styled(
            truncate_text(&field.with_caret(), width),
            Style::default().fg(Color::Cyan),
        )),
        None if task.is_editable => Line::from(Span::styled(
            truncate_text(&format!("✎ {}", task.text), width),
            Style::default().fg(Color::LightCyan).add_modifier(Modifier::ITALIC),
        )),
        None => Line::raw(truncate_text(&task.text, width)),
    };
    lines.push(text);
    ListItem::new(lines)
}

fn buffer_text(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer.get(x, y).symbol());
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
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

fn is_chord(key: &KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn today_key() -> String {
    day_key(Local::now().date_naive())
}

/// `#rrggbb` to an RGB colour; anything else renders grey.
fn parse_color(raw: &str) -> Color {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Color::Gray;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or(""), 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&".".repeat(max - keep));
    out
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_edits_respect_char_boundaries() {
        let mut field = FieldValue::new("día");
        field.move_left();
        field.backspace();
        assert_eq!(field.value, "da");
        field.insert_char('í');
        assert_eq!(field.value, "día");
        field.move_right();
        assert_eq!(field.with_caret(), "día▌");
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#eb5a46"), Color::Rgb(0xeb, 0x5a, 0x46));
        assert_eq!(parse_color("red"), Color::Gray);
        assert_eq!(parse_color("#zzzzzz"), Color::Gray);
    }

    #[test]
    fn truncates_with_dots() {
        assert_eq!(truncate_text("Meeting", 10), "Meeting");
        assert_eq!(truncate_text("Team meeting", 8), "Team ...");
        assert_eq!(truncate_text("abc", 0), "");
    }
}

use crate::ui;
use anyhow::{anyhow, bail, Context as _, Result};
use calboard::calendar::{self, CalendarDay};
use calboard::config::Config;
use calboard::filter::FilterMode;
use calboard::holidays::HolidayMap;
use calboard::snapshot::Snapshot;
use calboard::storage::{
    load_snapshot, load_snapshot_or_default, save_snapshot, screenshot_path, write_text,
};
use calboard::{Board, Task, TaskId};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub file: Option<PathBuf>,
    pub month: Option<String>,
    pub config: Option<PathBuf>,
}

/// A board mounted for one month and bound to its snapshot file.
pub struct Session {
    pub config: Config,
    pub path: PathBuf,
    pub month: NaiveDate,
    pub days: Vec<CalendarDay>,
    pub holidays: HolidayMap,
    pub board: Board,
}

impl Session {
    /// `anchor` picks the month when `--month` is absent.
    pub fn open(ctx: &Context, anchor: Option<NaiveDate>) -> Result<Session> {
        let config = Config::load(ctx.config.as_deref())?;
        let path = ctx
            .file
            .clone()
            .unwrap_or_else(|| config.board_file.clone());
        let month = match ctx.month.as_deref() {
            Some(raw) => calendar::parse_month(raw)?,
            None => anchor.unwrap_or_else(|| Local::now().date_naive()),
        };
        let days = calendar::month_grid(month, config.week_start);
        let holidays = match config.holidays_file.as_deref() {
            Some(file) => HolidayMap::load(file)?,
            None => HolidayMap::default(),
        };
        let mut board = Board::from_calendar(&days);
        let snapshot = load_snapshot_or_default(&path)?;
        board.import(snapshot)?;
        Ok(Session {
            config,
            path,
            month,
            days,
            holidays,
            board,
        })
    }

    pub fn save(&self) -> Result<()> {
        save_snapshot(&self.path, &self.board.export())
    }

    /// Re-imports the snapshot file. On failure the board is left as it was.
    pub fn reload(&mut self) -> Result<()> {
        let snapshot = load_snapshot(&self.path)?;
        self.board.import(snapshot)?;
        Ok(())
    }

    pub fn month_title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}

pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let config = Config::load(ctx.config.as_deref())?;
    let path = ctx.file.clone().unwrap_or(config.board_file);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_snapshot(&path, &Snapshot::default())?;
    println!("Initialized board at {}", path.display());
    Ok(())
}

pub fn days(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx, None)?;
    for day in &session.days {
        match session.holidays.name_for(&day.date) {
            Some(name) => println!("{} {} {}  {}", day.day_name, day.day, day.date, name),
            None => println!("{} {} {}", day.day_name, day.day, day.date),
        }
    }
    Ok(())
}

pub fn show(ctx: &Context, search: Option<String>, label: Option<u64>) -> Result<()> {
    let mut session = Session::open(ctx, None)?;
    if let Some(text) = search.as_deref() {
        session.board.set_search_text(text);
    }
    if let Some(id) = label {
        if !session.board.labels().contains(id) {
            bail!("label {} not found", id);
        }
        session.board.select_label(Some(id));
    }
    println!("Board: {} ({})", session.path.display(), session.month_title());
    if session.board.is_filtering() {
        println!("Filter: {}", describe_filter(&session.board));
    }
    for day in &session.days {
        let tasks = session.board.project(&day.date);
        let holiday = session
            .holidays
            .name_for(&day.date)
            .map(|h| format!("  [{}]", h))
            .unwrap_or_default();
        println!("{} {}{}", day.date, day.day_name, holiday);
        for task in tasks.iter() {
            print_task(task);
        }
    }
    Ok(())
}

pub fn add(ctx: &Context, date: String, text: String) -> Result<()> {
    let day = calendar::parse_day(&date)?;
    let mut session = Session::open(ctx, Some(day))?;
    let id = session
        .board
        .create_empty_task(&date)
        .with_context(|| format!("adding task to {}", date))?;
    session.board.commit_task(id, &date, &text, false)?;
    session.save()?;
    info!(day = %date, task = id, "task added");
    println!("Added task {} to {}", id, date);
    Ok(())
}

pub fn edit(ctx: &Context, date: String, task_id: TaskId, text: String) -> Result<()> {
    let day = calendar::parse_day(&date)?;
    let mut session = Session::open(ctx, Some(day))?;
    session
        .board
        .commit_task(task_id, &date, &text, false)
        .with_context(|| format!("editing task {} on {}", task_id, date))?;
    session.save()?;
    println!("Updated task {}", task_id);
    Ok(())
}

pub fn move_task(ctx: &Context, from: String, task_id: TaskId, to: String) -> Result<()> {
    let from_day = calendar::parse_day(&from)?;
    calendar::parse_day(&to)?;
    let mut session = Session::open(ctx, Some(from_day))?;
    if !session.board.store().contains_day(&to) {
        warn!(day = %to, month = %session.month_title(), "destination outside mounted month");
    }
    session
        .board
        .move_task(&from, task_id, &to)
        .with_context(|| format!("moving task {} from {} to {}", task_id, from, to))?;
    session.save()?;
    println!("Moved task {} from {} to {}", task_id, from, to);
    Ok(())
}

pub fn reorder(ctx: &Context, date: String, drag_id: TaskId, hover_id: TaskId) -> Result<()> {
    let day = calendar::parse_day(&date)?;
    let mut session = Session::open(ctx, Some(day))?;
    let order_of = |id: TaskId| {
        session
            .board
            .task(&date, id)
            .map(|t| t.order)
            .ok_or_else(|| anyhow!("task {} not found on {}", id, date))
    };
    let drag_order = order_of(drag_id)?;
    let hover_order = order_of(hover_id)?;
    session
        .board
        .reorder_task(Some(drag_order), hover_order, drag_id, hover_id, &date)
        .with_context(|| format!("reordering tasks on {}", date))?;
    session.save()?;
    println!("Swapped task {} with task {}", drag_id, hover_id);
    Ok(())
}

pub fn label_list(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx, None)?;
    if session.board.labels().is_empty() {
        println!("(no labels)");
    }
    for label in session.board.labels().iter() {
        println!("{:>3}  {:<8} {}", label.id, label.color, label.text);
    }
    Ok(())
}

pub fn label_create(
    ctx: &Context,
    text: String,
    color: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let target = to.as_deref().map(parse_task_ref).transpose()?;
    let anchor = match &target {
        Some((date, _)) => Some(calendar::parse_day(date)?),
        None => None,
    };
    let mut session = Session::open(ctx, anchor)?;
    let color = color.unwrap_or_else(|| session.config.random_label_color());
    let id = match &target {
        Some((date, task_id)) => session
            .board
            .create_label_for_task(date, *task_id, &color, &text)
            .with_context(|| format!("labelling task {} on {}", task_id, date))?,
        None => session.board.create_label(&color, &text)?,
    };
    session.save()?;
    println!("Created label {} ({} {})", id, color, text);
    Ok(())
}

pub fn label_attach(ctx: &Context, date: String, task_id: TaskId, label_id: u64) -> Result<()> {
    let day = calendar::parse_day(&date)?;
    let mut session = Session::open(ctx, Some(day))?;
    let already = session
        .board
        .task(&date, task_id)
        .map(|t| t.has_label(label_id))
        .unwrap_or(false);
    if already {
        bail!("task {} already carries label {}", task_id, label_id);
    }
    session
        .board
        .attach_existing_label(&date, task_id, label_id)
        .with_context(|| format!("attaching label {} to task {}", label_id, task_id))?;
    session.save()?;
    println!("Attached label {} to task {}", label_id, task_id);
    Ok(())
}

pub fn export(ctx: &Context, out: PathBuf) -> Result<()> {
    let session = Session::open(ctx, None)?;
    save_snapshot(&out, &session.board.export())?;
    println!("Exported board to {}", out.display());
    Ok(())
}

pub fn import(ctx: &Context, input: PathBuf) -> Result<()> {
    let mut session = Session::open(ctx, None)?;
    let snapshot = load_snapshot(&input)?;
    session.board.import(snapshot)?;
    session.save()?;
    println!(
        "Imported {} into {}",
        input.display(),
        session.path.display()
    );
    Ok(())
}

pub fn screenshot(ctx: &Context, out: Option<PathBuf>, width: u16, height: u16) -> Result<()> {
    let session = Session::open(ctx, None)?;
    let text = ui::render_text(&session, width, height)?;
    let path =
        out.unwrap_or_else(|| screenshot_path(&session.config.screenshot_dir, Local::now()));
    write_text(&path, &text)?;
    println!("Saved screenshot to {}", path.display());
    Ok(())
}

pub fn tui(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx, None)?;
    ui::run(session)
}

pub fn describe_filter(board: &Board) -> String {
    match board.filter_mode() {
        FilterMode::Idle => "none".to_string(),
        FilterMode::TextSearch(query) => format!("text \"{}\"", query),
        FilterMode::LabelFilter(id) => match board.labels().get(*id) {
            Some(label) => format!("label {} ({})", id, label.text),
            None => format!("label {}", id),
        },
    }
}

fn parse_task_ref(raw: &str) -> Result<(String, TaskId)> {
    let (date, id) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected DATE:TASK_ID, got {}", raw))?;
    let id = id
        .parse::<TaskId>()
        .map_err(|_| anyhow!("invalid task id in {}", raw))?;
    Ok((date.to_string(), id))
}

fn print_task(task: &Task) {
    let marker = if task.is_editable { " (editing)" } else { "" };
    println!("  - {}: {}{}", task.id, task.text, marker);
    if !task.labels.is_empty() {
        let labels: Vec<String> = task
            .labels
            .iter()
            .map(|l| format!("{} {}", l.text, l.color))
            .collect();
        println!("    labels: {}", labels.join(", "));
    }
}

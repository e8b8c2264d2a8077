use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calboard", version, about = "Month calendar task board")]
pub struct Cli {
    /// Board snapshot file (defaults to board_file from the config)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Month to mount, YYYY-MM (defaults to the month of the given date, or today)
    #[arg(long, global = true)]
    pub month: Option<String>,
    /// Config file to use instead of the per-user one
    #[arg(long, global = true, env = "CALBOARD_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write an empty board file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the days of the month grid
    Days,
    /// Print the tasks of every day in the month
    Show {
        /// Only tasks whose text starts with this (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Only tasks carrying this label id
        #[arg(long)]
        label: Option<u64>,
    },
    /// Add a task to a day
    Add {
        /// Day in YYYY-MM-DD format
        date: String,
        /// Task text
        text: String,
    },
    /// Replace the text of a task
    Edit {
        /// Day the task is on
        date: String,
        /// Task id
        task_id: u64,
        /// New text (empty stores the placeholder)
        text: String,
    },
    /// Move a task to another day
    Move {
        /// Day the task is on
        from: String,
        /// Task id
        task_id: u64,
        /// Destination day
        to: String,
    },
    /// Swap the ranks of two tasks on the same day
    Reorder {
        /// Day both tasks are on
        date: String,
        /// Task being dragged
        drag_id: u64,
        /// Task it is dropped onto
        hover_id: u64,
    },
    /// Manage labels
    Label {
        #[command(subcommand)]
        command: LabelCommand,
    },
    /// Copy the board to another snapshot file
    Export {
        /// Destination file
        out: PathBuf,
    },
    /// Replace the board with a snapshot file
    Import {
        /// Source file
        input: PathBuf,
    },
    /// Render the month grid to a text file
    Screenshot {
        /// Output file (defaults to calendar-<timestamp>.txt in screenshot_dir)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 160)]
        width: u16,
        #[arg(long, default_value_t = 48)]
        height: u16,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// List defined labels
    List,
    /// Define a label
    Create {
        /// Label text
        text: String,
        /// Colour, e.g. #eb5a46 (random palette colour when omitted)
        #[arg(long)]
        color: Option<String>,
        /// Also attach the new label to DATE:TASK_ID
        #[arg(long, value_name = "DATE:TASK_ID")]
        to: Option<String>,
    },
    /// Attach an existing label to a task
    Attach {
        /// Day the task is on
        date: String,
        /// Task id
        task_id: u64,
        /// Label id
        label_id: u64,
    },
}

mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);
    let ctx = commands::Context {
        file: args.file,
        month: args.month,
        config: args.config,
    };
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init { force } => commands::init(&ctx, force),
        cli::Command::Days => commands::days(&ctx),
        cli::Command::Show { search, label } => commands::show(&ctx, search, label),
        cli::Command::Add { date, text } => commands::add(&ctx, date, text),
        cli::Command::Edit {
            date,
            task_id,
            text,
        } => commands::edit(&ctx, date, task_id, text),
        cli::Command::Move { from, task_id, to } => commands::move_task(&ctx, from, task_id, to),
        cli::Command::Reorder {
            date,
            drag_id,
            hover_id,
        } => commands::reorder(&ctx, date, drag_id, hover_id),
        cli::Command::Label { command } => match command {
            cli::LabelCommand::List => commands::label_list(&ctx),
            cli::LabelCommand::Create { text, color, to } => {
                commands::label_create(&ctx, text, color, to)
            }
            cli::LabelCommand::Attach {
                date,
                task_id,
                label_id,
            } => commands::label_attach(&ctx, date, task_id, label_id),
        },
        cli::Command::Export { out } => commands::export(&ctx, out),
        cli::Command::Import { input } => commands::import(&ctx, input),
        cli::Command::Screenshot { out, width, height } => {
            commands::screenshot(&ctx, out, width, height)
        }
        cli::Command::Tui => commands::tui(&ctx),
    }
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level from off. Logs go to
/// stderr so command output stays clean.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

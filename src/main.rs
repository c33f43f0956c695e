use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod model;
mod sample;
mod ui;

use controller::Controller;
use datatable::domain::{DTConfig, DTError, Message};
use datatable::loader;
use model::{Model, Status};
use ui::TableUI;

/// A sortable, selectable terminal data table.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to show (csv, parquet or arrow). Shows sample users when omitted.
    file: Option<String>,

    /// Hide the checkbox column.
    #[arg(long)]
    no_select: bool,

    /// Upper bound of a column's rendered width.
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Milliseconds to wait for input before redrawing.
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Write logs to this file. Filter with RUST_LOG.
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand_path(path: &str) -> Result<PathBuf, DTError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| DTError::LoadingFailed(e.to_string()))
}

fn init_logging(log_file: Option<&str>) -> Result<(), DTError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(expand_path(path)?)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), DTError> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let cfg = DTConfig {
        event_poll_time: args.event_poll_time,
        max_column_width: args.max_column_width,
        selectable: !args.no_select,
    };
    info!("Starting with {cfg:?}");

    // Load before taking over the terminal so errors print normally.
    let (name, columns, rows) = match args.file.as_deref() {
        Some(file) => {
            let loaded = loader::load_data_file(&expand_path(file)?)?;
            let columns = loaded.column_descriptors();
            (loaded.name, columns, loaded.rows)
        }
        None => {
            let users = sample::users();
            let columns = sample::user_columns(&users);
            (users.name, columns, users.rows)
        }
    };

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = event_loop(&mut terminal, &cfg, Model::init(&cfg, name, columns, rows, 0));
    execute!(stdout(), DisableMouseCapture)?;
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, cfg: &DTConfig, mut model: Model) -> Result<(), DTError> {
    let size = terminal.size()?;
    model.update(Some(Message::Resize(size.width, size.height)))?;
    let ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&mut model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event()?;
        model.update(message)?;
    }
    Ok(())
}

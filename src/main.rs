use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use org_navigator::api::{HttpOrgUnitApi, OrgUnitApi};
use org_navigator::app::App;
use org_navigator::async_task::{self, Task, TaskResult};
use org_navigator::cli::{Cli, Commands};
use org_navigator::config::Config;
use org_navigator::error::Result;
use org_navigator::move_target::CandidateOptions;
use org_navigator::screenshot::{self, ScreenshotOptions};
use org_navigator::{event, main_lib, ui};

const LOG_ENV: &str = "ORG_NAVIGATOR_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);
    let interactive = matches!(command, Commands::Run);
    init_logging(cli.verbose && !interactive)?;

    let config = Config::load(cli.config.as_deref())?.with_api_url(cli.api_url);

    match command {
        Commands::Run => run_interactive(config).await,
        Commands::Dump {
            snapshot,
            query,
            show_inactive,
            output,
        } => {
            let snapshot = main_lib::load_snapshot_file(&snapshot)?;
            let text = main_lib::render_tree_text(snapshot, &query, show_inactive)?;
            main_lib::write_output(&text, output.as_deref())
        }
        Commands::Candidates {
            snapshot,
            node,
            filter,
            include_inactive,
        } => {
            let snapshot = main_lib::load_snapshot_file(&snapshot)?;
            let options = CandidateOptions {
                include_inactive,
                filter: filter.unwrap_or_default(),
            };
            let text = main_lib::render_candidates_text(snapshot, &node, &options);
            main_lib::write_output(&text, None)
        }
        Commands::Screenshot {
            snapshot,
            output,
            width,
            height,
            query,
            select,
        } => {
            let options = ScreenshotOptions {
                width,
                height,
                query,
                select,
            };
            screenshot::generate_screenshot(&config, &snapshot, output.as_deref(), &options)
        }
    }
}

/// Log to the file named by `ORG_NAVIGATOR_LOG`, or to stderr when verbose.
/// Stderr is never used while the TUI owns the terminal.
fn init_logging(verbose: bool) -> Result<()> {
    if let Ok(log_file) = std::env::var(LOG_ENV) {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(log::LevelFilter::Debug)
            .init();
        log::info!("Org navigator starting up");
    } else if verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }
    Ok(())
}

async fn run_interactive(config: Config) -> Result<()> {
    let api: Arc<dyn OrgUnitApi> = Arc::new(HttpOrgUnitApi::new(&config.api)?);
    let mut app = App::new(&config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup async task channels
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(32);

    let alive = CancellationToken::new();
    let worker_handle = tokio::spawn(async_task::run_worker(
        task_receiver,
        result_sender,
        api,
        alive.clone(),
    ));

    log::info!("Loading org units from {}", config.api.base_url);
    let initial = app.request_reload();
    event::send_task(&mut app, &task_sender, initial);

    let outcome = run_loop(&mut terminal, &mut app, &task_sender, &mut result_receiver);

    // late results are dropped once the token is cancelled
    alive.cancel();
    drop(task_sender);
    if let Err(e) = worker_handle.await {
        log::warn!("Worker ended abnormally: {}", e);
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
    result_receiver: &mut mpsc::Receiver<TaskResult>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        // Handle forced screen redraw
        if app.ui.force_redraw {
            terminal.clear()?;
            app.ui.force_redraw = false;
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if crossterm::event::poll(tick_rate)? {
            let event = crossterm::event::read()?;
            if let Err(e) = event::handle_event(event, app, task_sender) {
                app.ui.status_message = e.user_message();
            }
        }

        while let Ok(result) = result_receiver.try_recv() {
            if let Some(follow_up) = main_lib::handle_task_result(app, result) {
                event::send_task(app, task_sender, follow_up);
            }
        }

        if app.should_quit {
            log::info!("Quitting");
            return Ok(());
        }
    }
}

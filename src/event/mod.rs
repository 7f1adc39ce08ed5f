use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::App;
use crate::async_task::Task;
use crate::error::Result;

pub mod modal;
pub mod navigator;

pub use modal::*;
pub use navigator::*;

/// `Ok(true)` when the UI needs a redraw
pub type EventResult = Result<bool>;

pub fn handle_event(
    event: Event,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, app, task_sender),
        Event::Resize(_, _) => Ok(true),
        _ => Ok(false),
    }
}

fn handle_key(key: KeyEvent, app: &mut App, task_sender: &mpsc::Sender<Task>) -> EventResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return Ok(false);
            }
            KeyCode::Char('l') => {
                app.ui.force_redraw = true;
                app.ui.status_message = "Screen refreshed".to_string();
                return Ok(true);
            }
            _ => {}
        }
    }

    if app.modal.is_some() {
        return handle_modal_event(key, app, task_sender);
    }

    if key.code == KeyCode::Char('q') && !app.navigator.is_searching() {
        app.should_quit = true;
        return Ok(false);
    }

    handle_navigator_event(key, app, task_sender)
}

/// Queue a task for the worker without blocking the UI loop
pub fn send_task(app: &mut App, task_sender: &mpsc::Sender<Task>, task: Task) {
    log::debug!("Queueing {:?}", task);
    if let Err(e) = task_sender.try_send(task) {
        log::error!("Failed to queue task: {}", e);
        let message = format!("Could not send request: {}", e);
        app.ui.is_loading = false;
        match app.modal.as_mut() {
            Some(modal) if modal.locked => {
                modal.locked = false;
                modal.error = Some(message);
            }
            _ => app.ui.status_message = message,
        }
    }
}

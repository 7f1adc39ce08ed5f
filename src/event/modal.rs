use crate::app::{AddField, App, ModalKind};
use crate::async_task::Task;
use crate::event::{send_task, EventResult};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

pub fn handle_modal_event(
    key: KeyEvent,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    if app.is_modal_locked() {
        log::debug!("Modal locked, ignoring {:?}", key.code);
        return Ok(false);
    }

    if key.code == KeyCode::Esc {
        return Ok(app.close_modal());
    }

    let choice_count = app.move_choices().len();
    let Some(modal) = app.modal.as_mut() else {
        return Ok(false);
    };

    let mut submit = false;
    match &mut modal.kind {
        ModalKind::Rename { input } => match key.code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => submit = true,
            _ => return Ok(false),
        },

        ModalKind::Move {
            filter,
            include_inactive,
            cursor,
        } => match key.code {
            KeyCode::Up => *cursor = cursor.saturating_sub(1),
            KeyCode::Down => *cursor = (*cursor + 1).min(choice_count.saturating_sub(1)),
            KeyCode::Tab => {
                *include_inactive = !*include_inactive;
                *cursor = 0;
            }
            KeyCode::Char(c) => {
                filter.push(c);
                *cursor = 0;
            }
            KeyCode::Backspace => {
                filter.pop();
                *cursor = 0;
            }
            KeyCode::Enter => submit = true,
            _ => return Ok(false),
        },

        ModalKind::AddChild { name, code, field } => match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                let next = match field {
                    AddField::Name => AddField::Code,
                    AddField::Code => AddField::Name,
                };
                *field = next;
            }
            KeyCode::Char(c) => match field {
                AddField::Name => name.push(c),
                AddField::Code => code.push(c),
            },
            KeyCode::Backspace => {
                match field {
                    AddField::Name => name.pop(),
                    AddField::Code => code.pop(),
                };
            }
            KeyCode::Enter => submit = true,
            _ => return Ok(false),
        },

        ModalKind::ConfirmStatus { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => submit = true,
            KeyCode::Char('n') | KeyCode::Char('N') => return Ok(app.close_modal()),
            _ => return Ok(false),
        },
    }

    // any edit clears a stale error
    if !submit {
        modal.error = None;
        return Ok(true);
    }

    if let Some(task) = app.submit_modal() {
        send_task(app, task_sender, task);
    }
    Ok(true)
}

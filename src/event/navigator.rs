use crate::actions::NodeAction;
use crate::app::App;
use crate::async_task::Task;
use crate::event::{send_task, EventResult};
use crate::navigator::NavigatorEvent;
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

pub fn handle_navigator_event(
    key: KeyEvent,
    app: &mut App,
    task_sender: &mpsc::Sender<Task>,
) -> EventResult {
    // Handle search mode first; arrows still move through the filtered rows
    if app.navigator.is_searching() {
        match key.code {
            KeyCode::Esc => {
                app.navigator.handle_event(NavigatorEvent::EndSearch)?;
                return Ok(true);
            }
            KeyCode::Enter => {
                app.navigator
                    .handle_event(NavigatorEvent::EndSearchKeepQuery)?;
                return Ok(true);
            }
            KeyCode::Char(c) => {
                let mut query = app.navigator.query().to_string();
                query.push(c);
                app.navigator
                    .handle_event(NavigatorEvent::UpdateSearchQuery(query))?;
                return Ok(true);
            }
            KeyCode::Backspace => {
                let mut query = app.navigator.query().to_string();
                query.pop();
                app.navigator
                    .handle_event(NavigatorEvent::UpdateSearchQuery(query))?;
                return Ok(true);
            }
            KeyCode::Up | KeyCode::Down => {}
            _ => return Ok(false),
        }
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.navigator.handle_event(NavigatorEvent::NavigateUp)?;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.navigator.handle_event(NavigatorEvent::NavigateDown)?;
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.navigator.handle_event(NavigatorEvent::NavigateFirst)?;
        }
        KeyCode::End | KeyCode::Char('G') => {
            app.navigator.handle_event(NavigatorEvent::NavigateLast)?;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            app.navigator
                .handle_event(NavigatorEvent::CollapseSelected)?;
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.navigator.handle_event(NavigatorEvent::ExpandSelected)?;
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(selection) = app.navigator.selection().cloned() {
                app.navigator
                    .handle_event(NavigatorEvent::ToggleExpanded(selection))?;
            }
        }
        KeyCode::Char('/') => {
            app.navigator.handle_event(NavigatorEvent::StartSearch)?;
        }
        KeyCode::Esc => {
            if app.navigator.query().is_empty() {
                return Ok(false);
            }
            app.navigator.handle_event(NavigatorEvent::EndSearch)?;
        }
        KeyCode::Char('i') => {
            app.navigator
                .handle_event(NavigatorEvent::ToggleShowInactive)?;
            app.ui.status_message = if app.navigator.show_inactive() {
                "Showing inactive units".to_string()
            } else {
                "Hiding inactive units".to_string()
            };
        }
        KeyCode::Char('c') => {
            app.navigator.handle_event(NavigatorEvent::CollapseAll)?;
        }
        KeyCode::Char('r') => {
            app.open_action_for_selection(NodeAction::Rename);
        }
        KeyCode::Char('m') => {
            app.open_action_for_selection(NodeAction::Move);
        }
        KeyCode::Char('a') => {
            app.open_action_for_selection(NodeAction::AddChild);
        }
        KeyCode::Char('d') => {
            let action = match app.navigator.selection() {
                Some(id) if app.navigator.is_inactive(id.as_str()) => NodeAction::Activate,
                _ => NodeAction::Deactivate,
            };
            app.open_action_for_selection(action);
        }
        KeyCode::Char('R') | KeyCode::F(5) => {
            let task = app.request_reload();
            app.ui.status_message = "Refreshing...".to_string();
            send_task(app, task_sender, task);
        }
        _ => return Ok(false),
    }

    Ok(true)
}

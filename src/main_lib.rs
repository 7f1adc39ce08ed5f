// Library module containing testable functions from main.rs

use crate::api::{parse_tree_body, TreeSnapshot};
use crate::app::App;
use crate::async_task::{Task, TaskResult};
use crate::error::Result;
use crate::move_target::CandidateOptions;
use crate::navigator::{NavigatorEvent, NavigatorState};
use std::fs;
use std::path::Path;

/// Apply a worker result to the app. Returns a follow-up task, if any.
pub fn handle_task_result(app: &mut App, result: TaskResult) -> Option<Task> {
    match result {
        TaskResult::TreeLoaded {
            generation,
            snapshot,
        } => {
            if generation != app.fetch_generation() {
                log::debug!(
                    "Discarding stale tree #{} (latest #{})",
                    generation,
                    app.fetch_generation()
                );
                return None;
            }
            app.ui.is_loading = false;
            app.ui.last_error = None;
            app.navigator.load_snapshot(snapshot);
            app.ui.status_message = format!("Loaded {} units", app.navigator.index().len());
            None
        }
        TaskResult::TreeLoadFailed {
            generation,
            message,
        } => {
            if generation != app.fetch_generation() {
                return None;
            }
            app.ui.is_loading = false;
            app.ui.status_message = format!("Failed to load org units: {}", message);
            app.ui.last_error = Some(message);
            None
        }
        TaskResult::MutationApplied { mutation } => {
            app.modal = None;
            app.ui.status_message = mutation.describe();
            // the tree is never patched locally
            Some(app.request_reload())
        }
        TaskResult::MutationFailed { mutation, message } => {
            match app.modal.as_mut() {
                Some(modal) if modal.locked => {
                    modal.locked = false;
                    modal.error = Some(message);
                    app.ui.status_message = "Request failed".to_string();
                }
                _ => {
                    app.ui.status_message = format!("{}: {}", mutation.describe(), message);
                }
            }
            None
        }
    }
}

pub fn load_snapshot_file(path: &Path) -> Result<TreeSnapshot> {
    let body = fs::read_to_string(path)?;
    parse_tree_body(&body)
}

/// Indented text rendering of the filtered, sorted tree, every node expanded
pub fn render_tree_text(snapshot: TreeSnapshot, query: &str, show_inactive: bool) -> Result<String> {
    let mut navigator = NavigatorState::with_snapshot(snapshot, show_inactive);
    expand_everything(&mut navigator)?;
    if !query.trim().is_empty() {
        navigator.handle_event(NavigatorEvent::StartSearch)?;
        navigator.handle_event(NavigatorEvent::UpdateSearchQuery(query.to_string()))?;
    }

    let mut output = String::new();
    for item in navigator.visible_items() {
        output.push_str(&"  ".repeat(item.depth));
        output.push_str(item.kind.icon());
        output.push(' ');
        output.push_str(&item.title);
        output.push_str(&format!(" [{}]", item.id));
        if item.is_inactive {
            output.push_str(" (inactive)");
        }
        if item.is_match {
            output.push_str(" *");
        }
        output.push('\n');
    }
    Ok(output)
}

fn expand_everything(navigator: &mut NavigatorState) -> Result<()> {
    let parents: Vec<_> = navigator
        .index()
        .preorder()
        .into_iter()
        .filter(|id| !navigator.index().children_of(id.as_str()).is_empty())
        .collect();
    for id in parents {
        if !navigator.is_expanded(id.as_str()) {
            navigator.handle_event(NavigatorEvent::ToggleExpanded(id))?;
        }
    }
    Ok(())
}

/// One line per eligible parent, "no parent" first
pub fn render_candidates_text(
    snapshot: TreeSnapshot,
    node_id: &str,
    options: &CandidateOptions,
) -> String {
    let navigator = NavigatorState::with_snapshot(snapshot, true);
    let mut output = String::from("(no parent)\n");
    for candidate in navigator.move_candidates(node_id, options) {
        output.push_str(&format!("{}\t{}\n", candidate.id, candidate.title));
    }
    output
}

pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Saved to: {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

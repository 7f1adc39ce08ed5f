use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::actions::NodeAction;
use crate::app::{AddField, App, Modal, ModalKind};
use crate::highlight::{highlight_segments, scroll_offset_for};
use crate::filter::Matcher;
use crate::navigator::VisibleItem;
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let tree_width = app.layout.tree_percentage();
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(tree_width),
            Constraint::Percentage(100 - tree_width),
        ])
        .split(outer[0]);

    draw_tree(frame, app, panes[0]);
    draw_details(frame, app, panes[1]);
    draw_status_bar(frame, app, outer[1]);

    let area = frame.area();
    if let Some(modal) = &app.modal {
        draw_modal(frame, app, modal, area);
    }
}

fn draw_tree(frame: &mut Frame, app: &mut App, area: Rect) {
    let view_model = app.navigator.build_view_model();
    let viewport_height = area.height.saturating_sub(2) as usize;
    app.ui.viewport_height = viewport_height;

    // resolve a pending scroll request; targets that are not rendered are dropped
    let mut offset = app
        .ui
        .scroll_offset
        .min(view_model.items.len().saturating_sub(1));
    if let Some(target) = app.navigator.take_scroll_request() {
        if let Some(row) = view_model.items.iter().position(|item| item.id == target) {
            if let Some(new_offset) = scroll_offset_for(row, offset, viewport_height) {
                offset = new_offset;
            }
        }
    }

    let theme = &app.theme;
    let border_style = if app.modal.is_none() {
        Style::default().fg(theme.active_border)
    } else {
        Style::default().fg(theme.inactive_border)
    };

    let title = if view_model.is_searching {
        format!(" Org Units (Search: {}_) ", view_model.search_query)
    } else if !view_model.search_query.is_empty() {
        format!(
            " Org Units (Filter: {}, {} matches) ",
            view_model.search_query, view_model.match_count
        )
    } else {
        " Org Units ".to_string()
    };
    let title = if view_model.show_inactive {
        format!("{}[+inactive] ", title)
    } else {
        title
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if view_model.items.is_empty() {
        let message = if !app.navigator.is_loaded() {
            match &app.ui.last_error {
                Some(error) => format!("Could not load org units: {}", error),
                None => "Loading org units...".to_string(),
            }
        } else if !view_model.search_query.trim().is_empty() {
            format!("No units match \"{}\"", view_model.search_query.trim())
        } else {
            "No org units".to_string()
        };
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(theme.text_muted));
        frame.render_widget(paragraph, area);
        app.ui.scroll_offset = 0;
        return;
    }

    let matcher = app.navigator.matcher();
    let items: Vec<ListItem> = view_model
        .items
        .iter()
        .map(|item| ListItem::new(tree_row(item, matcher.as_ref(), theme)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selected_style())
        .highlight_symbol("");

    let mut list_state = ListState::default()
        .with_offset(offset)
        .with_selected(view_model.selected_index);
    frame.render_stateful_widget(list, area, &mut list_state);
    app.ui.scroll_offset = list_state.offset();
}

fn tree_row<'a>(item: &'a VisibleItem, matcher: Option<&Matcher>, theme: &Theme) -> Line<'a> {
    let expander = match (item.has_children, item.is_expanded) {
        (true, true) => "▼ ",
        (true, false) => "▶ ",
        (false, _) => "  ",
    };

    let base = if item.is_inactive {
        Style::default()
            .fg(theme.node_inactive)
            .add_modifier(Modifier::ITALIC)
    } else {
        theme.kind_style(item.kind)
    };

    let mut spans = vec![
        Span::raw("  ".repeat(item.depth)),
        Span::styled(expander, Style::default().fg(theme.expander)),
        Span::styled(format!("{} ", item.kind.icon()), base),
    ];
    spans.extend(
        highlight_segments(&item.title, matcher).into_iter().map(|segment| {
            if segment.matched {
                Span::styled(segment.text, theme.match_style())
            } else {
                Span::styled(segment.text, base)
            }
        }),
    );
    if item.is_inactive {
        spans.push(Span::styled(" (inactive)", Style::default().fg(theme.node_inactive)));
    }
    Line::from(spans)
}

fn action_key(action: NodeAction) -> &'static str {
    match action {
        NodeAction::AddChild => "a",
        NodeAction::Rename => "r",
        NodeAction::Move => "m",
        NodeAction::Deactivate | NodeAction::Activate => "d",
    }
}

fn draw_details(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive_border));

    let Some(record) = app.navigator.selected_record() else {
        let paragraph = Paragraph::new("Select a unit to see its details")
            .block(block)
            .style(Style::default().fg(theme.text_muted));
        frame.render_widget(paragraph, area);
        return;
    };

    let id = record.id.as_str();
    let index = app.navigator.index();
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.detail_label));
    let status = if app.navigator.is_inactive(id) {
        Span::styled("Inactive", Style::default().fg(theme.node_inactive))
    } else {
        Span::styled("Active", Style::default().fg(theme.detail_value))
    };

    let mut lines = vec![
        Line::from(vec![
            label("Title:    "),
            Span::styled(record.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            label("ID:       "),
            Span::styled(id, Style::default().fg(theme.detail_id)),
        ]),
        Line::from(vec![label("Kind:     "), Span::raw(record.kind.label())]),
        Line::from(vec![label("Status:   "), status]),
        Line::from(vec![
            label("Path:     "),
            Span::raw(index.title_path(id).join(" › ")),
        ]),
        Line::from(vec![
            label("Children: "),
            Span::raw(index.children_of(id).len().to_string()),
        ]),
        Line::from(""),
    ];

    let actions = app.available_actions();
    if actions.is_empty() {
        lines.push(Line::from(Span::styled(
            "No actions available",
            Style::default().fg(theme.text_muted),
        )));
    } else {
        let mut spans = vec![label("Actions:  ")];
        for action in actions {
            spans.push(Span::styled(
                format!("[{}]", action_key(action)),
                Style::default().fg(theme.active_border),
            ));
            spans.push(Span::raw(format!(" {}  ", action.label())));
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let status_text = if app.ui.is_loading {
        format!("Loading... | {}", app.ui.status_message)
    } else {
        app.ui.status_message.clone()
    };

    let mut meta = Vec::new();
    if app.navigator.is_loaded() {
        let count = app
            .navigator
            .total()
            .unwrap_or(app.navigator.index().len() as u64);
        meta.push(format!("{} units", count));
    }
    if let Some(version) = app.navigator.version() {
        match version.as_str() {
            Some(text) => meta.push(format!("v{}", text)),
            None => meta.push(format!("v{}", version)),
        }
    }

    let help_text = if app.modal.is_some() {
        "Enter: Confirm | Esc: Cancel"
    } else if app.navigator.is_searching() {
        "Type to filter | Enter: Keep | Esc: Clear"
    } else {
        "/: Search | ↑↓: Navigate | →←: Expand/Collapse | i: Inactive | r m a d: Actions | R: Refresh | q: Quit"
    };

    let status_style = if app.ui.last_error.is_some() {
        Style::default().fg(theme.status_error)
    } else {
        Style::default().fg(theme.status_bar_fg)
    };

    let mut spans = vec![Span::styled(status_text, status_style)];
    if !meta.is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(meta.join(" "), Style::default().fg(theme.status_bar_fg)));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, Style::default().fg(theme.status_help_text)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.status_bar_bg));
    frame.render_widget(paragraph, area);
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn draw_modal(frame: &mut Frame, app: &App, modal: &Modal, area: Rect) {
    let theme = &app.theme;
    let node_title = app
        .navigator
        .index()
        .title(modal.node_id.as_str())
        .unwrap_or(modal.node_id.as_str());
    let height = match modal.kind {
        ModalKind::Move { .. } => 18,
        _ => 9,
    };
    let popup = centered_rect(64, height, area);

    let border = if modal.locked {
        theme.modal_locked_border
    } else {
        theme.modal_border
    };
    let block = Block::default()
        .title(format!(" {} ", modal.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let cursor = if modal.locked { "" } else { "_" };
    let mut lines: Vec<Line> = Vec::new();
    match &modal.kind {
        ModalKind::Rename { input } => {
            lines.push(Line::from(format!("Unit: {}", node_title)));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("New name: {}{}", input, cursor)));
        }
        ModalKind::Move {
            filter,
            include_inactive,
            cursor: selected,
        } => {
            lines.push(Line::from(format!("Move \"{}\" under:", node_title)));
            lines.push(Line::from(format!("Filter: {}{}", filter, cursor)));
            lines.push(Line::from(Span::styled(
                format!(
                    "[Tab] inactive targets: {}",
                    if *include_inactive { "shown" } else { "hidden" }
                ),
                Style::default().fg(theme.text_muted),
            )));

            let choices = app.move_choices();
            // rows left after the header and footer
            let window = (height as usize).saturating_sub(7).max(1);
            let start = (*selected + 1).saturating_sub(window);
            for (i, choice) in choices.iter().enumerate().skip(start).take(window) {
                let style = if i == *selected {
                    Style::default()
                        .bg(theme.modal_cursor_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let marker = if i == *selected { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{}{}", marker, choice.label),
                    style,
                )));
            }
            if choices.len() == 1 {
                lines.push(Line::from(Span::styled(
                    "  no other matching units",
                    Style::default().fg(theme.text_muted),
                )));
            }
        }
        ModalKind::AddChild { name, code, field } => {
            lines.push(Line::from(format!("Parent: {}", node_title)));
            lines.push(Line::from(""));
            let marker = |f: AddField| if *field == f { "> " } else { "  " };
            let caret = |f: AddField| if *field == f { cursor } else { "" };
            lines.push(Line::from(format!(
                "{}Name: {}{}",
                marker(AddField::Name),
                name,
                caret(AddField::Name)
            )));
            lines.push(Line::from(format!(
                "{}Code: {}{}",
                marker(AddField::Code),
                code,
                caret(AddField::Code)
            )));
        }
        ModalKind::ConfirmStatus { activate } => {
            let verb = if *activate { "Activate" } else { "Deactivate" };
            lines.push(Line::from(format!("{} \"{}\"?", verb, node_title)));
            lines.push(Line::from(""));
            lines.push(Line::from("[y] Yes   [n] No"));
        }
    }

    lines.push(Line::from(""));
    if modal.locked {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(theme.text_muted),
        )));
    } else if let Some(error) = &modal.error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(theme.modal_error),
        )));
    }

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_centers_within_area() {
        let area = Rect::new(0, 0, 80, 24);
        let r = centered_rect(40, 10, area);
        assert_eq!(r, Rect::new(20, 7, 40, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        let r = centered_rect(40, 20, area);
        assert_eq!(r.width, 20);
        assert_eq!(r.height, 10);
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(action_key(NodeAction::Activate), "d");
        assert_eq!(action_key(NodeAction::Move), "m");
    }
}

use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::path::Path;

use crate::api::TreeSnapshot;
use crate::app::App;
use crate::config::Config;
use crate::error::Result;
use crate::main_lib::{load_snapshot_file, write_output};
use crate::navigator::NavigatorEvent;
use crate::tree::NodeId;
use crate::ui;

/// What to set up before rendering a single frame
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    pub width: u16,
    pub height: u16,
    pub query: Option<String>,
    pub select: Option<String>,
}

pub fn generate_screenshot(
    config: &Config,
    snapshot_path: &Path,
    output_path: Option<&Path>,
    options: &ScreenshotOptions,
) -> Result<()> {
    let snapshot = load_snapshot_file(snapshot_path)?;
    let screenshot = render_snapshot(config, snapshot, options)?;
    write_output(&screenshot, output_path)
}

/// Render the app for a loaded snapshot into plain text
pub fn render_snapshot(
    config: &Config,
    snapshot: TreeSnapshot,
    options: &ScreenshotOptions,
) -> Result<String> {
    let mut app = App::new(config);
    app.navigator.load_snapshot(snapshot);
    app.ui.status_message = format!("Loaded {} units", app.navigator.index().len());

    if let Some(id) = &options.select {
        app.navigator
            .handle_event(NavigatorEvent::Select(NodeId::from(id.as_str())))?;
    }
    if let Some(query) = &options.query {
        app.navigator.handle_event(NavigatorEvent::StartSearch)?;
        app.navigator
            .handle_event(NavigatorEvent::UpdateSearchQuery(query.clone()))?;
        app.navigator
            .handle_event(NavigatorEvent::EndSearchKeepQuery)?;
    }

    render_app(&mut app, options.width, options.height)
}

pub fn render_app(app: &mut App, width: u16, height: u16) -> Result<String> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|frame| ui::draw(frame, app))?;
    Ok(buffer_to_string(terminal.backend().buffer()))
}

pub fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();

    for y in 0..buffer.area().height {
        for x in 0..buffer.area().width {
            let cell = &buffer[(x, y)];
            let sym = cell.symbol();

            // Use a space for empty cells to make output more readable
            if sym.is_empty() {
                result.push(' ');
            } else {
                result.push_str(sym);
            }
        }
        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;

    #[test]
    fn test_buffer_to_string() {
        let backend = TestBackend::new(10, 3);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                use ratatui::{
                    text::Text,
                    widgets::{Block, Borders, Paragraph},
                };

                let paragraph = Paragraph::new(Text::from("Test"))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(paragraph, frame.area());
            })
            .unwrap();

        let result = buffer_to_string(terminal.backend().buffer());
        assert!(result.contains("Test"));
        assert_eq!(result.lines().count(), 3);
    }

    #[test]
    fn test_render_snapshot_with_selection() {
        let snapshot = TreeSnapshot::new(vec![TreeNode::organization("1", "Acme")
            .with_child(TreeNode::department("2", "Finance"))])
        .with_root_id("1");
        let options = ScreenshotOptions {
            width: 100,
            height: 20,
            query: None,
            select: Some("2".into()),
        };

        let screen = render_snapshot(&Config::default(), snapshot, &options).unwrap();
        assert!(screen.contains("Org Units"));
        assert!(screen.contains("Finance"));
        assert!(screen.contains("Acme › Finance"));
    }

    #[test]
    fn test_render_snapshot_rejects_unknown_selection() {
        let snapshot = TreeSnapshot::new(vec![TreeNode::organization("1", "Acme")]);
        let options = ScreenshotOptions {
            width: 80,
            height: 10,
            select: Some("missing".into()),
            ..Default::default()
        };
        assert!(render_snapshot(&Config::default(), snapshot, &options).is_err());
    }
}

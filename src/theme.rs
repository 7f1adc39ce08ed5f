use ratatui::style::{Color, Modifier, Style};

/// Theme data structure containing all colors used in the application
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub active_border: Color,
    pub inactive_border: Color,

    // Tree pane
    pub node_selected_bg: Color,
    pub node_selected_fg: Color,
    pub node_organization: Color,
    pub node_department: Color,
    pub node_unit: Color,
    pub node_inactive: Color,
    pub match_fg: Color,
    pub match_bg: Color,
    pub expander: Color,

    // Detail pane
    pub detail_label: Color,
    pub detail_value: Color,
    pub detail_id: Color,

    // Modals
    pub modal_border: Color,
    pub modal_locked_border: Color,
    pub modal_error: Color,
    pub modal_cursor_bg: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_help_text: Color,
    pub status_error: Color,

    // General UI
    pub text_muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            active_border: Color::Yellow,
            inactive_border: Color::DarkGray,

            node_selected_bg: Color::White,
            node_selected_fg: Color::Black,
            node_organization: Color::Magenta,
            node_department: Color::Blue,
            node_unit: Color::Reset,
            node_inactive: Color::DarkGray,
            match_fg: Color::Black,
            match_bg: Color::Yellow,
            expander: Color::Gray,

            detail_label: Color::Gray,
            detail_value: Color::Reset,
            detail_id: Color::Cyan,

            modal_border: Color::Yellow,
            modal_locked_border: Color::DarkGray,
            modal_error: Color::Red,
            modal_cursor_bg: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_help_text: Color::Gray,
            status_error: Color::LightRed,

            text_muted: Color::Gray,
        }
    }
}

impl Theme {
    pub fn kind_style(&self, kind: crate::tree::NodeKind) -> Style {
        use crate::tree::NodeKind;
        match kind {
            NodeKind::Organization => Style::default()
                .fg(self.node_organization)
                .add_modifier(Modifier::BOLD),
            NodeKind::Department => Style::default()
                .fg(self.node_department)
                .add_modifier(Modifier::BOLD),
            NodeKind::Unit => Style::default().fg(self.node_unit),
        }
    }

    pub fn match_style(&self) -> Style {
        Style::default()
            .fg(self.match_fg)
            .bg(self.match_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.node_selected_fg)
            .bg(self.node_selected_bg)
            .add_modifier(Modifier::BOLD)
    }
}

/// Get the current theme
pub fn get_theme() -> Theme {
    Theme::default()
}

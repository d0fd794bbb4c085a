use ratatui::style::{Color, Modifier, Style};

/// Colors used by the terminal front end.
#[derive(Clone, Debug)]
pub struct Theme {
    pub background: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color of the breadcrumb trail in the status bar
    pub breadcrumb_color: Color,

    /// Color of the `::` drag handle in front of every level
    pub handle_color: Color,

    /// Color of the rule between columns of a row
    pub column_separator_color: Color,

    /// Foreground color for preformatted (fetched) text
    pub preformatted_fg: Color,

    pub link_color: Color,

    /// Foreground color for error reports in the status bar
    pub report_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            breadcrumb_color: Color::LightYellow,
            handle_color: Color::DarkGray,
            column_separator_color: Color::DarkGray,
            preformatted_fg: Color::Cyan,
            link_color: Color::Blue,
            report_fg: Color::LightRed,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn breadcrumb_style(&self) -> Style {
        Style::default().fg(self.breadcrumb_color)
    }

    pub fn handle_style(&self) -> Style {
        Style::default().fg(self.handle_color)
    }

    pub fn column_separator_style(&self) -> Style {
        Style::default().fg(self.column_separator_color)
    }

    pub fn preformatted_style(&self) -> Style {
        Style::default().fg(self.preformatted_fg)
    }

    /// Get the style for links
    pub fn link_style(&self) -> Style {
        Style::default()
            .fg(self.link_color)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn report_style(&self) -> Style {
        Style::default()
            .fg(self.report_fg)
            .bg(self.status_bar_bg)
            .add_modifier(Modifier::BOLD)
    }
}

use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// Asset type tags
    pub tag: Style,
    /// Relation labels
    pub relation: Style,
}

impl Theme {
    /// Colors follow console's detection (TTY, `CLICOLOR`, `CLICOLOR_FORCE`),
    /// and a non-empty `NO_COLOR` always turns them off.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(!no_color && console::colors_enabled())
    }

    pub fn new(colored: bool) -> Self {
        let style = |colored_style: Style| if colored { colored_style } else { Style::new() };
        Self {
            header: style(Style::new().cyan().bold()),
            success: style(Style::new().green().bold()),
            error: style(Style::new().red().bold()),
            warn: style(Style::new().yellow().bold()),
            info: style(Style::new().magenta()),
            dim: style(Style::new().bright_black()),
            tag: style(Style::new().blue().bold()),
            relation: style(Style::new().yellow()),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

use console::Term;
use owo_colors::Style;
use std::sync::OnceLock;

static STDOUT_THEME: OnceLock<Theme> = OnceLock::new();
static STDERR_THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for CLI output.
///
/// Summaries and listings go to stdout, warnings and errors to stderr, and
/// each stream decides on color by itself: `picocms list > pages.txt` stays
/// plain while a failed rebuild is still highlighted on the terminal.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// Unpublished pages in listings
    pub draft: Style,
}

impl Theme {
    /// Colored only when stdout is a terminal and colors aren't disabled (`NO_COLOR`, `CLICOLOR=0`)
    pub fn stdout() -> Self {
        Self::select(Term::stdout().is_term() && console::colors_enabled())
    }

    pub fn stderr() -> Self {
        Self::select(Term::stderr().is_term() && console::colors_enabled_stderr())
    }

    fn select(colored: bool) -> Self {
        if colored { Self::colored() } else { Self::plain() }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            draft: Style::new().yellow().italic(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            draft: Style::new(),
        }
    }
}

/// Theme for stdout
pub fn theme() -> &'static Theme {
    STDOUT_THEME.get_or_init(Theme::stdout)
}

/// Theme for stderr
pub fn err_theme() -> &'static Theme {
    STDERR_THEME.get_or_init(Theme::stderr)
}

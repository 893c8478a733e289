//! Terminal capability detection
//!
//! Detection is a pure function of an [`EnvironmentSnapshot`], so every
//! terminal can be simulated in tests without touching the process
//! environment. Only [`EnvironmentSnapshot::capture`] reads real state.
//!
//! Detects:
//! - Graphics protocol support (Kitty-style image protocol, Sixel)
//! - Color depth (TrueColor, 256)
//! - Terminal size in cells

use std::env;
use std::fmt;

/// Fallback identity when neither `TERM_PROGRAM` nor `TERM` is set
pub const DEFAULT_TERMINAL: &str = "xterm-256color";

/// Identity substrings of terminals speaking the Kitty graphics protocol
const IMAGE_PROTOCOL_TERMINALS: [&str; 3] = ["kitty", "ghostty", "wezterm"];

/// `TERM_PROGRAM` values known to decode Sixel
const SIXEL_PROGRAMS: [&str; 4] = ["mlterm", "foot", "contour", "WezTerm"];

/// The environment signals detection reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    /// `TERM`
    pub term: Option<String>,
    /// `TERM_PROGRAM`
    pub term_program: Option<String>,
    /// `COLORTERM`
    pub colorterm: Option<String>,
    /// `KITTY_WINDOW_ID`, set inside Kitty sessions
    pub kitty_window_id: Option<String>,
    /// Reported columns; non-positive when unknown
    pub columns: i32,
    /// Reported rows; non-positive when unknown
    pub rows: i32,
}

impl EnvironmentSnapshot {
    /// Read the real process environment and terminal size
    pub fn capture() -> Self {
        let (columns, rows) = crossterm::terminal::size()
            .map(|(c, r)| (i32::from(c), i32::from(r)))
            .unwrap_or((0, 0));
        Self {
            term: env::var("TERM").ok(),
            term_program: env::var("TERM_PROGRAM").ok(),
            colorterm: env::var("COLORTERM").ok(),
            kitty_window_id: env::var("KITTY_WINDOW_ID").ok(),
            columns,
            rows,
        }
    }

    #[must_use]
    pub fn with_term(mut self, term: &str) -> Self {
        self.term = Some(term.to_string());
        self
    }

    #[must_use]
    pub fn with_term_program(mut self, program: &str) -> Self {
        self.term_program = Some(program.to_string());
        self
    }

    #[must_use]
    pub fn with_colorterm(mut self, colorterm: &str) -> Self {
        self.colorterm = Some(colorterm.to_string());
        self
    }

    #[must_use]
    pub fn with_kitty_window_id(mut self, id: &str) -> Self {
        self.kitty_window_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_size(mut self, columns: i32, rows: i32) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }
}

/// What the attached terminal supports, fixed for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    /// Terminal name/type
    pub terminal: String,
    pub true_color: bool,
    pub palette_256: bool,
    pub sixel: bool,
    pub image_protocol: bool,
    pub braille: bool,
    /// Terminal columns
    pub columns: u16,
    /// Terminal rows
    pub rows: u16,
}

impl Default for CapabilityDescriptor {
    fn default() -> Self {
        Self {
            terminal: DEFAULT_TERMINAL.to_string(),
            true_color: false,
            palette_256: false,
            sixel: false,
            image_protocol: false,
            braille: true,
            columns: 80,
            rows: 24,
        }
    }
}

impl CapabilityDescriptor {
    /// Detect from the live environment
    pub fn from_env() -> Self {
        detect(&EnvironmentSnapshot::capture())
    }
}

impl fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "yes" } else { "no" };
        writeln!(f, "terminal:       {}", self.terminal)?;
        writeln!(f, "size:           {}x{}", self.columns, self.rows)?;
        writeln!(f, "true color:     {}", flag(self.true_color))?;
        writeln!(f, "256 colors:     {}", flag(self.palette_256))?;
        writeln!(f, "sixel:          {}", flag(self.sixel))?;
        writeln!(f, "image protocol: {}", flag(self.image_protocol))?;
        write!(f, "braille:        {}", flag(self.braille))
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Build the descriptor from an environment snapshot
pub fn detect(env: &EnvironmentSnapshot) -> CapabilityDescriptor {
    let term = non_empty(env.term.as_ref());
    let term_program = non_empty(env.term_program.as_ref());
    let terminal = term_program.or(term).unwrap_or(DEFAULT_TERMINAL).to_string();

    let identity = terminal.to_lowercase();
    let image_protocol = IMAGE_PROTOCOL_TERMINALS
        .iter()
        .any(|name| identity.contains(name))
        || env.kitty_window_id.is_some();

    let sixel = term.is_some_and(|t| t.contains("sixel"))
        || term_program.is_some_and(|p| SIXEL_PROGRAMS.contains(&p));

    let palette_256 = term.is_some_and(|t| t.contains("256color"));

    let true_color = match non_empty(env.colorterm.as_ref()) {
        Some(ct) if ct == "truecolor" || ct == "24bit" => true,
        _ => identity.starts_with("xterm") && palette_256,
    };

    let size = |value: i32, fallback: u16| {
        if value > 0 {
            u16::try_from(value).unwrap_or(u16::MAX)
        } else {
            fallback
        }
    };

    CapabilityDescriptor {
        terminal,
        true_color,
        palette_256,
        sixel,
        image_protocol,
        braille: true,
        columns: size(env.columns, 80),
        rows: size(env.rows, 24),
    }
}

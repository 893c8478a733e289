use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tileterm::ansi::csi;
use tileterm::config::{load_config, load_default_config};
use tileterm::output::stdout_sink;
use tileterm::{
    choose_kind, select_configured, CapabilityDescriptor, Color, Renderer, RendererKind,
    RendererOverride, TerminalTarget, Tile,
};

/// Render a small dungeon scene with the best protocol the terminal supports
#[derive(Parser, Debug)]
#[command(name = "tileterm", version, about)]
struct Cli {
    /// Backend: auto, kitty, sixel, braille, ascii or iterm2 (unknown means auto)
    #[arg(long)]
    renderer: Option<String>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print detected capabilities and the chosen backend, then exit
    #[arg(long)]
    probe: bool,

    /// Number of frames to render
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Log at info level
    #[arg(short, long)]
    verbose: bool,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

const MAP: [&str; 7] = [
    "##############",
    "#............#",
    "#..@.....g...#",
    "#......*.....+",
    "#..$.....<...#",
    "#.......Z....#",
    "##############",
];

/// Sprite id of the demo gradient image
const GRADIENT_ID: u32 = 1;
const GRADIENT_SIZE: (u32, u32) = (64, 32);

fn glyph_color(glyph: char) -> Color {
    match glyph {
        '#' => Color::GRAY,
        '.' => Color::from_hex(0x404040),
        '@' => Color::YELLOW,
        '$' | '*' => Color::from_hex(0xFFD700),
        '+' | '<' => Color::from_hex(0xA0522D),
        _ => Color::RED,
    }
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let t = u8::try_from(x * 255 / width.max(1)).unwrap_or(u8::MAX);
            let u = u8::try_from(y * 255 / height.max(1)).unwrap_or(u8::MAX);
            let c = Color::BLUE.lerp(Color::MAGENTA, t).lerp(Color::CYAN, u / 2);
            rgba.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }
    }
    rgba
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

fn draw_scene(
    renderer: &mut dyn Renderer,
    kind: RendererKind,
    frame: u32,
    gradient_rgb: &[u8],
) -> tileterm::Result<()> {
    renderer.begin_frame()?;
    renderer.clear(Color::BLACK)?;
    for (y, row) in (0..).zip(MAP) {
        for (x, glyph) in (0..).zip(row.chars()) {
            renderer.draw_tile(x, y, &Tile::new(glyph, glyph_color(glyph), Color::BLACK))?;
        }
    }
    let status = format!("renderer: {kind}  frame: {}", frame + 1);
    renderer.draw_text(0, 8, &status, Color::WHITE, Color::BLACK)?;

    if let Some(images) = renderer.as_image_renderer() {
        images.display_image(16, 1, GRADIENT_ID)?;
    } else if let Some(pixels) = renderer.as_pixel_renderer() {
        let (width, height) = GRADIENT_SIZE;
        pixels.draw_rgb(16, 1, gradient_rgb, width, height)?;
    }
    renderer.end_frame()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    // stdout carries the escape stream, so logs go to stderr without color
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting tileterm version {}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config(path),
        None => load_default_config(),
    }
    .context("loading configuration")?;

    let choice = cli
        .renderer
        .as_deref()
        .map_or_else(|| config.renderer_override(), RendererOverride::parse_lenient);
    let caps = CapabilityDescriptor::from_env();

    if cli.probe {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{caps}")?;
        writeln!(stdout, "override:       {choice}")?;
        writeln!(stdout, "renderer:       {}", choose_kind(&caps, choice))?;
        return Ok(());
    }

    let mut selection = select_configured(&caps, choice, &config, stdout_sink());
    let kind = selection.kind;
    let renderer = selection.renderer.as_mut();
    renderer
        .initialize(Arc::new(TerminalTarget::detect()))
        .context("initializing renderer")?;

    let (width, height) = GRADIENT_SIZE;
    let gradient_rgba = gradient(width, height);
    if let Some(images) = renderer.as_image_renderer() {
        images.transmit_image(GRADIENT_ID, &gradient_rgba, width, height)?;
    }
    let gradient_rgb = rgba_to_rgb(&gradient_rgba);

    io::stdout().write_all(csi::HIDE_CURSOR.as_bytes())?;
    let rendered = (0..cli.frames.max(1)).try_for_each(|frame| {
        draw_scene(renderer, kind, frame, &gradient_rgb)
            .with_context(|| format!("rendering frame {frame}"))
    });
    renderer.dispose()?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(csi::SHOW_CURSOR.as_bytes())?;
    stdout.flush()?;
    rendered?;
    tracing::info!(%kind, frames = cli.frames, "done");
    Ok(())
}

//! Output sinks and render targets
//!
//! Backends never write to stdout directly. They are handed a sink (any
//! `Write`) and a [`RenderTarget`] describing the surface they draw on.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Boxed output stream owned by a backend
pub type Sink = Box<dyn Write + Send>;

/// Surface a renderer draws on
///
/// Owned by the caller and shared with the backend, which only reads it.
pub trait RenderTarget: Send + Sync {
    /// Width in cells
    fn width(&self) -> u16;

    /// Height in cells
    fn height(&self) -> u16;

    /// Width in pixels, when the terminal reports it
    fn pixel_width(&self) -> Option<u32> {
        None
    }

    /// Height in pixels, when the terminal reports it
    fn pixel_height(&self) -> Option<u32> {
        None
    }

    /// Called once per frame after the command buffer was flushed
    fn present(&self) {}
}

/// Target with fixed dimensions, counting `present` calls
#[derive(Debug, Default)]
pub struct FixedTarget {
    width: u16,
    height: u16,
    pixels: Option<(u32, u32)>,
    presents: AtomicUsize,
}

impl FixedTarget {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: None,
            presents: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_pixels(mut self, pixel_width: u32, pixel_height: u32) -> Self {
        self.pixels = Some((pixel_width, pixel_height));
        self
    }

    /// Number of frames presented so far
    pub fn present_count(&self) -> usize {
        self.presents.load(Ordering::Relaxed)
    }
}

impl RenderTarget for FixedTarget {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn pixel_width(&self) -> Option<u32> {
        self.pixels.map(|(w, _)| w)
    }

    fn pixel_height(&self) -> Option<u32> {
        self.pixels.map(|(_, h)| h)
    }

    fn present(&self) {
        self.presents.fetch_add(1, Ordering::Relaxed);
    }
}

/// The attached terminal, sized via crossterm at construction
#[derive(Debug, Clone, Copy)]
pub struct TerminalTarget {
    columns: u16,
    rows: u16,
    pixels: Option<(u32, u32)>,
}

impl TerminalTarget {
    /// Query the terminal size, falling back to 80x24
    pub fn detect() -> Self {
        match crossterm::terminal::window_size() {
            Ok(size) if size.columns > 0 && size.rows > 0 => Self {
                columns: size.columns,
                rows: size.rows,
                pixels: (size.width > 0 && size.height > 0)
                    .then(|| (u32::from(size.width), u32::from(size.height))),
            },
            _ => {
                let (columns, rows) = crossterm::terminal::size().unwrap_or((80, 24));
                Self {
                    columns,
                    rows,
                    pixels: None,
                }
            }
        }
    }
}

impl RenderTarget for TerminalTarget {
    fn width(&self) -> u16 {
        self.columns
    }

    fn height(&self) -> u16 {
        self.rows
    }

    fn pixel_width(&self) -> Option<u32> {
        self.pixels.map(|(w, _)| w)
    }

    fn pixel_height(&self) -> Option<u32> {
        self.pixels.map(|(_, h)| h)
    }
}

/// In-memory sink that can be cloned and inspected after being handed off
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Return the contents and reset the buffer
    pub fn take(&self) -> String {
        let mut bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let text = String::from_utf8_lossy(&bytes).into_owned();
        bytes.clear();
        text
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Boxed clone usable as a backend sink
    pub fn sink(&self) -> Sink {
        Box::new(self.clone())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink whose every write fails, like a closed pipe
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
    }
}

/// Process stdout as a sink
pub fn stdout_sink() -> Sink {
    Box::new(io::stdout())
}

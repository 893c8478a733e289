//! Frame lifecycle and command buffer shared by every backend

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::errors::{RenderError, Result};
use crate::output::{RenderTarget, Sink};
use crate::types::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Ready,
    InFrame,
    Disposed,
}

/// Lifecycle state machine, viewport and per-frame command buffer
///
/// Backends embed one of these and delegate the contract's bookkeeping to
/// it, keeping only their protocol-specific encoding.
pub struct FrameCore {
    name: &'static str,
    state: Lifecycle,
    target: Option<Arc<dyn RenderTarget>>,
    viewport: Option<Viewport>,
    buffer: String,
    sink: Sink,
}

impl fmt::Debug for FrameCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCore")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("viewport", &self.viewport)
            .field("pending", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl FrameCore {
    pub fn new(name: &'static str, sink: Sink) -> Self {
        Self {
            name,
            state: Lifecycle::Uninitialized,
            target: None,
            viewport: None,
            buffer: String::with_capacity(4096),
            sink,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.state == Lifecycle::Disposed
    }

    pub fn in_frame(&self) -> bool {
        self.state == Lifecycle::InFrame
    }

    /// Fails once the backend is disposed
    pub fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(RenderError::Disposed);
        }
        Ok(())
    }

    /// Fails when disposed or not yet initialized
    pub fn ensure_initialized(&self) -> Result<&Arc<dyn RenderTarget>> {
        self.ensure_live()?;
        self.target.as_ref().ok_or_else(|| {
            RenderError::invalid_state(format!("{} renderer is not initialized", self.name))
        })
    }

    /// Fails unless a frame is open
    pub fn ensure_in_frame(&self) -> Result<()> {
        self.ensure_initialized()?;
        if !self.in_frame() {
            return Err(RenderError::invalid_state(format!(
                "{}: draw call outside begin_frame/end_frame",
                self.name
            )));
        }
        Ok(())
    }

    pub fn initialize(&mut self, target: Arc<dyn RenderTarget>) -> Result<()> {
        self.ensure_live()?;
        if self.in_frame() {
            return Err(RenderError::invalid_state(
                "cannot re-initialize while a frame is in progress",
            ));
        }
        if target.width() == 0 || target.height() == 0 {
            return Err(RenderError::invalid_argument(format!(
                "render target has no cells ({}x{})",
                target.width(),
                target.height()
            )));
        }
        self.target = Some(target);
        self.state = Lifecycle::Ready;
        Ok(())
    }

    pub fn begin_frame(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        if self.in_frame() {
            return Err(RenderError::invalid_state(
                "begin_frame called while a frame is already in progress",
            ));
        }
        self.buffer.clear();
        self.state = Lifecycle::InFrame;
        Ok(())
    }

    /// Flush the frame's commands, then present the target
    pub fn end_frame(&mut self) -> Result<()> {
        let target = Arc::clone(self.ensure_initialized()?);
        if !self.in_frame() {
            return Err(RenderError::invalid_state(
                "end_frame called without a matching begin_frame",
            ));
        }
        self.flush();
        self.state = Lifecycle::Ready;
        target.present();
        Ok(())
    }

    pub fn target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.target.as_ref()
    }

    /// Explicit viewport, or the whole target
    pub fn viewport(&self) -> Viewport {
        self.viewport.unwrap_or_else(|| match &self.target {
            Some(target) => Viewport::sized(target.width(), target.height()),
            None => Viewport::default(),
        })
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_live()?;
        self.viewport = Some(viewport);
        Ok(())
    }

    #[inline]
    pub fn visible(&self, x: i32, y: i32) -> bool {
        self.viewport().contains(x, y)
    }

    pub fn buffer_mut(&mut self) -> &mut String {
        &mut self.buffer
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Write pending commands now unless a frame will flush them later
    pub fn write_through(&mut self) {
        if !self.in_frame() {
            self.flush();
        }
    }

    /// Write the buffer to the sink and clear it
    ///
    /// Write failures are logged and dropped; a closed or redirected stream
    /// must not take down the render loop.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        trace!(renderer = self.name, bytes = self.buffer.len(), "flushing commands");
        let result = self
            .sink
            .write_all(self.buffer.as_bytes())
            .and_then(|()| self.sink.flush());
        if let Err(err) = result {
            warn!(renderer = self.name, error = %err, "terminal write failed, output dropped");
        }
        self.buffer.clear();
    }

    /// Enter the terminal disposed state, releasing the target
    pub fn mark_disposed(&mut self) {
        self.buffer.clear();
        self.target = None;
        self.state = Lifecycle::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{BrokenSink, FixedTarget, SharedBuffer};

    fn core() -> (FrameCore, SharedBuffer) {
        let out = SharedBuffer::new();
        (FrameCore::new("test", out.sink()), out)
    }

    #[test]
    fn test_begin_requires_initialize() {
        let (mut core, _) = core();
        let err = core.begin_frame().unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_initialize_rejects_empty_target() {
        let (mut core, _) = core();
        let err = core.initialize(Arc::new(FixedTarget::new(0, 10))).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_nested_and_unmatched_frames_rejected() {
        let (mut core, _) = core();
        core.initialize(Arc::new(FixedTarget::new(10, 10))).unwrap();
        assert!(core.end_frame().unwrap_err().is_invalid_state());
        core.begin_frame().unwrap();
        assert!(core.begin_frame().unwrap_err().is_invalid_state());
        core.end_frame().unwrap();
        assert!(core.end_frame().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_end_frame_flushes_and_presents() {
        let (mut core, out) = core();
        let target = Arc::new(FixedTarget::new(10, 10));
        core.initialize(target.clone()).unwrap();
        core.begin_frame().unwrap();
        core.buffer_mut().push_str("abc");
        assert!(out.is_empty());
        core.end_frame().unwrap();
        assert_eq!(out.contents(), "abc");
        assert!(core.pending().is_empty());
        assert_eq!(target.present_count(), 1);
    }

    #[test]
    fn test_write_failure_is_suppressed() {
        let mut core = FrameCore::new("broken", Box::new(BrokenSink));
        core.initialize(Arc::new(FixedTarget::new(10, 10))).unwrap();
        core.begin_frame().unwrap();
        core.buffer_mut().push_str("lost");
        assert!(core.end_frame().is_ok());
        assert!(core.pending().is_empty());
    }

    #[test]
    fn test_viewport_defaults_to_target() {
        let (mut core, _) = core();
        core.initialize(Arc::new(FixedTarget::new(40, 12))).unwrap();
        assert_eq!(core.viewport(), Viewport::sized(40, 12));
        core.set_viewport(Viewport::new(5, 5, 2, 2)).unwrap();
        assert!(core.visible(6, 6));
        assert!(!core.visible(0, 0));
    }

    #[test]
    fn test_disposed_rejects_everything() {
        let (mut core, _) = core();
        core.initialize(Arc::new(FixedTarget::new(10, 10))).unwrap();
        core.mark_disposed();
        assert!(matches!(core.begin_frame(), Err(RenderError::Disposed)));
        assert!(matches!(
            core.set_viewport(Viewport::sized(1, 1)),
            Err(RenderError::Disposed)
        ));
    }
}

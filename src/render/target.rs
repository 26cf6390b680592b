use std::io::Write;
use std::sync::{Arc, Mutex};

use super::{Frame, RenderTarget};

#[derive(Debug, Default)]
struct MemoryState {
    visible: bool,
    frames: Vec<Frame>,
}

/// Records every frame it receives. Inspect it through a [`MemoryProbe`].
#[derive(Debug, Default)]
pub struct MemoryTarget {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl RenderTarget for MemoryTarget {
    fn set_visible(&mut self, visible: bool) {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).visible
    }

    fn replace(&mut self, frame: Frame) {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).frames.push(frame);
    }
}

/// Read side of a [`MemoryTarget`] that stays usable after the target is mounted.
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProbe {
    pub fn is_visible(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).visible
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).frames.last().cloned()
    }

    pub fn frame_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).frames.len()
    }
}

/// Prints the frame to stdout whenever the view is visible.
#[derive(Debug, Default)]
pub struct TerminalTarget {
    visible: bool,
    current: Option<Frame>,
}

impl TerminalTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&self) {
        if let Some(frame) = &self.current {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "\n{}", frame.to_text());
            let _ = out.flush();
        }
    }
}

impl RenderTarget for TerminalTarget {
    fn set_visible(&mut self, visible: bool) {
        let became_visible = visible && !self.visible;
        self.visible = visible;
        if became_visible {
            self.draw();
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn replace(&mut self, frame: Frame) {
        self.current = Some(frame);
        if self.visible {
            self.draw();
        }
    }
}

//! Frames, render targets and the view renderer.
//!
//! A [`Frame`] is the complete content of one view. Targets only ever receive
//! whole frames, so re-applying the same payload is idempotent.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;

use serde_json::json;

use crate::error::{ClientError, CoordError};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::view::{Payload, ViewId};

pub mod format;
pub mod panels;
mod target;

pub use target::{MemoryProbe, MemoryTarget, TerminalTarget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Normal,
    Ok,
    Info,
    Warn,
    Danger,
    Accent,
    Muted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub percent: u32,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub value: f64,
    /// Horizontal position, 0..=100.
    pub x_pct: f64,
    /// Height relative to the maximum, 0..=90.
    pub y_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Normal,
        }
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Stat { label: String, value: String },
    List { title: String, items: Vec<String> },
    Bars { title: String, bars: Vec<Bar> },
    Trend { title: String, points: Vec<TrendPoint> },
    Lines { title: String, lines: Vec<Cell> },
    Table { columns: Vec<String>, rows: Vec<Row> },
    Text(String),
    Pre(String),
    Empty(String),
    Loading(String),
    /// Error banner shown above otherwise valid content.
    Notice(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Frame {
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            blocks,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Loading(_)))
    }

    pub fn error(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Error(msg) | Block::Notice(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    pub fn stat(&self, label: &str) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Stat { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn table_rows(&self) -> Option<&[Row]> {
        self.blocks.iter().find_map(|b| match b {
            Block::Table { rows, .. } => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn empty_message(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Empty(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    /// Plain-text rendering for terminals and logs.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", self.title);
        for block in &self.blocks {
            match block {
                Block::Stat { label, value } => {
                    let _ = writeln!(out, "{:<20} {}", label, value);
                }
                Block::List { title, items } => {
                    let _ = writeln!(out, "{}:", title);
                    for item in items {
                        let _ = writeln!(out, "  - {}", item);
                    }
                }
                Block::Bars { title, bars } => {
                    let _ = writeln!(out, "{}:", title);
                    for bar in bars {
                        let filled = (bar.percent as usize).min(100) / 5;
                        let _ = writeln!(
                            out,
                            "  {:<16} {:<20} {:>3}%",
                            bar.label,
                            "#".repeat(filled),
                            bar.percent
                        );
                    }
                }
                Block::Trend { title, points } => {
                    let values: Vec<String> = points.iter().map(|p| format::number(p.value)).collect();
                    let _ = writeln!(out, "{}: {}", title, values.join(" "));
                }
                Block::Lines { title, lines } => {
                    let _ = writeln!(out, "{}:", title);
                    for line in lines {
                        let _ = writeln!(out, "  {}", line.text);
                    }
                }
                Block::Table { columns, rows } => {
                    let _ = writeln!(out, "{}", columns.join(" | "));
                    for row in rows {
                        let cells: Vec<&str> = row.cells.iter().map(|c| c.text.as_str()).collect();
                        let _ = writeln!(out, "{}", cells.join(" | "));
                    }
                }
                Block::Text(text) | Block::Pre(text) => {
                    let _ = writeln!(out, "{}", text);
                }
                Block::Empty(msg) | Block::Loading(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                Block::Notice(msg) | Block::Error(msg) => {
                    let _ = writeln!(out, "!! {}", msg);
                }
            }
        }
        out
    }
}

/// Display surface for one view. The coordinator only toggles visibility and
/// swaps whole frames.
pub trait RenderTarget: Send {
    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;
    fn replace(&mut self, frame: Frame);
}

/// Pure mapping from a view payload to its content blocks.
pub type RenderFn = fn(&Payload) -> Result<Vec<Block>, String>;

struct Slot {
    title: String,
    render: RenderFn,
    target: Box<dyn RenderTarget>,
}

/// Applies payloads and failures to each view's target.
#[derive(Default)]
pub struct ViewRenderer {
    slots: Mutex<BTreeMap<ViewId, Slot>>,
}

impl ViewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(
        &self,
        id: ViewId,
        title: impl Into<String>,
        render: RenderFn,
        target: Box<dyn RenderTarget>,
    ) {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.insert(
            id,
            Slot {
                title: title.into(),
                render,
                target,
            },
        );
    }

    pub fn is_mounted(&self, id: &ViewId) -> bool {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.contains_key(id)
    }

    /// Renders `payload` as the view's full content. An undecodable payload
    /// leaves the target untouched and comes back as a decode failure, so the
    /// caller decides whether prior content survives.
    pub fn apply(&self, id: &ViewId, payload: &Payload) -> Result<(), CoordError> {
        self.with_slot(id, |slot| match (slot.render)(payload) {
            Ok(blocks) => {
                slot.target.replace(Frame::new(slot.title.clone(), blocks));
                Ok(())
            }
            Err(cause) => Err(CoordError::Load {
                view_id: id.clone(),
                cause: ClientError::Decode { cause },
            }),
        })
        .unwrap_or_else(|| Err(CoordError::UnknownView(id.clone())))
    }

    pub fn apply_error(&self, id: &ViewId, error: &CoordError) {
        let message = error.display_message();
        self.with_slot(id, |slot| {
            let text = format!("Failed to load {}. {}", slot.title.to_lowercase(), message);
            slot.target.replace(Frame::new(slot.title.clone(), vec![Block::Error(text)]));
        });
    }

    /// Re-renders `payload` with `message` as a banner on top.
    pub fn apply_notice(&self, id: &ViewId, payload: &Payload, message: &str) {
        self.with_slot(id, |slot| {
            let mut blocks = vec![Block::Notice(message.to_string())];
            match (slot.render)(payload) {
                Ok(content) => blocks.extend(content),
                Err(_) => blocks = vec![Block::Error(message.to_string())],
            }
            slot.target.replace(Frame::new(slot.title.clone(), blocks));
        });
    }

    /// Replaces the view's content with a bare error message.
    pub fn apply_failure(&self, id: &ViewId, message: &str) {
        self.with_slot(id, |slot| {
            slot.target.replace(Frame::new(slot.title.clone(), vec![Block::Error(message.to_string())]));
        });
    }

    pub fn apply_loading(&self, id: &ViewId) {
        self.with_slot(id, |slot| {
            let text = format!("Loading {}...", slot.title.to_lowercase());
            slot.target.replace(Frame::new(slot.title.clone(), vec![Block::Loading(text)]));
        });
    }

    /// Makes `id` the only visible target.
    pub fn show_only(&self, id: &ViewId) -> Result<(), CoordError> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        if !slots.contains_key(id) {
            return Err(CoordError::UnknownView(id.clone()));
        }
        for (slot_id, slot) in slots.iter_mut() {
            slot.target.set_visible(slot_id == id);
        }
        Ok(())
    }

    pub fn visible(&self) -> Vec<ViewId> {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots
            .iter()
            .filter(|(_, slot)| slot.target.is_visible())
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn with_slot<R>(&self, id: &ViewId, f: impl FnOnce(&mut Slot) -> R) -> Option<R> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        match slots.get_mut(id) {
            Some(slot) => Some(f(slot)),
            None => {
                log(
                    Level::Warn,
                    Domain::Render,
                    "no_target",
                    obj(&[("view_id", v_str(id.as_str())), ("slots", json!(slots.len()))]),
                );
                None
            }
        }
    }
}

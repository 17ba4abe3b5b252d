//! # stamp_table
//!
//! The stamp-table controller: physical stamps on a touch surface become
//! persistent objects, and their pose and arrangement drive an audio
//! engine.
//!
//! ## Per-frame pipeline
//!
//! | Step | Crate | Output |
//! |---|---|---|
//! | Recognise | `constellation` | stamps seen this frame |
//! | Track | `stamp_tracker` | persistent objects, lifecycle events |
//! | Connect | `stamp_tracker::topology` | signal chain, hub `parameter_y` |
//! | Emit | `stamp_emit` | JSON bridge lines or MIDI CC |
//!
//! ## Input
//!
//! Touches arrive as a line-based script, either from a file or typed on
//! stdin; see [`input`] for the format.  Commands go to stdout (JSON) or a
//! MIDI port; logs go to stderr.

pub mod app;
pub mod engine;
pub mod input;
pub mod output;

pub use app::{load_script, run, App, AppConfig, AppError, RunSummary};
pub use engine::{FrameSnapshot, StampEngine};
pub use input::{InputEvent, LineTouchSource, ScriptError, ScriptedTouchSource, TouchSource};
pub use output::{build_sink, OutputKind};

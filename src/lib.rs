//! renderwatch - render progress monitor for video editors.
//!
//! The detection pipeline lives in `renderwatch-core`; this crate adds the
//! terminal front end and the scripted demo.

pub mod demo;
pub mod ui;

pub use renderwatch_core::*;

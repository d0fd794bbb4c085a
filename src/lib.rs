//! A terminal outline editor: nested levels of text, side-by-side columns
//! and in-place evaluation of markup, scripts, JSON and remote text.

pub mod config;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod keys;
pub mod level;
pub mod logging;
pub mod registry;
pub mod render;
pub mod reorder;
pub mod sandbox;
pub mod template;
pub mod theme;

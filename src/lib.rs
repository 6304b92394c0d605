//! Reader and desktop viewer for pre-computed MOFA+ factor-analysis models.

pub mod app;
pub mod color;
pub mod data;
pub mod error;
pub mod export;
pub mod state;
pub mod ui;

pub use error::{ModelError, Result};

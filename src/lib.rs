pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod logging;
pub mod plot;
pub mod sampler;
pub mod session;
pub mod system;
pub mod ui;
pub mod viewer;

pub use error::{Error, Result};

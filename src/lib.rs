//! Portfolio scheduling and metrics engine.
//!
//! Converts each project's committed hours, burn rate and calendar dates into
//! projected-completion and variance indicators, rolls them up across the
//! portfolio, and drives an editable timeline whose bars can be dragged.
//! Rendering is left to the caller: everything here returns plain values.

pub mod app;
pub mod error;
pub mod io;
pub mod model;
pub mod settings;

pub use app::Dashboard;
pub use error::{PortfolioError, Result};

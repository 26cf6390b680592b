//! Terminal console for a SIEM Data API: view registry, navigation,
//! refresh scheduling and rendering over a small JSON HTTP client.

pub mod client;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod model;
pub mod nav;
pub mod render;
pub mod scheduler;
pub mod view;

pub use config::Config;
pub use console::Console;
pub use error::{ClientError, CoordError};

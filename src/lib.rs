pub mod cache;
pub mod constants;
pub mod error;
pub mod export;
pub mod index;
pub mod loader;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;
pub mod text;

pub use error::{Error, Result};
pub use service::{CommandService, ServiceConfig};

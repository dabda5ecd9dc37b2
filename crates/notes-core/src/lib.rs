pub mod auth;
pub mod config;
pub mod error;
pub mod hooks;
pub mod io;
pub mod note;
pub mod paths;
pub mod store;
pub mod trigger;

pub use error::{NotesError, Result};

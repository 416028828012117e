pub mod config;
pub mod conversation;
pub mod error;
pub mod gate;
pub mod hash;
pub mod io;
pub mod ledger;
pub mod manifest;
pub mod paths;
pub mod project;
pub mod registry;
pub mod state;
pub mod status;
pub mod types;
pub mod validate;
pub mod vcs;

pub use error::{GateError, Result};

//! Grantsync Core - data model, typed locators, events and validation errors

pub mod error;
pub mod event;
pub mod locator;
pub mod types;

pub use error::{Error, Result};
pub use event::*;
pub use locator::*;
pub use types::*;

//! HTTP request handlers

pub mod list;
pub mod service;
pub mod upload;

pub use list::*;
pub use service::*;
pub use upload::*;

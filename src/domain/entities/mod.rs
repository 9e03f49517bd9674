//! Core domain entities.
//!
//! - [`Redirect`] - A stored short key and its target
//! - [`NewRedirect`] - Input for storing a redirect

pub mod redirect;

pub use redirect::{NewRedirect, Redirect};

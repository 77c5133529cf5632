// src/credential/mod.rs
mod claims;
mod locator;
mod resolver;

pub use resolver::{resolve_and_synthesize, IdentitySource};

//! Core engine — the poll → evaluate → order loop and its control surface.

pub mod selector;
pub mod trader;

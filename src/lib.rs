//! termtalk library exports for the binary and integration tests

pub mod core;
pub mod inference;
pub mod server;
pub mod tui;

#[cfg(test)]
pub mod test_support;

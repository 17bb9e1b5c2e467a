//! integrated tests
pub mod toolkit;

mod locator;

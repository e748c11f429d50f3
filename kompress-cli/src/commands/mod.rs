//! Command implementations for Kompress CLI.

pub mod inflate;
pub mod test;

pub use inflate::cmd_inflate;
pub use test::cmd_test;

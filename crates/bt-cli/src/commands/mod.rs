//! CLI subcommand implementations.

pub mod events;
pub mod status;
pub mod sync;
pub mod timeline;
pub mod types;
pub mod util;

//! Command handlers. One module per subcommand.

pub mod backup_db;
pub mod dev;
pub mod restore;
pub mod snapshot;

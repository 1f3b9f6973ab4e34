//! Subcommand implementations

pub mod logout;
pub mod pending;
pub mod purge;
pub mod recent;
pub mod replay;
pub mod run;
pub mod sync;

//! Command dispatch: CLI args -> registry operations -> output formatting.

pub mod accessory;
pub mod config_cmd;
pub mod list;
pub mod run;

use std::sync::Arc;

use indigo_config::Config;
use indigo_core::Registry;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that needs an Indigo connection.
pub async fn dispatch(
    cmd: Command,
    registry: Arc<Registry>,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Run => run::handle(registry, cfg, global).await,
        Command::List => list::handle(&registry, global).await,
        Command::Get(args) => accessory::get(&registry, args, global).await,
        Command::Set(args) => accessory::set(&registry, args, global).await,
        // Config is handled before a connection is made
        Command::Config(_) => unreachable!(),
    }
}

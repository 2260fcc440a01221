//! Long-running bridge: discover, serve change notifications, wait.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use indigo_config::Config;
use indigo_core::Registry;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::{listener, output};

pub async fn handle(
    registry: Arc<Registry>,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let accessories = registry.discover().await?;
    let color = output::should_color(global.color);

    if !global.quiet {
        eprintln!(
            "{} {} accessories",
            output::accent("indigo-bridge", color),
            accessories.len()
        );
        output::print_output(&super::list::render(&accessories, global)?, false);
    }

    let shutdown = CancellationToken::new();
    let server = match cfg.listen_port {
        Some(port) => {
            let bound = listener::bind(port).await?;
            if !global.quiet {
                eprintln!(
                    "{}",
                    output::muted(&format!("Listening for Indigo on port {port}"), color)
                );
            }
            Some(tokio::spawn(listener::serve(
                bound,
                Arc::clone(&registry),
                shutdown.clone(),
            )))
        }
        None => None,
    };

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    shutdown.cancel();

    if let Some(task) = server {
        match task.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "listener task failed"),
        }
    }
    registry.channel().shutdown();
    Ok(())
}

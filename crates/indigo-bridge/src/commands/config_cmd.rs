//! Config subcommand handlers. None of these contact Indigo.

use indigo_config::ConfigError;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?.redacted();
            let rendered = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::JsonCompact => serde_json::to_string(&cfg)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(ConfigError::from)?
                }
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::resolve_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Init { server } => {
            let path = config::resolve_path(global);
            indigo_config::write_starter(&path, &server)?;
            if !global.quiet {
                eprintln!("✓ Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::SetPassword { password } => {
            let cfg = config::load(global)?;
            let host = cfg.host.ok_or_else(|| ConfigError::MissingHost {
                path: config::resolve_path(global).display().to_string(),
            })?;
            indigo_config::store_password(&host, &password)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for {host}");
            }
            Ok(())
        }
    }
}

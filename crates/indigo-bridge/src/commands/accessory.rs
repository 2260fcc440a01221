//! Single-accessory reads and writes.

use std::sync::Arc;

use serde::Serialize;

use indigo_core::{Accessory, CharValue, Characteristic, Origin, Registry};

use crate::cli::{GetArgs, GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Reading {
    id: String,
    name: String,
    characteristic: Characteristic,
    value: CharValue,
}

fn detail(r: &Reading) -> String {
    format!(
        "Accessory:      {} ({})\nCharacteristic: {}\nValue:          {}",
        r.name, r.id, r.characteristic, r.value
    )
}

/// Discover, then look the id up among the exposed accessories.
async fn find(registry: &Registry, id: &str) -> Result<Arc<Accessory>, CliError> {
    registry.discover().await?;
    registry
        .get(id)
        .ok_or_else(|| CliError::NotFound { id: id.to_owned() })
}

pub async fn get(registry: &Registry, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let acc = find(registry, &args.id).await?;
    let value = acc.read(args.characteristic).await?;

    let reading = Reading {
        id: args.id,
        name: acc.name(),
        characteristic: args.characteristic,
        value,
    };
    let out = output::render_single(global.output, &reading, detail, |r| r.value.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn set(registry: &Registry, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let acc = find(registry, &args.id).await?;
    acc.write(args.characteristic, args.value, Origin::User).await?;

    if !global.quiet {
        eprintln!(
            "✓ Set {} on '{}' to {}",
            args.characteristic,
            acc.name(),
            args.value
        );
    }
    Ok(())
}

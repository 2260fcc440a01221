//! Accessory listing.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use indigo_core::{Accessory, AccessoryInfo, AccessoryKind, Characteristic, Registry, ServiceKind};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AccessoryView {
    pub id: String,
    pub name: String,
    pub kind: AccessoryKind,
    pub service: ServiceKind,
    pub characteristics: Vec<Characteristic>,
    pub info: AccessoryInfo,
}

impl From<&Accessory> for AccessoryView {
    fn from(acc: &Accessory) -> Self {
        Self {
            id: acc.id().to_owned(),
            name: acc.name(),
            kind: acc.kind(),
            service: acc.service(),
            characteristics: acc.characteristics(),
            info: acc.info(),
        }
    }
}

#[derive(Tabled)]
struct AccessoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Characteristics")]
    characteristics: String,
}

fn row(v: &AccessoryView) -> AccessoryRow {
    AccessoryRow {
        id: v.id.clone(),
        name: v.name.clone(),
        kind: v.kind.to_string(),
        service: v.service.to_string(),
        characteristics: v
            .characteristics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Render accessories in the selected output format.
pub fn render(accessories: &[Arc<Accessory>], global: &GlobalOpts) -> Result<String, CliError> {
    let views: Vec<AccessoryView> = accessories
        .iter()
        .map(|a| AccessoryView::from(a.as_ref()))
        .collect();
    output::render_list(global.output, &views, row, |v| v.id.clone())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(registry: &Registry, global: &GlobalOpts) -> Result<(), CliError> {
    let accessories = registry.discover().await?;
    output::print_output(&render(&accessories, global)?, global.quiet);
    Ok(())
}

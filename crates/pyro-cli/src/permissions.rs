//! # Permissions Subcommand
//!
//! Print the permission table in effect: the built-in default or the file
//! passed with `--permissions`.

use std::path::Path;

use anyhow::Result;
use clap::{Args, ValueEnum};
use pyro_core::{Role, Service};
use pyro_state::PermissionTable;

use crate::context::load_permissions;

#[derive(Args, Debug)]
pub struct PermissionsArgs {
    /// Only this role.
    #[arg(long)]
    pub role: Option<Role>,

    /// Only this service.
    #[arg(long)]
    pub service: Option<Service>,

    #[arg(long, value_enum, default_value_t = TableFormat::Text)]
    pub format: TableFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Text,
    Yaml,
    Json,
}

pub fn run_permissions(args: &PermissionsArgs, table_path: Option<&Path>) -> Result<u8> {
    let table = load_permissions(table_path)?;
    let selected = select(&table, args.service, args.role);
    match args.format {
        TableFormat::Text => print!("{}", format_text(&selected)),
        TableFormat::Yaml => print!("{}", serde_yaml::to_string(&selected)?),
        TableFormat::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
    }
    Ok(0)
}

/// The subset of `table` matching the filters.
fn select(table: &PermissionTable, service: Option<Service>, role: Option<Role>) -> PermissionTable {
    let mut selected = PermissionTable::empty();
    for &s in Service::ALL.iter().filter(|s| service.map_or(true, |f| f == **s)) {
        for &r in Role::ALL.iter().filter(|r| role.map_or(true, |f| f == **r)) {
            let actions = table.allowed(s, r);
            if !actions.is_empty() {
                selected = selected.with_grant(s, r, actions.as_slice());
            }
        }
    }
    selected
}

fn format_text(table: &PermissionTable) -> String {
    let mut out = String::new();
    for &service in Service::ALL {
        for &role in Role::ALL {
            let actions = table.allowed(service, role);
            if actions.is_empty() {
                continue;
            }
            let names: Vec<&str> = actions.as_slice().iter().map(|a| a.as_str()).collect();
            out.push_str(&format!("{:<14}{:<11}{}\n", service.as_str(), role.as_str(), names.join(", ")));
        }
    }
    out
}

//! Stdout rendering for each command. Logs go to stderr, so stdout stays
//! machine-readable in `--format json`.

use clap::ValueEnum;
use loadout_catalog::{CatalogPart, CatalogSummary};
use loadout_core::{Build, EditHistoryEntry, EngineError};
use loadout_types::element::ElementCombo;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn summary(format: Format, summary: &CatalogSummary) -> anyhow::Result<()> {
    match format {
        Format::Json => print_json(summary),
        Format::Text => {
            println!("element combos: {}", summary.element_combos);
            println!("item types:     {}", summary.item_types);
            println!("pairings:       {}", summary.pairings);
            println!("slot rules:     {}", summary.slot_rules);
            for (family, count) in &summary.parts {
                println!("{:<15} {}", format!("{family} parts:"), count);
            }
            println!("fingerprint:    {}", summary.fingerprint);
            Ok(())
        }
    }
}

pub fn combos(format: Format, combos: &[&ElementCombo]) -> anyhow::Result<()> {
    match format {
        Format::Json => print_json(combos),
        Format::Text => {
            for combo in combos {
                println!("{:>3}  {}", combo.id, combo);
            }
            Ok(())
        }
    }
}

pub fn parts(format: Format, parts: &[&CatalogPart]) -> anyhow::Result<()> {
    match format {
        Format::Json => {
            let rows: Vec<_> = parts
                .iter()
                .map(|p| {
                    json!({
                        "definition": p.definition,
                        "requirements": (!p.predicate.is_always()).then(|| p.predicate.to_string()),
                    })
                })
                .collect();
            print_json(&rows)
        }
        Format::Text => {
            for part in parts {
                let definition = &part.definition;
                print!(
                    "{:>4}  {:<18} {}",
                    definition.id(),
                    definition.part_type(),
                    definition.name()
                );
                if !part.predicate.is_always() {
                    print!("  (requires {})", part.predicate);
                }
                println!();
            }
            Ok(())
        }
    }
}

pub fn build(format: Format, build: &Build) -> anyhow::Result<()> {
    match format {
        Format::Json => print_json(build),
        Format::Text => {
            println!("{}", build.serial);
            print!("{}", build.component_string);
            Ok(())
        }
    }
}

pub fn recorded(format: Format, entry: Option<&EditHistoryEntry>) -> anyhow::Result<()> {
    match (format, entry) {
        (Format::Json, entry) => print_json(&entry),
        (Format::Text, Some(entry)) => {
            println!(
                "{} {} at {} ({} change(s))",
                entry.edit_type,
                entry.item_name,
                entry.timestamp.to_rfc3339(),
                entry.parts_json.len()
            );
            Ok(())
        }
        (Format::Text, None) => {
            println!("no changes to record");
            Ok(())
        }
    }
}

pub fn rejection(format: Format, err: &EngineError) -> anyhow::Result<()> {
    let EngineError::Build(build_err) = err else {
        eprintln!("error: {err}");
        return Ok(());
    };
    match format {
        Format::Json => print_json(&json!({
            "error": build_err.kind(),
            "offending_id": build_err.offending_id(),
            "message": build_err.to_string(),
        })),
        Format::Text => {
            eprintln!("error[{}]: {}", build_err.kind(), build_err);
            Ok(())
        }
    }
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `nmrlink_core` linkage without the Flutter runtime.
//! - Validate a graph snapshot file and print a deterministic summary.
//!
//! Usage: `nmrlink_cli [snapshot.json]`

use nmrlink_core::{CorrelationGraph, CorrelationGraphStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("nmrlink_core ping={}", nmrlink_core::ping());
    println!("nmrlink_core version={}", nmrlink_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match summarize(&path) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("snapshot {path} rejected: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(path: &str) -> Result<Vec<String>, String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("read failed: {err}"))?;
    let graph: CorrelationGraph =
        serde_json::from_str(&raw).map_err(|err| format!("invalid JSON: {err}"))?;
    let store = CorrelationGraphStore::new(graph).map_err(|err| err.to_string())?;

    let links: usize = store.get_all().iter().map(|c| c.links.len()).sum();
    let pseudo = store.get_all().iter().filter(|c| c.pseudo).count();
    let mut lines = vec![format!(
        "correlations={} pseudo={pseudo} link_halves={links} mf={}",
        store.get_all().len(),
        store.options().mf.as_deref().unwrap_or("-")
    )];
    for (atom_type, state) in store.state().map_err(|err| err.to_string())? {
        let total = state
            .total
            .map_or_else(|| "-".to_string(), |total| total.to_string());
        lines.push(format!(
            "atom_type={atom_type} current={} total={total} complete={} error={}",
            state.current, state.complete, state.error
        ));
    }
    Ok(lines)
}

//! Export, import and reset of the learned state.

use clap::Subcommand;
use std::path::PathBuf;

use super::open_estimator;

#[derive(Subcommand)]
pub enum StateAction {
    /// Export learned state as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace learned state with an exported snapshot
    Import {
        /// Snapshot file produced by `export`
        file: PathBuf,
    },
    /// Discard all learned state
    Reset,
}

pub fn run(action: StateAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StateAction::Export { out } => {
            let estimator = open_estimator()?;
            let json = serde_json::to_string_pretty(&estimator.export_state())?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        StateAction::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let mut estimator = open_estimator()?;
            estimator.import_state(&value)?;
            println!("imported {}", file.display());
        }
        StateAction::Reset => {
            let mut estimator = open_estimator()?;
            estimator.reset();
            println!("learned state reset to defaults");
        }
    }
    Ok(())
}

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use triago::{PipelineConfig, ReferenceData};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let note = match read_note() {
        Ok(note) => note,
        Err(e) => {
            eprintln!("failed to read note: {e}");
            return ExitCode::FAILURE;
        }
    };

    let data_dir = std::env::var_os("TRIAGO_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let reference = match ReferenceData::shared(&data_dir) {
        Ok(reference) => reference,
        Err(e) => {
            eprintln!("failed to load reference data: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = triago::process(&note, reference, &PipelineConfig::default());
    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to serialize result: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Note text from the file named on the command line, or stdin.
fn read_note() -> std::io::Result<String> {
    match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut note = String::new();
            std::io::stdin().read_to_string(&mut note)?;
            Ok(note)
        }
    }
}

use std::error::Error;
use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::dataset;
use crate::module::BuiltinLoader;
use crate::worker::{self, InboundMessage};

pub const SAMPLE_FLAG: &str = "--sample";

/// Convert one JSON file (or the built-in sample) into an `.xlsx` file
///
/// # Arguments
/// * `args` - Full argument list, program name first: `<input.json|--sample> <output.xlsx>`
///
/// # Returns
/// * `Result<usize, Box<dyn Error>>` - Number of bytes written, or a usage or conversion error
pub async fn run(args: &[String]) -> Result<usize, Box<dyn Error>> {
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("spreadsheet-export");
        return Err(format!("Usage: {} <input.json|{}> <output.xlsx>", program, SAMPLE_FLAG).into());
    }

    let payload = if args[1] == SAMPLE_FLAG {
        dataset::styled_dataset()
    } else {
        let text = tokio::fs::read_to_string(&args[1]).await?;
        serde_json::from_str(&text)?
    };

    let config = WorkerConfig::from_env();
    let worker = worker::spawn(config, Arc::new(BuiltinLoader::new()));
    worker.post(InboundMessage::convert(payload).with_uid(1))?;

    let result = worker
        .finish()
        .await?
        .pop()
        .ok_or("conversion produced no result, see the log for details")?;

    tokio::fs::write(&args[2], &result.blob.bytes).await?;
    log::info!("wrote {} bytes to {}", result.blob.size(), args[2]);
    Ok(result.blob.size())
}

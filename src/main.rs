use spreadsheet_export::cli;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let written = cli::run(&args).await?;
    println!("Wrote {} bytes to {}", written, args[2]);

    Ok(())
}

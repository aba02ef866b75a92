#![cfg(not(tarpaulin_include))]

use spreadsheet_export::app;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Parse command line arguments for the port
    let args: Vec<String> = env::args().collect();

    let mut port = 3000;
    if args.len() >= 2 {
        port = args[1].parse().unwrap_or(3000);
    }

    println!("Starting export server on port {}", port);
    app::run(port).await
}

//! anx CLI binary.
//!
//! Sends a single request through the rate-limited client and prints the
//! response body as pretty JSON.

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();

    anx::init_tracing(cli.verbose)?;

    let response = cli::run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    Ok(())
}

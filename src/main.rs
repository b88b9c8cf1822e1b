use clap::Parser;
use radar_accumulator::cli::{run, Cli};
use radar_accumulator::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

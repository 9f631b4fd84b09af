//! Slate headless shell entry point.

use clap::Parser;
use slate_app::Args;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::init();
    log::info!("Starting Slate");

    match pollster::block_on(slate_app::run(args)) {
        Ok(scene) => {
            println!("{scene}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("slate-app: {e}");
            ExitCode::FAILURE
        }
    }
}

//! redelim - Main entry point

use clap::Parser;
use redelim_cli::app::{self, RunOptions};
use redelim_cli::driver::EXIT_ABORTED;
use redelim_cli::pause::PauseMode;
use redelim_cli::Cli;
use std::process;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();
    let pause = PauseMode::resolve(cli.no_pause, cli.pause_secs);

    // The base directory comes from the executable, never the working directory
    let base_dir = match app::executable_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {}", e);
            pause.wait();
            process::exit(EXIT_ABORTED);
        },
    };

    // Environment variables configure logging, --verbose lowers the level
    let log = app::log_config(cli.verbose);

    let code = app::run(&base_dir, &RunOptions { log, pause });
    process::exit(code);
}

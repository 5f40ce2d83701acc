//! Demo entrypoint for the ILP settlement core.
//!
//! Wires [`ilp_settlement::SettlementExecutor`] to in-memory/console
//! collaborators (see `demo`) and runs it until SIGTERM/SIGINT.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `NODE_ID`, `LOG_LEVEL` control node identity and log verbosity

mod config;
mod demo;
mod logging;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}

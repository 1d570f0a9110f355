//! Four-way intersection CLI.
//!
//! Runs one scripted scenario and prints the final report as JSON.
//!
//! # Usage
//!
//! ```bash
//! intersection [--policy <mode>] [--stagger <ms>] [--recover] [DIRECTION...]
//! ```
//!
//! # Example
//!
//! ```bash
//! intersection --policy avoidance north east south west
//! ```

use example::{ScenarioArgs, USAGE, run};
use gridlock_driver::TracingConfig;

#[tokio::main]
async fn main() {
    let args = ScenarioArgs::parse(std::env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("{USAGE}");
        std::process::exit(2);
    });

    TracingConfig::new()
        .with_level(args.log_level)
        .with_format(args.log_format)
        .init();

    let output = run(&args).await.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: cannot serialize report: {e}");
            std::process::exit(1);
        }
    }
}

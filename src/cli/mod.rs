//! Command-line interface for the blog server
//!
//! Run with: cargo run --bin blogd -- serve

use crate::Result;
use crate::config::Config;
use clap::{Arg, Command};

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let matches = Command::new("blogd")
        .about("Tech-blog backend server")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve").about("Start the HTTP server").arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16))
                    .help("Listen port (overrides the PORT environment variable)"),
            ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", sub_matches)) => {
            let mut config = Config::from_env();
            if let Some(port) = sub_matches.get_one::<u16>("port") {
                config.server.port = *port;
            }
            crate::http::start_server(config).await
        }
        _ => Ok(()),
    }
}

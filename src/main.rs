//! blogd - tech-blog backend server
//!
//! Run with: cargo run --bin blogd -- serve

#[tokio::main]
async fn main() {
    // Load .env as early as possible; config reads the environment once
    let _ = dotenvy::dotenv();

    // Initialize logging
    techblog::init_logging();

    if let Err(e) = techblog::cli::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

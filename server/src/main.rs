use clap::Parser;
use log::info;
use server::gateway::Gateway;
use server::registry::{SessionConfig, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Main-method of the application.
/// Parses command-line arguments, creates the session registry and runs the
/// connection gateway until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Tick rate (simulation updates per second)
        #[clap(short, long, default_value = "60")]
        tick_rate: u32,
        /// Score a player must reach to win a session
        #[clap(short, long, default_value = "5")]
        winning_score: u32,
        /// Number of sessions to create at startup
        #[clap(long, default_value = "1")]
        preallocate: usize,
    }

    // Parse command line arguments
    let args = Args::parse();

    let config = SessionConfig {
        tick_interval: Duration::from_secs_f32(1.0 / args.tick_rate as f32),
        winning_score: args.winning_score,
        ..Default::default()
    };
    let registry = SessionRegistry::new(config);

    // Session creation stays an explicit, privileged operation; connections
    // to unknown sessions are refused rather than creating one implicitly
    for _ in 0..args.preallocate {
        let id = registry.create().await;
        info!("session ready, connect with ws://{}:{}/ws?gameId={}", args.host, args.port, id);
    }

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address).await?;
    info!("listening for connections on {}", address);

    // Spawn gateway thread
    let gateway = Arc::new(Gateway::new(Arc::clone(&registry)));
    let gateway_handle = tokio::spawn(gateway.run(listener));

    // Handle shutdown gracefully
    tokio::select! {
        result = gateway_handle => {
            if let Err(e) = result {
                eprintln!("Gateway task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}

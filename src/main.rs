use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitolink::core::{Config, Error, Result};
use vitolink::protocol::{Outcome, RegisterAccess, Session};
use vitolink::telemetry::{Exporter, InfluxSink};
use vitolink::transform::decode_by_width;
use vitolink::transport::SerialTransport;
use vitolink::util::{check_size, format_address, parse_address, parse_data};

#[derive(Parser, Debug)]
#[command(name = "vitolink", version, about = "Viessmann Optolink VS2 client")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "VITOLINK_CONFIG", default_value = "vitolink.toml")]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export telemetry and serve the HTTP register endpoint
    Run,
    /// Read one register
    Read {
        address: String,
        #[arg(short, long, default_value_t = 2)]
        size: usize,
    },
    /// Write hex data to one register
    Write { address: String, data: String },
    /// Read every register in an address range
    Scan {
        start: String,
        end: String,
        #[arg(short, long, default_value_t = 1)]
        size: usize,
    },
}

fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        error!(error = %e, "vitolink failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let transport = SerialTransport::from_config(&config.serial)?;
    info!(port = transport.path(), "serial adapter ready");
    let session = Arc::new(Session::new(transport));

    match cli.command {
        Command::Run => serve(config, session).await,
        Command::Read { address, size } => {
            let address = parse_address(&address)?;
            let size = check_size(size)?;
            let outcome = blocking(move || session.read_register(address, size)).await?;
            print_reading(address, &outcome);
            Ok(())
        }
        Command::Write { address, data } => {
            let address = parse_address(&address)?;
            let data = parse_data(&data)?;
            let outcome = blocking(move || session.write_register(address, &data)).await?;
            println!("{} {}", format_address(address), outcome.label());
            Ok(())
        }
        Command::Scan { start, end, size } => {
            let start = parse_address(&start)?;
            let end = parse_address(&end)?;
            let size = check_size(size)?;
            if end < start {
                return Err(Error::invalid_argument("scan end lies before start"));
            }
            blocking(move || {
                for address in start..=end {
                    let outcome = session.read_register(address, size)?;
                    if outcome.is_success() {
                        print_reading(address, &outcome);
                    }
                }
                Ok(())
            })
            .await
        }
    }
}

async fn serve(config: Config, session: Arc<Session>) -> Result<()> {
    let handshake = Arc::clone(&session);
    if let Err(e) = blocking(move || handshake.connect()).await {
        // the session retries the handshake on every request
        warn!(error = %e, "initial handshake failed");
    }

    let registers: Arc<dyn RegisterAccess> = session;
    let sink = InfluxSink::new(&config.influxdb)?;
    info!(url = sink.url(), interval = ?config.exporter.interval, "starting exporter");
    let exporter = Exporter::new(Arc::clone(&registers), sink, config.exporter.clone());
    let exporter_handle = tokio::spawn(async move { exporter.run().await });

    let listener = tokio::net::TcpListener::bind(config.http.bind).await?;
    info!(bind = %config.http.bind, "serving register endpoint");
    let app = vitolink::api::router(registers);

    tokio::select! {
        res = axum::serve(listener, app).into_future() => res?,
        res = exporter_handle => {
            res.map_err(|e| Error::invalid_state(format!("exporter task failed: {}", e)))??
        }
    }
    Ok(())
}

fn print_reading(address: u16, outcome: &Outcome<Vec<u8>>) {
    match outcome {
        Outcome::Success(data) => match decode_by_width(data) {
            Some(value) => println!("{} {} {}", format_address(address), hex::encode(data), value),
            None => println!("{} {}", format_address(address), hex::encode(data)),
        },
        other => println!("{} {}", format_address(address), other.label()),
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::invalid_state(format!("register task failed: {}", e)))?
}

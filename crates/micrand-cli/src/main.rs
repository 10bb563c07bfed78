//! CLI for micrand — random numbers from the air in the room.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use micrand_core::{AudioBackend, Config, CpalBackend, RngManager, select_device};

#[derive(Parser)]
#[command(name = "micrand")]
#[command(about = "micrand — microphone-backed random numbers with PRNG fallback")]
#[command(version = micrand_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio input devices and mark the one the selector would pick
    Devices,

    /// Print random numbers in [0, 1) with the source that produced them
    Rand {
        /// How many numbers to print
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Run the HTTP random-number server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

fn main() {
    let config = Config::from_env();
    init_logging(&config);

    let cli = Cli::parse();
    match cli.command {
        Commands::Devices => run_devices(&config),
        Commands::Rand { count } => run_rand(config, count),
        Commands::Serve { host, port } => run_serve(config, &host, port),
    }
}

fn init_logging(config: &Config) {
    let default_filter = if config.debug_logging { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run_devices(config: &Config) {
    let backend = CpalBackend::new();
    let devices = match backend.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            eprintln!("Failed to enumerate input devices: {e}");
            std::process::exit(1);
        }
    };

    if devices.is_empty() {
        println!("No audio input devices found. The service would run on PRNG fallback.");
        return;
    }

    let selected = select_device(&backend, config);

    println!("{:<6} {:<40} {:>4} {:>9}", "Index", "Name", "Ch", "Rate");
    println!("{}", "-".repeat(62));
    for device in &devices {
        let marker = if selected == Some(device.index) { "*" } else { " " };
        println!(
            "{marker}{:<5} {:<40} {:>4} {:>8}Hz",
            device.index, device.name, device.input_channels, device.sample_rate
        );
    }
    match selected {
        Some(index) => println!("\n* selector picks device {index}"),
        None => println!("\nNo device passed variance probing; the service would use fallback."),
    }
}

fn run_rand(config: Config, count: usize) {
    let rng = RngManager::new(config);
    for _ in 0..count {
        let (value, source) = rng.random_with_source();
        println!("{value:.17}  {source}");
    }
    rng.shutdown();
}

fn run_serve(config: Config, host: &str, port: u16) {
    let rng = Arc::new(RngManager::new(config));

    println!("micrand server v{}", micrand_core::VERSION);
    println!("   http://{host}:{port}");
    println!("   source: {}", rng.current_source());
    println!();
    println!("   Endpoints:");
    println!("     GET /api/random   One float in [0, 1) with source and timestamp");
    println!("     GET /health       Service health and current source");
    println!();
    println!("   Example:");
    println!("     curl http://{host}:{port}/api/random");

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(micrand_server::run_server(rng, host, port));
}

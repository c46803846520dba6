use anyhow::Result;
use clap::Parser;
use humancam::{DetectorKind, HumancamConfig, SessionOrchestrator};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "humancam")]
#[command(about = "Camera child process that streams person-annotated frames over stdout")]
#[command(version)]
#[command(long_about = "Opens the first working camera, detects people in every frame and \
writes each annotated frame as one base64 JPEG line on stdout. Send a line containing QUIT \
on stdin to stop; a summary of the session is appended to a CSV log on exit.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "humancam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Override the session log path
    #[arg(long, value_name = "PATH", help = "CSV file the session summary is appended to")]
    log_path: Option<String>,

    /// Override the detector model path
    #[arg(long, value_name = "PATH", help = "Path to the YOLOv8 ONNX model")]
    model: Option<String>,

    /// Override the detector backend (tract, stub)
    #[arg(long, value_name = "BACKEND", help = "Detector backend: tract or stub")]
    detector: Option<String>,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without opening a camera")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    // Logs go to stderr; stdout is reserved for frames
    init_logging(&args)?;

    info!("Starting humancam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match HumancamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(message) = apply_overrides(&mut config, &args) {
        error!("{}", message);
        std::process::exit(1);
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
        }
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let exit_code = match SessionOrchestrator::new(config).run().await {
        Ok(outcome) => {
            info!(
                "Session ended: {:?} after {} frames",
                outcome.reason, outcome.frames_emitted
            );
            outcome.exit_code()
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            1
        }
    };

    info!("Script finished.");

    // The stdin reader thread cannot be joined, so leave explicitly
    std::process::exit(exit_code);
}

fn apply_overrides(config: &mut HumancamConfig, args: &Args) -> std::result::Result<(), String> {
    if let Some(path) = &args.log_path {
        config.session.log_path = path.clone();
    }

    if let Some(model) = &args.model {
        config.detector.model_path = model.clone();
    }

    if let Some(backend) = &args.detector {
        config.detector.backend = match backend.to_ascii_lowercase().as_str() {
            "tract" => DetectorKind::Tract,
            "stub" => DetectorKind::Stub,
            other => return Err(format!("Unknown detector backend '{}'", other)),
        };
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("humancam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some("compact") | None => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(args.verbose || args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# humancam configuration file");
    println!("# Every key is optional; HUMANCAM_<SECTION>__<KEY> environment variables override it");
    println!();
    print!("{}", toml::to_string_pretty(&HumancamConfig::default())?);
    Ok(())
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use speechcast::app::run_generate_command;
use speechcast::cli::{Cli, Commands, ConfigAction};
use speechcast::config::Config;
use speechcast::generation::SessionStatus;
use speechcast::voices::VOICE_GROUPS;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);
    tracing::debug!(version = %speechcast::version_string(), "speechcast starting");

    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(cli.config.as_deref())?;
            let status = run_generate_command(config, args, cli.quiet).await?;
            if status == SessionStatus::Failed {
                std::process::exit(1);
            }
        }
        Commands::Voices => {
            list_voices();
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "speechcast",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Log to stderr: warnings by default, `-v` info, `-vv` debug. `RUST_LOG` wins.
fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("speechcast={level}")));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/speechcast/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Print the prebuilt voices grouped by label.
fn list_voices() {
    for (idx, group) in VOICE_GROUPS.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        println!("{}", group.label.bold());
        for voice in group.voices {
            println!("  {}", voice.name.green());
        }
    }
    println!();
    println!(
        "{}",
        "Use --voice NAME, or --speaker TAG=NAME for multi-speaker scripts.".dimmed()
    );
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Get { key } => {
            let config = match Config::load_or_default(&config_path) {
                Ok(config) => config.with_env_overrides(),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match config.get_value_by_path(&key) {
                Ok(value) => println!("{}", value),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Dump => {
            print!("{}", Config::dump_template());
        }
    }
    Ok(())
}

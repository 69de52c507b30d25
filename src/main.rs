// ABOUTME: CLI entrypoint for fanboxsync command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use fanboxsync::{
    api::ApiClient,
    cli::{Cli, Commands},
    config::{default_config_path, load_config, resolve_credentials, Overrides},
    iframely::IframelyClient,
    storage::Paths,
    sync::{self, SyncReport},
    telemetry, Result,
};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("fanboxsync: [E{}] {}", e.exit_code(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn exit_code(report: &SyncReport) -> i32 {
    if report.failed > 0 {
        1
    } else {
        0
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let profile = match load_config(&config_path)? {
        Some(config) => config.profile(cli.profile.as_deref())?,
        None => Default::default(),
    };

    let credentials = resolve_credentials(
        Overrides {
            creator_id: cli.creator_id.clone(),
            session_id: cli.session_id.clone(),
            csrf_token: cli.csrf_token.clone(),
        },
        profile,
    )?;

    let mut client = ApiClient::new(&credentials, Some(cli.api_base.clone()))?;
    if cli.no_throttle {
        client = client.disable_throttle();
    } else if let Some((min, max)) = cli.throttle_ms {
        client = client.with_throttle(min, max);
    }

    let paths = Paths::new(cli.dir.clone())?;

    match cli.command() {
        Commands::Pull { force } => {
            let resolver = IframelyClient::new(None)?;
            let report = sync::pull_all(&client, &resolver, &paths, force)?;
            Ok(exit_code(&report))
        }
        Commands::Push { files } => {
            let report = sync::push_files(&client, &paths, &files)?;
            Ok(exit_code(&report))
        }
        Commands::Create { title } => {
            let path = sync::create_post(&client, &paths, &title)?;
            println!("{}", path.display());
            Ok(0)
        }
        Commands::Delete { file } => {
            sync::delete_post(&client, &file)?;
            Ok(0)
        }
    }
}

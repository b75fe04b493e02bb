mod auth;
mod config;
mod logging;
mod pagination;
mod ports;
mod services;
mod youtube;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};

use crate::{
    auth::{CredentialStore, LoopbackLogin, OAuthHttpClient},
    config::Config,
    logging::init_tracing,
    services::{
        dedup::{DedupOutcome, DedupService, DedupState, enter},
        duplicates::DeletionMode,
    },
    youtube::YoutubeHttpAdapter,
};

/// Delete duplicate videos (same title) from one of your YouTube playlists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exact, case-sensitive name of the playlist to clean up
    playlist_name: String,

    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_DEDUP_CONFIG")]
    config: Option<PathBuf>,

    /// OAuth client descriptor downloaded from the API console
    #[arg(long)]
    client_secrets: Option<PathBuf>,

    /// Where to cache the OAuth token (default: next to the executable)
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Keep the first copy of each duplicated title and delete all the others,
    /// instead of deleting a single copy per title
    #[arg(long)]
    remove_all_copies: bool,

    /// Log filter, e.g. "debug" or "playlist_dedup=trace"
    #[arg(long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,
}

impl Args {
    fn parse_or_usage() -> Result<Args, ExitCode> {
        Args::or_usage(Args::try_parse(), &mut std::io::stdout())
    }

    /// `--help` and `--version` keep clap's behaviour. Any other parse failure
    /// prints the usage line to `out` and maps to exit status 1.
    fn or_usage(
        parsed: Result<Args, clap::Error>,
        out: &mut impl Write,
    ) -> Result<Args, ExitCode> {
        match parsed {
            Ok(args) => Ok(args),
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                error.exit()
            }
            Err(_) => {
                let _ = writeln!(out, "{}", Args::command().render_usage());
                Err(ExitCode::from(1))
            }
        }
    }

    fn deletion_mode(&self) -> DeletionMode {
        if self.remove_all_copies {
            DeletionMode::KeepFirst
        } else {
            DeletionMode::Legacy
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = match Args::parse_or_usage() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    color_eyre::install()?;
    init_tracing(&args.log_level)?;

    tracing::debug!("Loading configuration");
    let mut config = {
        if let Some(ref path) = args.config {
            Config::from_file(path)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load playlist-dedup config")?;
    if let Some(ref path) = args.client_secrets {
        config.client_secrets_path = path.clone();
    }
    if let Some(ref path) = args.token_file {
        config.token_path = Some(path.clone());
    }

    enter(DedupState::Unauthenticated);
    let store = CredentialStore::new(
        &config,
        config.token_path()?,
        LoopbackLogin::new(),
        OAuthHttpClient::new(),
    );
    tracing::debug!("Using token file {}", store.token_path().display());
    let credentials = store
        .authenticate()
        .await
        .wrap_err("Failed to authenticate")?;
    let access_token = credentials
        .access_token()
        .ok_or_eyre("Credentials carry no access token")?
        .to_string();
    enter(DedupState::Authenticated);

    let client = YoutubeHttpAdapter::new(&config, access_token)?;
    let service = DedupService::new(client, args.deletion_mode());

    let mut stdout = std::io::stdout();
    match service.run(&args.playlist_name, &mut stdout).await? {
        DedupOutcome::NoSuchPlaylist => {
            println!("Invalid playlist name: {}", args.playlist_name);
            Ok(ExitCode::from(1))
        }
        DedupOutcome::Done { .. } => Ok(ExitCode::SUCCESS),
    }
}

//! `library-client` entry point: loads settings, wires the HTTP gateway and
//! the file session store, and runs one command.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use library_client::inbound::cli::{Cli, CliError, Desk};
use library_client::outbound::{FileSessionStore, HttpLibraryGateway};
use library_client::settings::ClientSettings;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("library-client")])
        .map_err(|error| eyre!("failed to load settings: {error}"))?;
    init_tracing(settings.log_json);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(cli, &settings))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = installed {
        warn!(%error, "tracing init failed");
    }
}

async fn run(cli: Cli, settings: &ClientSettings) -> Result<ExitCode> {
    let api_url = match cli.api_url {
        Some(raw) => Url::parse(&raw).wrap_err_with(|| format!("invalid --api-url {raw}"))?,
        None => settings.api_url().wrap_err("invalid LIBRARY_CLIENT_API_URL")?,
    };
    let session_path = cli.session_file.unwrap_or_else(|| settings.session_file());
    let store = Arc::new(
        FileSessionStore::open(&session_path)
            .wrap_err_with(|| format!("failed to open session file {}", session_path.display()))?,
    );
    let gateway = HttpLibraryGateway::new(api_url, settings.request_timeout(), Arc::clone(&store))
        .wrap_err("failed to build HTTP client")?;
    let desk = Desk::new(
        Arc::new(gateway),
        store,
        Arc::new(DefaultClock),
        settings.fine_rate(),
    );

    let mut stdout = io::stdout().lock();
    match desk.run(cli.command, &mut stdout).await {
        Ok(outcome) => Ok(ExitCode::from(outcome.exit_code())),
        Err(CliError::Domain(error)) => {
            writeln!(io::stderr(), "error: {error}")?;
            Ok(ExitCode::FAILURE)
        }
        Err(error @ CliError::Output(_)) => Err(error.into()),
    }
}

//! Storefront demo entry point.
//!
//! # Responsibility
//! - Resolve configuration, reset the schema, seed and persist the sample
//!   stores, then print them back from storage.
//! - Map failures to a diagnostic line and a non-zero exit code.
//!
//! # Invariants
//! - Every run drops and recreates the configured database schema before
//!   looking at what the file already holds.
//! - Exit code 2 means configuration error, 1 means any other failure.

use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;
use storefront_core::db::DbError;
use storefront_core::{
    init_logging, write_stores, ConfigError, RepoError, SqliteStoreRepository, StoreService,
    StoreServiceError, StorefrontConfig,
};

const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUN_ERROR: u8 = 1;

#[derive(Debug)]
enum AppError {
    Config(ConfigError),
    Db {
        operation: &'static str,
        source: DbError,
    },
    Repo {
        operation: &'static str,
        source: RepoError,
    },
    Service {
        operation: &'static str,
        source: StoreServiceError,
    },
    Output(io::Error),
}

impl AppError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => EXIT_CONFIG_ERROR,
            _ => EXIT_RUN_ERROR,
        }
    }

    /// Failing step, as logged and printed.
    fn operation(&self) -> &'static str {
        match self {
            Self::Config(_) => "load_config",
            Self::Db { operation, .. }
            | Self::Repo { operation, .. }
            | Self::Service { operation, .. } => *operation,
            Self::Output(_) => "write_output",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Db { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::Repo { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::Service { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::Output(err) => write!(f, "writing output failed: {err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db { source, .. } => Some(source),
            Self::Repo { source, .. } => Some(source),
            Self::Service { source, .. } => Some(source),
            Self::Output(err) => Some(err),
        }
    }
}

fn main() -> ExitCode {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(err) => return report_failure(&AppError::Config(err)),
    };

    if let Err(err) = init_logging(&config.log) {
        eprintln!("storefront: file logging disabled: {err}");
    }

    let stdout = io::stdout();
    let exit_code = match run(&config, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err),
    };

    if config.pause_on_exit {
        wait_for_enter();
    }
    exit_code
}

fn report_failure(err: &AppError) -> ExitCode {
    error!(
        "event=demo_run module=cli status=error operation={} error={err}",
        err.operation()
    );
    eprintln!("storefront: {err}");
    ExitCode::from(err.exit_code())
}

/// Resets the configured database, persists the sample stores and writes
/// them back from storage to `out`. Returns how many stores were printed.
fn run(config: &StorefrontConfig, out: &mut impl Write) -> Result<usize, AppError> {
    let started_at = Instant::now();
    info!("event=demo_run module=cli status=start db={:?}", config.db);

    warn!("event=demo_run module=cli status=reset_schema destructive=true");
    let mut conn = config.db.open_reset().map_err(|source| AppError::Db {
        operation: "reset_schema",
        source,
    })?;

    let stores = {
        let repo = SqliteStoreRepository::try_new(&mut conn).map_err(|source| AppError::Repo {
            operation: "open_store_repository",
            source,
        })?;
        let mut service = StoreService::new(repo);

        service
            .seed_sample_data()
            .map_err(|source| AppError::Service {
                operation: "save_stores",
                source,
            })?;

        service.list_stores().map_err(|source| AppError::Repo {
            operation: "list_stores",
            source,
        })?
    };

    write_stores(out, &stores).map_err(AppError::Output)?;

    info!(
        "event=demo_run module=cli status=ok stores={} duration_ms={}",
        stores.len(),
        started_at.elapsed().as_millis()
    );
    Ok(stores.len())
}

fn wait_for_enter() {
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

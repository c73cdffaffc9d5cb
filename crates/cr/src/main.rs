mod config;

use clap::{Parser, Subcommand};
use config::Config;
use cr_core::types::{GroupRef, UserId};
use cr_core::{CodeRepos, CodeReposError};
use cr_db::schema;
use cr_db::store::DbStore;
use cr_events::bus::EventBus;
use cr_events::notice::NoticeBus;
use cr_vcs::BackendRegistry;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coderepos", about = "Group-scoped source repository registry")]
struct Cli {
    /// Config file; defaults to .coderepos/config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the OpenAPI document.
    Openapi,
    /// List enabled repository types.
    Backends,
    /// List registrations, globally or for one group (`kind:id`).
    Repos {
        #[arg(long)]
        group: Option<GroupRef>,
    },
    /// Manage the groups registrations can belong to.
    Groups {
        #[command(subcommand)]
        command: GroupCommand,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    List,
    Create {
        group: GroupRef,
        name: String,
    },
    AddMember {
        group: GroupRef,
        user: UserId,
    },
    RemoveMember {
        group: GroupRef,
        user: UserId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "could not load config");
            return ExitCode::FAILURE;
        }
    };
    let registry = Arc::new(build_registry(&config));

    match cli.command {
        Command::Serve { port } => {
            cr_serve::openapi::ensure_initialized();
            if let Err(err) = ensure_db_dir(&config) {
                tracing::error!(error = %err, "could not prepare database directory");
                return ExitCode::FAILURE;
            }
            let addr = SocketAddr::new(
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                port.unwrap_or(config.port),
            );
            let state = cr_serve::AppState {
                db_path: config.db_path.clone(),
                event_bus: EventBus::new(1024),
                registry,
                notices: config.notifications.then(|| NoticeBus::new(256)),
            };
            if let Err(err) = cr_serve::serve(state, addr).await {
                tracing::error!(error = %err, "serve error");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Openapi => {
            println!("{}", cr_serve::openapi::generate_spec());
            ExitCode::SUCCESS
        }
        Command::Backends => {
            for name in registry.names() {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        Command::Repos { group } => report(open_service(&config, registry).and_then(|service| {
            match group {
                Some(group) => {
                    let group = service.groups().resolve(&group)?;
                    service.registrations().list(Some(&group))
                }
                None => service.registrations().list(None),
            }
        })),
        Command::Groups { command } => report(open_service(&config, registry).and_then(|service| {
            let groups = service.groups();
            match command {
                GroupCommand::List => groups.list(),
                GroupCommand::Create { group, name } => groups.create(group, &name).map(|g| vec![g]),
                GroupCommand::AddMember { group, user } => {
                    groups.add_member(&group, &user)?;
                    groups.resolve(&group).map(|g| vec![g])
                }
                GroupCommand::RemoveMember { group, user } => {
                    groups.remove_member(&group, &user)?;
                    groups.resolve(&group).map(|g| vec![g])
                }
            }
        })),
    }
}

fn build_registry(config: &Config) -> BackendRegistry {
    let mut registry = BackendRegistry::with_installed();
    if let Some(enabled) = &config.backends {
        for name in registry.retain(enabled) {
            tracing::warn!(backend = %name, "unknown backend in config");
        }
    }
    registry
}

fn ensure_db_dir(config: &Config) -> Result<(), CodeReposError> {
    let Some(parent) = Path::new(&config.db_path).parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|err| CodeReposError::Internal {
        message: format!("cannot create {}: {err}", parent.display()),
    })
}

fn open_service(
    config: &Config,
    registry: Arc<BackendRegistry>,
) -> Result<CodeRepos<DbStore>, CodeReposError> {
    ensure_db_dir(config)?;
    let conn = schema::open_and_migrate(&config.db_path).map_err(|err| CodeReposError::Internal {
        message: err.to_string(),
    })?;
    Ok(CodeRepos::new(
        DbStore::new(conn),
        registry,
        EventBus::new(16),
    ))
}

fn report<T: Serialize>(result: Result<T, CodeReposError>) -> ExitCode {
    let output = result.and_then(|value| {
        serde_json::to_string_pretty(&value).map_err(|err| CodeReposError::Internal {
            message: err.to_string(),
        })
    });
    match output {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

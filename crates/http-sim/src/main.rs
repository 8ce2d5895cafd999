use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use http_sim::config::{load_rules_file, AppConfig};
use http_sim::control::ControlState;
use http_sim::rules::{load_rules, RuleStore};
use http_sim::sim::{ServerContext, SimServer, SimState};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::parse();
    let store = Arc::new(RuleStore::new());
    let response_files_root = config.response_files_root();

    if let Some(path) = &config.rules {
        let rules_config = load_rules_file(path)?;
        let outcome = load_rules(rules_config.rules, &response_files_root, &store);
        info!(
            "Loaded {}/{} rules from {}",
            outcome.created.len(),
            outcome.total,
            path.display()
        );
    }

    let sim_state = SimState {
        store: Arc::clone(&store),
        default_response: config.default_response(),
        response_files_root: response_files_root.clone(),
    };
    let control_state = ControlState {
        store,
        response_files_root,
    };
    let sim_logger = config.sim_logger();
    let control_logger = config.control_logger();

    // With a dedicated control listener the simulated endpoint serves
    // rules only; otherwise the control API shares its listener.
    let control_addr = config.control_addr()?;
    let sim_server = SimServer::bind(
        config.sim_addr()?,
        ServerContext {
            sim: Some(sim_state),
            control: if control_addr.is_some() {
                None
            } else {
                Some(control_state.clone())
            },
            sim_logger,
            control_logger: control_logger.clone(),
        },
    )
    .await?;

    let control_server = match control_addr {
        Some(addr) => Some(
            SimServer::bind(
                addr,
                ServerContext {
                    sim: None,
                    control: Some(control_state),
                    sim_logger: None,
                    control_logger,
                },
            )
            .await?,
        ),
        None => None,
    };

    let mut servers = tokio::task::JoinSet::new();
    servers.spawn(sim_server.run());
    if let Some(control_server) = control_server {
        servers.spawn(control_server.run());
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
        Some(result) = servers.join_next() => {
            if let Ok(Err(e)) = result {
                error!("Server error: {e:#}");
                return Err(e);
            }
        }
    }

    Ok(())
}

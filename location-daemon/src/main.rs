use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use location_core::credentials::UnconfinedResolver;
use location_core::engine::{Engine, EngineConfig, EngineState};
use location_core::permission::{DefaultPermissionManager, PermissionDecision, PromptParameters, TrustAgent};
use location_core::provider::{NullProvider, Provider};
use location_core::session_manager::{SessionManager, SessionManagerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stand-in trust agent for this demonstration binary: real deployments wire
/// this to the platform's trust-prompt service, out of scope here.
struct AlwaysGrantAgent;

impl TrustAgent for AlwaysGrantAgent {
    fn prompt(&self, _params: PromptParameters) -> Pin<Box<dyn Future<Output = PermissionDecision> + Send + '_>> {
        Box::pin(async { PermissionDecision::Granted })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "location service failed to start");
            ExitCode::FAILURE
        }
    }
}

/// Wires one stub provider into the engine and stands up a session manager.
/// No transport is attached — that seam is out of scope — so this is wiring
/// demonstration, not a long-running server loop.
async fn run() -> anyhow::Result<()> {
    let engine = Engine::new(EngineConfig::default());

    let stub_provider: Arc<dyn Provider> = Arc::new(NullProvider::new());
    stub_provider
        .enable()
        .context("failed to enable the stub provider")?;
    engine.add_provider(stub_provider);

    let permission_manager = Arc::new(DefaultPermissionManager::new(
        Arc::new(UnconfinedResolver),
        Arc::new(AlwaysGrantAgent),
    ));

    let session_manager = SessionManager::new(
        Arc::clone(&engine),
        permission_manager,
        Arc::new(UnconfinedResolver),
        SessionManagerConfig::default(),
    );

    engine.set_engine_state(EngineState::On);
    tracing::info!(
        is_online = session_manager.is_online(),
        "location service core wired up"
    );

    Ok(())
}

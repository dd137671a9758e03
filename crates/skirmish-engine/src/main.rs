//! Match engine binary for Skirmish.
//!
//! This is the main entry point that wires together configuration, the
//! arena, both agents' sandboxed decision logic, the observer server, and
//! the match runner. It runs one match to completion (or until Ctrl-C) and
//! then tears everything down.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skirmish-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Load the arena and build the entity store
//! 4. Load both bots from the bot library
//! 5. Initialize one sandbox per agent (any failure aborts the match)
//! 6. Create the match control channel
//! 7. Start the Observer API server
//! 8. Run the match loop
//! 9. Tear down: abort evolutions, release sandboxes, stop the observer

mod error;
mod library;
mod observer_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use skirmish_core::author::BotAuthor;
use skirmish_core::config::{LogFormat, LoggingConfig, MatchConfig};
use skirmish_core::control::control_channel;
use skirmish_core::decision::SandboxDecisionSource;
use skirmish_core::runner::{self, NoOpCallback, TickCallback};
use skirmish_core::tick::MatchState;
use skirmish_observer::{ObserverState, ServerConfig};
use skirmish_sandbox::{AgentSandbox, SandboxLimits};
use skirmish_types::{AgentId, PerAgent};
use skirmish_world::EntityStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::library::BotLibrary;
use crate::observer_callback::ObserverCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "skirmish-config.yaml";

/// Capacity of the match control queue.
const CONTROL_QUEUE_DEPTH: usize = 16;

/// Application entry point for the match engine.
///
/// # Errors
///
/// Returns an error if any setup step or the match itself fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config_found = config_path.exists();
    let config = if config_found {
        MatchConfig::from_file(&config_path).map_err(EngineError::from)?
    } else {
        let mut config = MatchConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    };
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("skirmish-engine starting");
    if !config_found {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        match_name = %config.match_settings.name,
        seed = config.match_settings.seed,
        tick_interval_ms = config.match_settings.tick_interval_ms,
        max_ticks = config.match_settings.max_ticks,
        decision_timeout_ms = config.sandbox.decision_timeout_ms,
        "Configuration loaded"
    );

    // 3. Arena and entity store.
    let arena = config.load_arena(&base).map_err(EngineError::from)?;
    info!(
        biome = %arena.biome,
        obstacles = arena.obstacles.len(),
        "Arena loaded"
    );
    let store = EntityStore::new(
        arena,
        config.rules.clone(),
        config.match_settings.max_ticks,
        config.match_settings.seed,
    )
    .map_err(EngineError::from)?;
    let mut state = MatchState::new(store);

    // 4. Bots.
    let library = Arc::new(BotLibrary::new(base.join(&config.bots.library)));
    info!(library = %library.dir().display(), "Loading bots");
    let (alpha_bot, bravo_bot) = tokio::try_join!(
        load_bot(&library, &config, &base, AgentId::Alpha),
        load_bot(&library, &config, &base, AgentId::Bravo),
    )?;

    // 5. Sandboxes. Setup failures are fatal to the match.
    let (alpha, bravo) = tokio::try_join!(
        init_sandbox(AgentId::Alpha, &alpha_bot.source, &config.sandbox),
        init_sandbox(AgentId::Bravo, &bravo_bot.source, &config.sandbox),
    )?;
    let mut source = SandboxDecisionSource::new(PerAgent::new(alpha, bravo));

    // 6. Control channel.
    let author: Arc<dyn BotAuthor> = library;
    let (handle, mut control) = control_channel(
        state.match_id,
        PerAgent::new(alpha_bot.name, bravo_bot.name),
        Some(author),
        CONTROL_QUEUE_DEPTH,
    );
    let interrupt = tokio::spawn({
        let handle = handle.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current tick");
                if let Err(err) = handle.request_stop() {
                    warn!(error = %err, "stop request failed");
                }
            }
        }
    });

    // 7. Observer.
    let mut observer = None;
    let mut callback: Box<dyn TickCallback> = if config.observer.enabled {
        let observer_state = Arc::new(ObserverState::with_match(
            handle.clone(),
            Some(source.stats_handles()),
        ));
        let server_config = ServerConfig {
            host: config.observer.host.clone(),
            port: config.observer.port,
        };
        let server = skirmish_observer::spawn_observer(&server_config, Arc::clone(&observer_state))
            .await
            .map_err(EngineError::from)?;
        info!(addr = %server.addr, "Observer API server started");
        observer = Some(server);
        Box::new(ObserverCallback::new(observer_state))
    } else {
        info!("Observer disabled");
        Box::new(NoOpCallback)
    };

    // 8. Run the match.
    info!(match_id = %state.match_id, "Match state assembled, entering tick loop");
    let result = runner::run_match(
        &mut state,
        &mut source,
        &mut control,
        callback.as_mut(),
        Duration::from_millis(config.match_settings.tick_interval_ms),
    )
    .await;

    // 9. Teardown, whatever the result.
    handle.teardown();
    interrupt.abort();
    let stats = source.stats_handles().map(|_, s| s.snapshot());
    source.terminate().await;
    if let Some(server) = observer {
        server.task.abort();
    }

    let result = result.map_err(EngineError::from)?;
    for id in AgentId::ALL {
        let s = stats.get(id);
        info!(
            agent = %id,
            decisions = s.decisions,
            faults = s.faults(),
            swaps_applied = s.swaps_applied,
            swaps_rejected = s.swaps_rejected,
            "Sandbox summary"
        );
    }
    info!(
        match_id = %result.match_id,
        end = ?result.end,
        total_ticks = result.total_ticks,
        "skirmish-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn load_bot(
    library: &BotLibrary,
    config: &MatchConfig,
    base: &Path,
    agent: AgentId,
) -> Result<skirmish_core::author::GeneratedBot, EngineError> {
    let entry = config.bots.entry(agent);
    let bot = library
        .load(entry, base)
        .await
        .map_err(|source| EngineError::Bot { agent, source })?;
    info!(agent = %agent, bot = %bot.name, style = %bot.style, "Bot loaded");
    Ok(bot)
}

async fn init_sandbox(
    agent: AgentId,
    source: &str,
    limits: &SandboxLimits,
) -> Result<AgentSandbox, EngineError> {
    AgentSandbox::initialize(agent, source, limits.clone())
        .await
        .map_err(|source| EngineError::Sandbox { agent, source })
}

// Pairpick entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the HTTP candidate source and the comparison session
// 4. Run the console on stdin/stdout until `quit` or end of input
// 5. Clear the session on exit

use pairpick_app::api::HttpCandidateSource;
use pairpick_app::config;
use pairpick_app::console;
use pairpick_core::{ComparisonSession, PollKey};

use anyhow::Context;
use directories::ProjectDirs;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    let log_path = init_tracing()?;
    info!("Pairpick starting up, logging to {}", log_path.display());

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, batch_limit={}, default_poll={}",
        config.api.base_url, config.api.batch_limit, config.session.default_poll
    );

    // 3. Build the candidate source and session
    let source = HttpCandidateSource::from_config(&config)
        .context("failed to build candidate source")?;
    if source.is_authenticated() {
        info!("API token configured");
    } else {
        info!("No API token configured, requests are anonymous");
    }
    let mut session = ComparisonSession::new(source);

    // 4. Run the console
    let poll = PollKey::from(config.session.default_poll.trim());
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let last_poll = console::run(&mut session, poll, stdin, stdout)
        .await
        .context("console failed")?;

    // 5. Cleanup
    session.logout();
    info!("Pairpick shut down cleanly (last poll {})", last_poll);
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the
/// console). Returns the log file path.
fn init_tracing() -> anyhow::Result<std::path::PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = match ProjectDirs::from("org", "pairpick", "pairpick") {
        Some(dirs) => dirs.data_dir().join("logs"),
        None => std::env::current_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("pairpick.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pairpick=info,pairpick_app=info,pairpick_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}

use std::sync::Arc;

use ab_domain::config::Config;
use ab_engine::rate_limiter::RateLimiter;
use ab_engine::session_lock::SingleSessionLock;
use ab_engine::watcher::{install_shutdown_signal, Watcher};
use ab_tracker::{ReqwestTrackerClient, TrackerClient};

/// Run the watch loop for the configured (or overridden) session.
///
/// Acquires the single-session lock (printing and exiting cleanly rather
/// than erroring if another process already holds it), locates the
/// journal file, then hands off to the watcher's cooperative event loop
/// until a shutdown signal arrives.
pub async fn run(config: &Config, session_override: Option<String>) -> anyhow::Result<()> {
    let session_id = session_override
        .or_else(|| config.session.session_id.clone())
        .ok_or_else(|| anyhow::anyhow!("no session id: pass --session or set [session].session_id"))?;

    let lock = SingleSessionLock::system();
    let Some(_guard) = lock.acquire(&session_id) else {
        println!("session {session_id} is already being watched by another process");
        return Ok(());
    };

    let journal_root = config
        .session
        .journal_root
        .clone()
        .or_else(|| dirs::home_dir().map(|h| h.join(".claude").join("projects")))
        .ok_or_else(|| anyhow::anyhow!("could not resolve journal root: no $HOME"))?;

    let token = std::env::var(&config.tracker.api_token_env).ok();
    let tracker: Arc<dyn TrackerClient> = Arc::new(ReqwestTrackerClient::new(
        config.tracker.base_url.clone(),
        token,
        std::time::Duration::from_millis(config.tracker.timeout_ms),
    )?);

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.per_second,
        config.rate_limit.burst,
    ));
    let cursor_store = ab_engine::cursor_store::CursorStore::system();
    let stopping = install_shutdown_signal();

    // The session file may not exist yet if the agent process hasn't
    // written its first journal line. Sleep and retry at the idle poll
    // cadence rather than giving up, bailing out early only on shutdown.
    let watcher = loop {
        if let Some(watcher) = Watcher::start(
            session_id.clone(),
            &journal_root,
            tracker.clone(),
            rate_limiter.clone(),
            cursor_store.clone(),
            config.poll.clone(),
        )? {
            break watcher;
        }
        if stopping.load(std::sync::atomic::Ordering::Relaxed) {
            println!("no journal file found yet for session {session_id}; shutting down");
            return Ok(());
        }
        tracing::debug!(session_id, "awaiting session journal file");
        tokio::time::sleep(std::time::Duration::from_millis(config.poll.idle_poll_ms)).await;
    };

    tracing::info!(session_id, "watcher starting");
    watcher.run(stopping).await?;

    Ok(())
}

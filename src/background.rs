//! Background tickers (C11, §4.10): periodic sweeps that run independent
//! of any single HTTP request, on their own `tokio::spawn`ed tasks. Each
//! loop owns nothing; they all reach into the same registries a handler
//! would, through the shared `AppState`.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::match_channel_name;
use crate::codec::builders;
use crate::multiplayer::codec as match_codec;
use crate::presence;
use crate::router;
use crate::state::AppState;

/// No packet/HTTP contact for this long schedules a session for logout
/// (§3 Session lifecycle, §4.2 Eviction).
const TIMEOUT: Duration = Duration::from_secs(120);
/// How often the timeout sweep runs (§4.10).
const TIMEOUT_SWEEP_INTERVAL: Duration = Duration::from_secs(15);
/// How often idle (zero-occupied-slot) matches are reaped (§4.10).
const MATCH_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Spawns the three steady-state tickers (timeout sweep, spam-counter
/// reset, match cleanup). The scheduled-restart loop is started
/// separately by [`run_restart_on_signal`] since it needs the graceful
/// shutdown handle, not just the app state.
pub fn spawn_tickers(state: Arc<AppState>) {
    tokio::spawn(timeout_sweep(state.clone()));
    tokio::spawn(spam_counter_reset(state.clone()));
    tokio::spawn(match_cleanup(state));
}

/// Destroys any session that hasn't made contact in `TIMEOUT` (§4.10).
async fn timeout_sweep(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(TIMEOUT_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        for session in state.sessions.all() {
            if session.idle_for() >= TIMEOUT {
                log::info!("timing out idle session for {}", session.username);
                router::force_logout(&state, &session);
            }
        }
    }
}

/// Resets every session's spam counter to zero every
/// `silence.window_seconds` (§4.4, §4.10).
async fn spam_counter_reset(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.silence.window_seconds.max(1)));
    loop {
        ticker.tick().await;
        for session in state.sessions.all() {
            session.spam_counter.store(0, Ordering::Release);
        }
    }
}

/// Disposes any match with zero occupied slots that lingered through a
/// race (§4.6 Leave normally disposes a match itself; this is the
/// backstop for the case the design note calls out explicitly).
async fn match_cleanup(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(MATCH_CLEANUP_INTERVAL);
    loop {
        ticker.tick().await;
        for m in state.matches.all() {
            let occupied = m.with_state(|s| s.slots.iter().filter(|slot| slot.status.has_player()).count());
            if occupied > 0 {
                continue;
            }

            let match_id = m.id;
            log::info!("reaping idle match {match_id}");
            state.matches.remove(match_id);
            state.streams.remove_stream(&format!("multi/{match_id}"));
            state.streams.remove_stream(&format!("multi/{match_id}/playing"));
            state.channels.remove(&match_channel_name(match_id));
            state.streams.broadcast(&state.sessions, "lobby", match_codec::dispose_match(match_id), None);
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or, on Unix, `SIGTERM`), then runs
/// the scheduled-restart sequence: broadcast `server_restart` on `main`,
/// wait `countdown`, then return so the caller can let `axum::serve`'s
/// graceful shutdown finish in-flight requests and exit (§4.10).
pub async fn run_restart_on_signal(state: Arc<AppState>, countdown: Duration) {
    wait_for_shutdown_signal().await;

    log::info!("restart requested, broadcasting countdown of {countdown:?}");
    state.restarting.store(true, Ordering::Release);

    let ms = (countdown.as_millis() as i32).saturating_mul(2);
    state.streams.broadcast(&state.sessions, presence::MAIN_STREAM, builders::server_restart(ms), None);

    tokio::time::sleep(countdown).await;
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).expect("installing a SIGTERM handler never fails");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = terminate.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

pub mod audio;
pub mod progress;
pub mod rewards;
pub mod session;
pub mod settings;
pub mod timer;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::sync::broadcast::error::RecvError;

use audio::{AudioEngineHandle, ChimeCue};
use rewards::RewardDispenser;
use session::AppSession;
use settings::{ChimeSettings, SettingsStore};
use timer::{TimerEvent, TimerPhase};

pub use progress::{ProgressSnapshot, ProgressTracker};
pub use rewards::{Inventory, Reward, RewardColor};
pub use timer::{IntervalTimer, TimerSnapshot};

const SETTINGS_ENV: &str = "LOOTIMER_SETTINGS";

fn settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lootimer-settings.json"))
}

/// Headless session: spin once, equip the prize, run one three-phase timer.
///
/// Arguments are the Initial, Break and Final durations in seconds, taken as
/// raw text like the timer's input fields. `--mute` and `--unmute` toggle the
/// completion chime in the settings file instead.
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("lootimer starting up...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run_session(&args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn chime_toggle(args: &[String]) -> Option<bool> {
    match args.first().map(String::as_str) {
        Some("--mute") => Some(false),
        Some("--unmute") => Some(true),
        _ => None,
    }
}

fn run_session(args: &[String]) -> Result<()> {
    let settings = SettingsStore::new(settings_path())?;

    if let Some(enabled) = chime_toggle(args) {
        settings.update_chime(ChimeSettings {
            enabled,
            ..settings.chime()
        })?;
        info!("Completion chime {}", if enabled { "enabled" } else { "muted" });
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        let chime = settings.chime();
        let cue = Arc::new(ChimeCue::new(AudioEngineHandle::new(), chime.clone()));
        let mut session = AppSession::new(RewardDispenser::new(), cue)
            .with_tick_interval(settings.timer().tick_interval());

        let spin = session.spin();
        info!("Loot box: {}", spin.message());
        if let Some(reward) = spin.reward {
            session.select_reward(reward.color).await;
        }

        let timer = session.open_timer().await;
        let field = |index: usize| args.get(index).map(String::as_str).unwrap_or("");
        for (index, phase) in [TimerPhase::Initial, TimerPhase::Break, TimerPhase::Final]
            .into_iter()
            .enumerate()
        {
            timer.configure_from_input(phase, "0", field(index)).await;
        }

        let mut events = timer.subscribe();
        if !timer.start().await.is_running {
            warn!("Initial phase has no duration; nothing to run");
            return Ok(());
        }

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(TimerEvent::Finished { experience_gained, fill_color, .. }) => {
                        info!(
                            "Timer finished! +{experience_gained:.2} xp, screen fills {}",
                            fill_color.as_str()
                        );
                        // Let the chime ring out before the runtime shuts down.
                        tokio::time::sleep(Duration::from_millis(chime.duration_ms)).await;
                        break;
                    }
                    Ok(TimerEvent::PhaseAdvanced { to, running: false, .. }) => {
                        warn!("{} phase has no duration; stopping", to.as_str());
                        break;
                    }
                    Ok(event) => debug!("{event:?}"),
                    Err(RecvError::Lagged(skipped)) => warn!("missed {skipped} timer events"),
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    let snapshot = timer.stop().await;
                    info!(
                        "Stopped in {} phase with {}s left",
                        snapshot.phase.as_str(),
                        snapshot.remaining_seconds
                    );
                    break;
                }
            }
        }

        let progress = session.progress().await;
        info!(
            "Level {} ({:.2} xp, {:.0}% of next level)",
            progress.level,
            progress.experience,
            progress.level_progress * 100.0
        );
        Ok(())
    })
}

//! Scripted ringing session against mock devices.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use dawnlock_alarm::{AlarmRuntime, AppEvent, RuntimeConfig, RuntimeHandle, SessionState};
use dawnlock_core::{TagId, TriggerId};
use dawnlock_platform::mock::{MockHandles, mock_services};
use dawnlock_platform::{LockStatus, SystemClock};
use dawnlock_storage::{PreferenceStore, Preferences};
use tokio::time::{sleep, timeout};
use tracing::info;

const VIEW_WIDTH: usize = 40;

/// What happens after the trigger fires. Delays are seconds after the
/// previous step.
#[derive(Args, Debug, Clone)]
pub struct Script {
    /// Unlock the device after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub unlock_after: Option<u64>,

    /// Present a tag this many seconds after unlocking.
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub scan_after: u64,

    /// Tag to present, in hex. Needs --unlock-after.
    #[arg(long, value_name = "TAG")]
    pub scan: Option<String>,

    /// Hold the emergency override once unlocked.
    #[arg(long)]
    pub hold_emergency: bool,

    /// Press snooze two seconds after ringing starts.
    #[arg(long)]
    pub snooze: bool,

    /// Give up and stop the session after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 180)]
    pub max_secs: u64,
}

pub async fn run<S: PreferenceStore>(
    prefs: Preferences<S>,
    config: RuntimeConfig,
    script: Script,
) -> anyhow::Result<()> {
    let scan = script
        .scan
        .as_deref()
        .map(str::parse::<TagId>)
        .transpose()
        .context("invalid --scan tag")?;

    let (services, devices) = mock_services(SystemClock, LockStatus::Locked);
    let (runtime, app) = AlarmRuntime::new(services, prefs, config)?;

    let (ran, played, ()) = tokio::join!(
        runtime.run(),
        play(&app, &devices, &script, scan),
        print_views(&app),
    );
    ran?;
    played?;

    match devices.timer.armed(TriggerId::WAKE) {
        Some(at) => println!("Next trigger armed for {}", at.format("%a %d %b %H:%M:%S")),
        None => println!("No trigger armed"),
    }
    Ok(())
}

/// Drive the script, then shut the runtime down whatever happened.
async fn play(
    app: &RuntimeHandle,
    devices: &MockHandles,
    script: &Script,
    scan: Option<TagId>,
) -> anyhow::Result<()> {
    let played = drive(app, devices, script, scan).await;
    app.send(AppEvent::Shutdown).await?;
    played
}

async fn drive(
    app: &RuntimeHandle,
    devices: &MockHandles,
    script: &Script,
    scan: Option<TagId>,
) -> anyhow::Result<()> {
    app.send(AppEvent::TriggerFired(TriggerId::WAKE)).await?;

    let steps = async {
        if script.snooze {
            sleep(Duration::from_secs(2)).await;
            info!("Pressing snooze");
            app.send(AppEvent::SnoozePressed).await?;
        }
        if let Some(secs) = script.unlock_after {
            sleep(Duration::from_secs(secs)).await;
            info!("Unlocking device");
            devices.lock_screen.unlock();

            if script.hold_emergency {
                app.send(AppEvent::EmergencyPressed).await?;
            }
            if let Some(tag) = scan.clone() {
                sleep(Duration::from_secs(script.scan_after)).await;
                info!(%tag, "Presenting tag");
                if !devices.tag_reader.present(tag).await? {
                    println!("Tag reader was off, scan dropped");
                }
            }
        }
        anyhow::Ok(())
    };

    let mut sessions = app.sessions();
    let ended = async {
        steps.await?;
        sessions
            .wait_for(|s| s.state == SessionState::Stopped)
            .await
            .context("runtime exited early")?;
        anyhow::Ok(())
    };

    let limit = Duration::from_secs(script.max_secs);
    if timeout(limit, ended).await.is_err() {
        println!("Still ringing after {}s, stopping", script.max_secs);
        app.send(AppEvent::StopRequested).await?;
    }
    Ok(())
}

/// Print each distinct rendering until the runtime goes away.
async fn print_views(app: &RuntimeHandle) {
    let mut views = app.views();
    let mut last = Vec::new();
    while views.changed().await.is_ok() {
        let lines = views.borrow_and_update().render_lines(VIEW_WIDTH);
        if lines != last {
            println!("+{}+", "-".repeat(VIEW_WIDTH));
            for line in &lines {
                println!("|{line}|");
            }
            println!("+{}+", "-".repeat(VIEW_WIDTH));
            last = lines;
        }
    }
}

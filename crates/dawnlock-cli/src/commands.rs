//! Preference administration subcommands.
//!
//! There is no host alarm service behind the CLI, so triggers are armed on a
//! mock timer and the armed instant is printed instead.

use anyhow::Context;
use dawnlock_alarm::{AlarmSetup, LaunchRouter, Route, RuntimeConfig, Scheduler, SetupOutcome};
use dawnlock_core::{AlarmTime, TagId};
use dawnlock_platform::mock::MockTimer;
use dawnlock_platform::{Clock, SystemClock};
use dawnlock_storage::{PreferenceStore, Preferences};

fn scheduler(config: &RuntimeConfig) -> Scheduler<MockTimer> {
    let (timer, _handle) = MockTimer::new();
    Scheduler::new(timer, &config.scheduler)
}

fn report(outcome: SetupOutcome) {
    match outcome {
        SetupOutcome::Scheduled { at, message } => {
            println!("{message}");
            println!("Next ring: {}", at.format("%a %d %b %H:%M %:z"));
        }
        SetupOutcome::PermissionRequired => {
            println!("Exact alarm permission required, nothing armed");
        }
        SetupOutcome::NothingToEnable => println!("No alarm time saved"),
    }
}

pub async fn set<S: PreferenceStore>(
    prefs: &Preferences<S>,
    config: &RuntimeConfig,
    time: &str,
) -> anyhow::Result<()> {
    let time: AlarmTime = time
        .parse()
        .with_context(|| format!("invalid alarm time {time:?}, expected HH:MM"))?;
    let mut scheduler = scheduler(config);
    let outcome = AlarmSetup::new(&mut scheduler, prefs)
        .configure(time, SystemClock.now())
        .await?;
    report(outcome);
    Ok(())
}

pub async fn enable<S: PreferenceStore>(
    prefs: &Preferences<S>,
    config: &RuntimeConfig,
) -> anyhow::Result<()> {
    let mut scheduler = scheduler(config);
    let outcome = AlarmSetup::new(&mut scheduler, prefs)
        .enable(SystemClock.now())
        .await?;
    report(outcome);
    Ok(())
}

pub async fn disable<S: PreferenceStore>(
    prefs: &Preferences<S>,
    config: &RuntimeConfig,
) -> anyhow::Result<()> {
    let mut scheduler = scheduler(config);
    AlarmSetup::new(&mut scheduler, prefs).disable().await?;
    println!("Alarm disabled");
    Ok(())
}

pub async fn status<S: PreferenceStore>(
    prefs: &Preferences<S>,
    config: &RuntimeConfig,
) -> anyhow::Result<()> {
    let mut scheduler = scheduler(config);
    let status = AlarmSetup::new(&mut scheduler, prefs)
        .status(SystemClock.now())
        .await?;
    let tag = prefs.registered_tag().await?;

    println!("Alarm:   {} ({})", status.saved_time, on_off(status.enabled));
    println!("         {}", status.countdown);
    match tag {
        Some(tag) => println!("Tag:     {tag}"),
        None => println!("Tag:     none registered"),
    }
    Ok(())
}

pub async fn register_tag<S: PreferenceStore>(
    prefs: &Preferences<S>,
    tag: &str,
) -> anyhow::Result<()> {
    let tag: TagId = tag
        .parse()
        .with_context(|| format!("invalid tag id {tag:?}"))?;
    prefs.register_tag(&tag).await?;
    println!("Registered tag {tag}");
    Ok(())
}

pub async fn clear_tag<S: PreferenceStore>(prefs: &Preferences<S>) -> anyhow::Result<()> {
    prefs.clear_tag().await?;
    println!("Tag cleared");
    Ok(())
}

pub async fn route<S: PreferenceStore>(prefs: &Preferences<S>) -> anyhow::Result<()> {
    let route = LaunchRouter::resolve(prefs).await?;
    println!("{}", route_name(route));
    Ok(())
}

fn route_name(route: Route) -> &'static str {
    match route {
        Route::Dismissal => "dismissal",
        Route::Onboarding => "onboarding",
        Route::Home => "home",
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

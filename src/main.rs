mod alarm;
mod cli;
mod config;
mod control;
mod core;
mod notify;
mod prelude;
mod sysfs;
mod tables;

use std::sync::Arc;

use chrono::Local;
use clap::{Parser, crate_version};
use tokio::sync::mpsc;

use crate::{
    alarm::{AlarmSource, FixedAlarm},
    cli::{Args, Command, DebugCommand, DebugDumpArgs, DebugProbeArgs, DebugWindowArgs, WatchArgs},
    config::FileStore,
    control::ChargingControl,
    core::{event::Event, provider, supervisor::Supervisor, window::ChargeWindow},
    notify::LogNotifications,
    prelude::*,
    sysfs::{PowerSupplyPoller, RtcWakeAlarm, SysfsChargingControl},
    tables::{build_capabilities_table, build_window_table},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Watch(args) => watch(*args).await,
        Command::Debug(args) => match args.command {
            DebugCommand::Probe(args) => debug_probe(&args),
            DebugCommand::Window(args) => debug_window(&args),
            DebugCommand::Dump(args) => debug_dump(*args),
        },
    }
}

#[instrument(skip_all)]
async fn watch(args: WatchArgs) -> Result {
    let store = FileStore::load(&args.settings)?;
    let control: Arc<dyn ChargingControl> =
        Arc::new(SysfsChargingControl::new(&args.platform.battery_dir));

    let supervisor = Supervisor::builder()
        .store(Box::new(store))
        .alarm(Box::new(RtcWakeAlarm::new(&args.platform.wakealarm)))
        .notifications(Box::new(LogNotifications::default()))
        .maybe_provider(provider::probe(&control))
        .defaults(args.defaults)
        .build();

    let (events, receiver) = mpsc::channel(64);
    tokio::spawn(
        PowerSupplyPoller::new(
            args.platform.battery_dir.clone(),
            args.platform.mains_dir.clone(),
            args.platform.poll_interval(),
            events.clone(),
        )
        .run(),
    );
    tokio::spawn(forward_signals(events));

    let supervisor = supervisor.run(receiver).await?;
    println!("{}", supervisor.dump());
    Ok(())
}

/// Translate Unix signals into supervisor events: SIGHUP re-reads the settings,
/// SIGUSR1 cancels charging control once, SIGINT and SIGTERM shut down.
async fn forward_signals(events: mpsc::Sender<Event>) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut hangup, mut user_defined_1, mut terminate) = match (
        signal(SignalKind::hangup()),
        signal(SignalKind::user_defined1()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(hangup), Ok(user_defined_1), Ok(terminate)) => (hangup, user_defined_1, terminate),
        _ => {
            error!("failed to install the signal handlers");
            return;
        }
    };

    loop {
        let event = tokio::select! {
            _ = hangup.recv() => Event::SettingsChanged,
            _ = user_defined_1.recv() => Event::CancelOnce,
            _ = terminate.recv() => Event::Shutdown,
            _ = tokio::signal::ctrl_c() => Event::Shutdown,
        };
        if events.send(event).await.is_err() || event == Event::Shutdown {
            return;
        }
    }
}

fn debug_probe(args: &DebugProbeArgs) -> Result {
    let control: Arc<dyn ChargingControl> =
        Arc::new(SysfsChargingControl::new(&args.platform.battery_dir));
    match control.capabilities() {
        Ok(capabilities) => println!("{}", build_capabilities_table(capabilities)),
        Err(error) => warn!("the control mechanism cannot be probed: {error:#}"),
    }
    match provider::probe(&control) {
        Some(provider) => println!("{}", provider.dump()),
        None => println!("Charging control is not supported on this platform."),
    }
    Ok(())
}

fn debug_window(args: &DebugWindowArgs) -> Result {
    let window = ChargeWindow::compute(
        args.mode,
        Local::now(),
        args.start_time,
        args.target_time,
        args.alarm,
    );
    match window {
        Some(window) => println!("{}", build_window_table(&window)),
        None => println!("No charge window for the given inputs."),
    }
    Ok(())
}

fn debug_dump(args: DebugDumpArgs) -> Result {
    let store = FileStore::load(&args.settings)?;
    let control: Arc<dyn ChargingControl> =
        Arc::new(SysfsChargingControl::new(&args.platform.battery_dir));
    let alarm: Box<dyn AlarmSource> = match args.alarm {
        Some(wake) => Box::new(FixedAlarm(Some(wake))),
        None => Box::new(RtcWakeAlarm::new(&args.platform.wakealarm)),
    };
    let supervisor = Supervisor::builder()
        .store(Box::new(store))
        .alarm(alarm)
        .notifications(Box::new(LogNotifications::default()))
        .maybe_provider(provider::probe(&control))
        .defaults(args.defaults)
        .build();
    println!("{}", supervisor.dump());
    Ok(())
}

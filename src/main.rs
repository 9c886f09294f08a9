use std::time::Duration;

use clap::Parser;
use log::{error, warn};

use immich_geodata::cli::Args;
use immich_geodata::config::Settings;
use immich_geodata::install::{self, WorkDir};

/// Conventional exit status after SIGINT (128 + 2)
const EXIT_INTERRUPTED: i32 = 130;

/// How long blocking copy/extract tasks may keep running after an interrupt
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn main() {
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Exits with status 2 and names the argument on unknown flags
    let args = Args::parse();
    let settings = match Settings::try_from(args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };

    // Owned here so it is dropped after the runtime has stopped writing to it
    let mut work: Option<WorkDir> = None;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        tokio::select! {
            result = install::run(&settings, &mut work) => match result {
                Ok(_) => 0,
                Err(e) => {
                    error!("{e:#}");
                    1
                }
            },
            (signal, status) = shutdown_signal() => {
                warn!("Interrupted by {signal}, cleaning up");
                status
            }
        }
    });

    rt.shutdown_timeout(SHUTDOWN_GRACE);
    drop(work);
    std::process::exit(code);
}

/// Resolve on the first terminating signal, with its name and exit status
///
/// Unix: SIGINT, SIGTERM, SIGHUP and SIGQUIT, each exiting with 128 + signo.
async fn shutdown_signal() -> (&'static str, i32) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let listen = |kind: SignalKind, name: &str| match signal(kind) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("Could not listen for {name}: {e}");
                None
            }
        };
        let mut term = listen(SignalKind::terminate(), "SIGTERM");
        let mut hup = listen(SignalKind::hangup(), "SIGHUP");
        let mut quit = listen(SignalKind::quit(), "SIGQUIT");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => ("SIGINT", EXIT_INTERRUPTED),
            _ = recv(&mut term) => ("SIGTERM", 128 + signo::SIGTERM),
            _ = recv(&mut hup) => ("SIGHUP", 128 + signo::SIGHUP),
            _ = recv(&mut quit) => ("SIGQUIT", 128 + signo::SIGQUIT),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        ("Ctrl-C", EXIT_INTERRUPTED)
    }
}

/// Wait on a signal stream; never resolves when the stream could not be set up
#[cfg(unix)]
async fn recv(stream: &mut Option<tokio::signal::unix::Signal>) {
    match stream {
        Some(stream) => {
            stream.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(unix)]
mod signo {
    use nix::sys::signal::Signal;

    pub const SIGTERM: i32 = Signal::SIGTERM as i32;
    pub const SIGHUP: i32 = Signal::SIGHUP as i32;
    pub const SIGQUIT: i32 = Signal::SIGQUIT as i32;
}

//! Download-only and download + install runners
//!
//! Fetching is fail-fast: any error from tag resolution, download or
//! extraction returns immediately. Installing is per target: a missing
//! extracted directory is reported and the other target still proceeds.

use std::io::Write;

use anyhow::{Context, Result};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::detection;
use super::download::{self, ReleaseTag};
use super::targets::{self, TargetOutcome, TargetReport};
use super::workdir::WorkDir;
use crate::config::Settings;

fn say(out: &mut StandardStream, color: Color, bold: bool, msg: &str) {
    let _ = out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = writeln!(out, "{msg}");
    let _ = out.reset();
}

/// Resolve the tag, prepare the working directory, then download and extract
async fn fetch<'w>(
    settings: &Settings,
    slot: &'w mut Option<WorkDir>,
    out: &mut StandardStream,
) -> Result<&'w WorkDir> {
    let tag = ReleaseTag::parse(&settings.tag);
    let client = download::http_client().context("Failed to build HTTP client")?;

    say(out, Color::Cyan, false, &format!("🔍 Resolving release {tag}..."));
    let url = download::resolve_download_url(&client, settings, &tag).await?;
    let _ = writeln!(out, "   Download URL: {url}");

    let work = slot.insert(WorkDir::for_settings(settings)?);

    say(out, Color::Cyan, false, "📥 Downloading release archive...");
    let archive = download::download_archive(&client, &url, work.path()).await?;

    say(out, Color::Cyan, false, "📦 Extracting...");
    download::extract_archive(&archive, work.path()).await?;
    say(out, Color::Green, false, "✓ Release extracted\n");
    Ok(work)
}

/// Run the whole pipeline
///
/// The working directory is stored in `slot`, which the caller owns, so it
/// is removed only after any cancelled blocking task has stopped using it.
pub async fn run(settings: &Settings, slot: &mut Option<WorkDir>) -> Result<Vec<TargetReport>> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    say(&mut stdout, Color::Cyan, true, "🗺  Immich geodata installer");

    let work = fetch(settings, slot, &mut stdout).await?;

    if !settings.install {
        say(&mut stdout, Color::Green, true, "✅ Download complete");
        let _ = writeln!(
            stdout,
            "   Files are in {} (run with --install to install them)",
            work.path().display()
        );
        return Ok(Vec::new());
    }

    let host = detection::detect_host(settings)?;
    let _ = writeln!(stdout, "📍 Manifest: {}", host.manifest.display());
    let _ = writeln!(stdout, "   Layout: {}", host.layout);
    let _ = writeln!(stdout, "   Immich version: {}\n", host.version);

    let plan = targets::plan_targets(settings, host.layout, work.path());
    let owner = settings.owner;
    say(&mut stdout, Color::Cyan, false, "📦 Installing...");
    let reports = tokio::task::spawn_blocking(move || targets::install_all(&plan, owner))
        .await
        .context("Install task panicked")??;

    report(&mut stdout, &reports);
    Ok(reports)
}

fn report(out: &mut StandardStream, reports: &[TargetReport]) {
    for r in reports {
        match &r.outcome {
            TargetOutcome::Installed { backup: Some(bak) } => say(
                out,
                Color::Green,
                false,
                &format!(
                    "✓ {} installed (backup at {})",
                    r.path.display(),
                    bak.display()
                ),
            ),
            TargetOutcome::Installed { backup: None } => {
                say(out, Color::Green, false, &format!("✓ {} installed", r.path.display()))
            }
            TargetOutcome::SourceMissing { source } => {
                let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                say(
                    &mut stderr,
                    Color::Red,
                    true,
                    &format!(
                        "❌ {} skipped: extracted directory {} is missing",
                        r.path.display(),
                        source.display()
                    ),
                );
            }
        }
    }

    let installed = reports.iter().filter(|r| r.is_installed()).count();
    if installed == reports.len() {
        say(out, Color::Green, true, "\n✅ Installation complete");
    } else {
        say(
            out,
            Color::Yellow,
            true,
            &format!("\n⚠ Installed {installed} of {} targets", reports.len()),
        );
    }
}

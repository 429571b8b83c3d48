//! Viewfinder - color-managed camera preview and capture
//!
//! Runs the preview headless: a synthetic camera feeds the renderer, which
//! draws every refresh through the grading pipeline and services capture
//! requests. Captures are developed at full resolution, cropped to the
//! framing guide and written to the output directory.

mod capture_sink;
mod config;
mod source;

use anyhow::{Context, Result};
use capture_sink::CaptureSink;
use config::AppConfig;
use source::SyntheticCamera;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use viewfinder_color::{Grading, LutLoader};
use viewfinder_gpu::GpuContext;
use viewfinder_render::{
    CaptureTicket, JobQueue, LatestFrame, RenderOutcome, Renderer, WgpuBackend,
};

fn main() -> Result<()> {
    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--init-config") {
        let path = AppConfig::default_path().context("no platform config directory")?;
        AppConfig::default().save_to_file(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Config path from the command line, else the platform config dir
    let config = match arg.map(PathBuf::from) {
        Some(path) => AppConfig::load_from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load_or_default()?,
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Viewfinder starting...");

    let grading: Grading = match &config.lut_path {
        Some(path) => {
            let lut = LutLoader::load(path);
            if lut.is_none() {
                warn!(path = %path.display(), "LUT unusable, previewing ungraded");
            }
            lut.into()
        }
        None => Grading::Identity,
    };

    let ctx = GpuContext::new_blocking()?;
    let backend = WgpuBackend::headless(ctx, config.viewport, &grading)?;

    let latest = Arc::new(LatestFrame::new());
    let mut renderer = Renderer::new(backend, latest.clone());
    let camera = SyntheticCamera::start(latest, config.sensor, config.frame_rate)?;
    let mut sink = CaptureSink::new(&config.output_dir, config.framing(), grading)?;

    // Capture results are delivered here and drained once per refresh.
    let jobs = JobQueue::new();
    let mut tickets: Vec<CaptureTicket> = Vec::new();
    let capture_every = config.capture_interval();
    let mut requested = 0;

    let refresh = crossbeam_channel::tick(Duration::from_secs_f32(1.0 / config.refresh_rate));
    for n in 1..=config.refresh_count {
        refresh.recv()?;

        if requested < config.captures && n % capture_every == 0 {
            match renderer.request_capture(config.orientation, jobs.executor()) {
                Ok(ticket) => {
                    tickets.push(ticket);
                    requested += 1;
                }
                Err(e) => warn!("Capture request rejected: {}", e),
            }
        }

        let outcome = renderer.render();
        if outcome == RenderOutcome::Dropped {
            warn!(refresh = n, "Frame dropped");
        } else {
            trace!(refresh = n, ?outcome, "Refresh");
        }

        jobs.run_pending();
        drain_tickets(&mut tickets, &mut sink);
    }

    renderer.wait_idle();
    jobs.run_pending();
    drain_tickets(&mut tickets, &mut sink);
    if !tickets.is_empty() {
        warn!(pending = tickets.len(), "Exiting with captures still in flight");
    }

    let frames = camera.stop();
    let stats = renderer.stats();
    info!(
        frames,
        presented = stats.presented,
        dropped = stats.dropped,
        captures = sink.written(),
        output = %config.output_dir.display(),
        "Viewfinder finished"
    );
    Ok(())
}

/// Save every delivered capture, keeping tickets still in flight.
fn drain_tickets(tickets: &mut Vec<CaptureTicket>, sink: &mut CaptureSink) {
    tickets.retain_mut(|ticket| match ticket.try_recv() {
        Ok(Some(frame)) => {
            if let Err(e) = sink.save(&frame) {
                warn!("Failed to save capture: {:#}", e);
            }
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!("Capture lost: {}", e);
            false
        }
    });
}

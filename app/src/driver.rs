//! Builds an orchestrator from the command line and renders frames on the
//! dummy backend.

use std::error::Error;
use std::fmt::Write;
use std::sync::Arc;

use lumen_graphics::{
    ContributorFactory, ContributorKind, DummyBackend, FrameOrchestrator, FrameReport,
    GpuBackend,
};

use crate::DriverArgs;

/// What a driver run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames rendered.
    pub frames: u64,
    /// Frames whose report was degraded.
    pub degraded_frames: u64,
    /// Shared resources in the final plan.
    pub resources: usize,
    /// Approximate memory of the final plan, in bytes.
    pub resource_bytes: u64,
    /// Contributors in execution order.
    pub contributors: Vec<String>,
    /// Backend commands recorded over the whole run.
    pub commands: u64,
}

/// An orchestrator and the dummy backend it records on.
pub struct Session {
    pub backend: Arc<DummyBackend>,
    pub frames: FrameOrchestrator,
}

/// Build the orchestrator described by `args` without rendering.
pub fn build(args: &DriverArgs) -> Result<Session, Box<dyn Error>> {
    let backend = Arc::new(DummyBackend::new());
    let shared: Arc<dyn GpuBackend> = backend.clone();
    let factory = ContributorFactory::with_builtins();
    let mut frames =
        FrameOrchestrator::from_techniques(shared, args.window(), &factory, &args.techniques)?;

    if let Some(path) = &args.options {
        let applied = frames.options_mut().load_toml_file(path)?;
        log::info!("Applied {} option(s) from {}", applied, path.display());
    }
    for assignment in &args.overrides {
        frames.options_mut().apply_override(assignment)?;
    }
    frames.set_render_scale(args.render_scale);
    Ok(Session { backend, frames })
}

/// Render `args.frames` frames and shut down.
pub fn run(args: &DriverArgs) -> Result<RunSummary, Box<dyn Error>> {
    let mut session = build(args)?;
    render(&mut session, args)
}

/// Render `args.frames` frames of an existing session and shut it down.
///
/// The backend's command record is drained after every frame.
pub fn render(session: &mut Session, args: &DriverArgs) -> Result<RunSummary, Box<dyn Error>> {
    let frames = &mut session.frames;
    let mut summary = RunSummary {
        contributors: frames.contributor_names().map(str::to_string).collect(),
        ..RunSummary::default()
    };

    // Texture views only exist once the first plan is resolved.
    let mut pending_view = args.debug_view.as_deref();
    if let Some(view) = pending_view {
        if frames.set_debug_view(view).is_ok() {
            pending_view = None;
        }
    }

    for _ in 0..args.frames {
        let report = frames.render_frame();
        log_report(&report);
        summary.frames += 1;
        if report.is_degraded() {
            summary.degraded_frames += 1;
        }
        if let Some(view) = pending_view.take() {
            frames.set_debug_view(view)?;
        }
        let commands = session.backend.take_commands().len();
        log::trace!("Frame {}: {} backend command(s)", report.frame_index, commands);
        summary.commands += commands as u64;
    }

    summary.resources = frames.plan().len();
    summary.resource_bytes = frames.plan().byte_size();
    frames.shutdown();
    summary.commands += session.backend.take_commands().len() as u64;
    log::info!(
        "Rendered {} frame(s), {} degraded, {} shared resource(s) in {:.1} MiB",
        summary.frames,
        summary.degraded_frames,
        summary.resources,
        summary.resource_bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(summary)
}

fn log_report(report: &FrameReport) {
    if let Some(err) = &report.resolve_error {
        log::warn!("Frame {}: {}", report.frame_index, err);
    }
    log::debug!(
        "Frame {}: executed [{}]",
        report.frame_index,
        report.executed.join(", ")
    );
    if let Some(outcome) = report.outcome.as_ref().filter(|outcome| !outcome.is_unchanged()) {
        log::info!(
            "Frame {}: created {:?}, reallocated {:?}, destroyed {:?}",
            report.frame_index,
            outcome.created,
            outcome.reallocated,
            outcome.destroyed
        );
    }
}

/// Human-readable list of every registered contributor and its options.
pub fn catalog(factory: &ContributorFactory) -> Result<String, Box<dyn Error>> {
    let mut out = String::new();
    for (title, kind) in [
        ("Techniques", ContributorKind::Technique),
        ("Components", ContributorKind::Component),
    ] {
        writeln!(out, "{title}:")?;
        for name in factory.names() {
            if factory.kind_of(name) != Some(kind) {
                continue;
            }
            let contributor = factory.create(name)?;
            writeln!(out, "  {name}")?;
            for (option, default) in contributor.options().iter() {
                writeln!(out, "    {option} = {default}")?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_graphics::Extent2d;

    fn small() -> DriverArgs {
        DriverArgs {
            width: 64,
            height: 32,
            frames: 2,
            ..DriverArgs::default()
        }
    }

    #[test]
    fn test_run_default_pipeline() {
        let summary = run(&small()).unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.degraded_frames, 0);
        assert_eq!(
            summary.contributors,
            vec![
                "RandomNumberGenerator",
                "BlueNoiseSampler",
                "GBuffer",
                "TemporalUpscaler",
                "ToneMapping"
            ]
        );
        assert!(summary.resources >= 4);
        assert!(summary.resource_bytes >= 64 * 32 * 8);
    }

    #[test]
    fn test_backend_record_is_drained_every_frame() {
        let args = DriverArgs {
            frames: 4,
            ..small()
        };
        let mut session = build(&args).unwrap();

        let summary = render(&mut session, &args).unwrap();

        assert!(summary.commands > 0);
        assert!(session.backend.commands().is_empty());
        assert!(session.backend.stats().dispatches >= 8);
    }

    #[test]
    fn test_overrides_apply() {
        let args = DriverArgs {
            overrides: vec!["taa_enable=true".to_string(), "tonemap_operator=2".to_string()],
            render_scale: 0.5,
            ..small()
        };
        let frames = build(&args).unwrap().frames;

        assert_eq!(frames.options().get::<bool>("taa_enable"), Ok(true));
        assert_eq!(frames.options().get::<u8>("tonemap_operator"), Ok(2));
        assert_eq!(frames.render_dimensions(), Extent2d::new(32, 16));
    }

    #[test]
    fn test_options_file() {
        let path = std::env::temp_dir().join(format!("lumen-driver-{}.toml", std::process::id()));
        std::fs::write(&path, "taa_enable = true\nupscaler_sharpness = 0.25\n").unwrap();
        let args = DriverArgs {
            options: Some(path.clone()),
            ..small()
        };

        let frames = build(&args);
        std::fs::remove_file(&path).unwrap();
        let frames = frames.unwrap().frames;
        assert_eq!(frames.options().get::<bool>("taa_enable"), Ok(true));
        assert_eq!(frames.options().get::<f32>("upscaler_sharpness"), Ok(0.25));
    }

    #[test]
    fn test_errors_surface() {
        let unknown = DriverArgs {
            techniques: vec!["Bloom".to_string()],
            ..small()
        };
        assert!(run(&unknown).is_err());

        let bad_override = DriverArgs {
            overrides: vec!["taa_enable".to_string()],
            ..small()
        };
        assert!(run(&bad_override).is_err());

        let bad_view = DriverArgs {
            debug_view: Some("Nowhere".to_string()),
            ..small()
        };
        assert!(run(&bad_view).is_err());
    }

    #[test]
    fn test_texture_debug_view_after_first_frame() {
        let args = DriverArgs {
            debug_view: Some("Velocity".to_string()),
            ..small()
        };
        assert_eq!(run(&args).unwrap().frames, 2);
    }

    #[test]
    fn test_catalog_lists_options() {
        let catalog = catalog(&ContributorFactory::with_builtins()).unwrap();

        assert!(catalog.starts_with("Techniques:"));
        assert!(catalog.contains("  ToneMapping\n    tonemap_enable = true"));
        assert!(catalog.contains("Components:"));
        assert!(catalog.contains("random_seed"));
    }
}

use clap::Parser;
use lumen_app::{catalog, run, DriverArgs};
use lumen_graphics::ContributorFactory;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = DriverArgs::parse();
    if args.list {
        print!("{}", catalog(&ContributorFactory::with_builtins())?);
        return Ok(());
    }

    lumen_app::init();
    let summary = run(&args)?;
    if summary.degraded_frames > 0 {
        log::warn!(
            "{} of {} frame(s) were degraded",
            summary.degraded_frames,
            summary.frames
        );
    }
    Ok(())
}

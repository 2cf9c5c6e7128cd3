use std::any::Any;

use lumen_core::{OptionList, OptionRegistry};
use rand::Rng;

use super::{seeded_rng, upload_u32s};
use crate::backend::{BufferHandle, Dispatch, GpuBackend};
use crate::contributor::{Contributor, ContributorKind, FrameContext};
use crate::error::ContributorError;
use crate::types::Extent2d;

/// The seed buffer always covers at least this many pixels.
pub const MIN_SEED_DIMENSIONS: Extent2d = Extent2d::new(1920, 1080);

/// Per-pixel random seeds.
///
/// The buffer holds one `u32` per pixel of `max(render, 1920x1080)`. It is
/// regenerated when the options change or the render size outgrows it.
#[derive(Debug, Default)]
pub struct RandomNumberGenerator {
    seed_buffer: Option<BufferHandle>,
    capacity: u64,
}

impl RandomNumberGenerator {
    pub const NAME: &'static str = "RandomNumberGenerator";
    pub const DETERMINISTIC: &'static str = "random_deterministic";
    pub const SEED: &'static str = "random_seed";

    pub fn seed_buffer(&self) -> Option<BufferHandle> {
        self.seed_buffer
    }

    /// Number of seeds in the buffer.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Add the seed buffer to a dispatch.
    pub fn bind(&self, dispatch: Dispatch) -> Dispatch {
        match self.seed_buffer {
            Some(buffer) => dispatch.with_buffer("g_SeedBuffer", buffer),
            None => dispatch,
        }
    }

    fn generate(
        &mut self,
        backend: &dyn GpuBackend,
        options: &OptionRegistry,
        render: Extent2d,
    ) -> Result<(), ContributorError> {
        let count = render.max(MIN_SEED_DIMENSIONS).area();
        let deterministic = options.get_or(Self::DETERMINISTIC, false);
        let seed = options.get_or(Self::SEED, 0u32);

        let mut rng = seeded_rng(deterministic, seed);
        let seeds: Vec<u32> = (0..count).map(|_| rng.random()).collect();
        self.seed_buffer = Some(upload_u32s(backend, "RandomNumberGenerator_SeedBuffer", &seeds)?);
        self.capacity = count;
        log::debug!(
            "Generated {} seeds ({})",
            count,
            if deterministic { "deterministic" } else { "entropy" }
        );
        Ok(())
    }

    fn release(&mut self, backend: &dyn GpuBackend) {
        if let Some(buffer) = self.seed_buffer.take() {
            backend.destroy_buffer(buffer);
        }
        self.capacity = 0;
    }
}

impl Contributor for RandomNumberGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ContributorKind {
        ContributorKind::Component
    }

    fn options(&self) -> OptionList {
        OptionList::new()
            .with(Self::DETERMINISTIC, false)
            .with(Self::SEED, 0u32)
    }

    fn on_options_changed(&mut self, changed: &[String], options: &OptionRegistry) -> bool {
        changed.iter().any(|name| name == Self::DETERMINISTIC)
            || (options.get_or(Self::DETERMINISTIC, false)
                && changed.iter().any(|name| name == Self::SEED))
    }

    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        self.generate(ctx.backend(), ctx.options(), ctx.render_dimensions())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        let needed = ctx.render_dimensions().max(MIN_SEED_DIMENSIONS).area();
        if needed > self.capacity {
            let backend = ctx.backend();
            backend.wait_idle();
            self.release(backend);
            self.generate(backend, ctx.options(), ctx.render_dimensions())?;
        }
        Ok(())
    }

    fn terminate(&mut self, backend: &dyn GpuBackend) {
        self.release(backend);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    fn registry() -> OptionRegistry {
        let mut options = OptionRegistry::new();
        options
            .register_all(&RandomNumberGenerator::default().options())
            .unwrap();
        options
    }

    #[test]
    fn test_seed_buffer_covers_minimum() {
        let backend = DummyBackend::new();
        let mut rng = RandomNumberGenerator::default();
        rng.generate(&backend, &registry(), Extent2d::new(640, 360))
            .unwrap();
        assert_eq!(rng.capacity(), 1920 * 1080);
        let descriptor = backend.buffer_descriptor(rng.seed_buffer().unwrap()).unwrap();
        assert_eq!(descriptor.size, 1920 * 1080 * 4);

        rng.release(&backend);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_reinit_on_option_change() {
        let mut options = registry();
        let mut rng = RandomNumberGenerator::default();
        assert!(rng.on_options_changed(&[RandomNumberGenerator::DETERMINISTIC.to_string()], &options));
        assert!(!rng.on_options_changed(&[RandomNumberGenerator::SEED.to_string()], &options));
        options.set(RandomNumberGenerator::DETERMINISTIC, true).unwrap();
        assert!(rng.on_options_changed(&[RandomNumberGenerator::SEED.to_string()], &options));
    }
}

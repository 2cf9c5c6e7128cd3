use std::any::Any;

use lumen_core::{OptionList, OptionRegistry};
use rand::Rng;

use super::{seeded_rng, upload_u32s};
use crate::backend::{Binding, BufferHandle, Dispatch, GpuBackend};
use crate::contributor::{Contributor, ContributorKind, FrameContext};
use crate::error::ContributorError;

const SOBOL_ENTRIES: usize = 256 * 256;
const TILE_ENTRIES: usize = 128 * 128 * 8;

/// Low-discrepancy sample tables plus a per-run random seed.
///
/// Techniques bind the tables into their kernels with [`BlueNoiseSampler::bind`].
#[derive(Debug, Default)]
pub struct BlueNoiseSampler {
    sobol: Option<BufferHandle>,
    ranking: Option<BufferHandle>,
    scrambling: Option<BufferHandle>,
    random_seed: u32,
    seeded: Option<(bool, u32)>,
}

impl BlueNoiseSampler {
    pub const NAME: &'static str = "BlueNoiseSampler";
    pub const DETERMINISTIC: &'static str = "blue_noise_sampler_deterministic";
    pub const SEED: &'static str = "blue_noise_sampler_seed";

    /// Seed handed to kernels, refreshed when the options change.
    pub fn random_seed(&self) -> u32 {
        self.random_seed
    }

    /// Returns true while the sample tables are allocated.
    pub fn is_ready(&self) -> bool {
        self.sobol.is_some() && self.ranking.is_some() && self.scrambling.is_some()
    }

    /// Add the sampler's tables and seed to a dispatch.
    pub fn bind(&self, mut dispatch: Dispatch) -> Dispatch {
        for (param, buffer) in [
            ("g_SobolBuffer", self.sobol),
            ("g_RankingTile", self.ranking),
            ("g_ScramblingTile", self.scrambling),
        ] {
            if let Some(buffer) = buffer {
                dispatch = dispatch.with_buffer(param, buffer);
            }
        }
        dispatch.with_constant("g_RandomSeed", Binding::Uint(self.random_seed))
    }

    fn reseed(&mut self, options: &OptionRegistry) {
        let deterministic = options.get_or(Self::DETERMINISTIC, false);
        let seed = options.get_or(Self::SEED, 0u32);
        let changed = match self.seeded {
            None => true,
            Some((was_deterministic, old_seed)) => {
                was_deterministic != deterministic || (deterministic && old_seed != seed)
            }
        };
        if changed {
            self.random_seed = seeded_rng(deterministic, seed).random();
            self.seeded = Some((deterministic, seed));
            log::debug!("Blue noise seed is now {}", self.random_seed);
        }
    }
}

fn table(seed: u32, len: usize) -> Vec<u32> {
    let mut rng = seeded_rng(true, seed);
    (0..len).map(|_| rng.random()).collect()
}

impl Contributor for BlueNoiseSampler {
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

    fn init(&mut self, ctx: &FrameContext<'_>) -> Result<(), ContributorError> {
        let backend = ctx.backend();
        self.sobol = Some(upload_u32s(backend, "BlueNoiseSampler_Sobol", &table(1, SOBOL_ENTRIES))?);
        self.ranking = Some(upload_u32s(backend, "BlueNoiseSampler_Ranking", &table(2, TILE_ENTRIES))?);
        self.scrambling = Some(upload_u32s(
            backend,
            "BlueNoiseSampler_Scrambling",
            &table(3, TILE_ENTRIES),
        )?);
        self.reseed(ctx.options());
        Ok(())
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), ContributorError> {
        self.reseed(ctx.options());
        Ok(())
    }

    fn terminate(&mut self, backend: &dyn GpuBackend) {
        for buffer in [self.sobol.take(), self.ranking.take(), self.scrambling.take()]
            .into_iter()
            .flatten()
        {
            backend.destroy_buffer(buffer);
        }
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

    #[test]
    fn test_deterministic_seed_is_stable() {
        let mut options = OptionRegistry::new();
        options
            .register_all(&BlueNoiseSampler::default().options())
            .unwrap();
        options.set(BlueNoiseSampler::DETERMINISTIC, true).unwrap();
        options.set(BlueNoiseSampler::SEED, 42u32).unwrap();

        let mut a = BlueNoiseSampler::default();
        let mut b = BlueNoiseSampler::default();
        a.reseed(&options);
        b.reseed(&options);
        assert_eq!(a.random_seed(), b.random_seed());

        let before = a.random_seed();
        options.set(BlueNoiseSampler::SEED, 43u32).unwrap();
        a.reseed(&options);
        assert_ne!(a.random_seed(), before);
    }

    #[test]
    fn test_bind_without_tables_only_sets_seed() {
        let sampler = BlueNoiseSampler::default();
        let dispatch = sampler.bind(Dispatch::new(crate::backend::KernelHandle::from_raw(1), [1, 1, 1]));
        assert_eq!(dispatch.bindings.len(), 1);
        assert_eq!(dispatch.binding("g_RandomSeed"), Some(Binding::Uint(0)));
    }
}

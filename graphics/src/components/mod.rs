//! Built-in components: GPU utilities shared by techniques.

mod blue_noise_sampler;
mod random_number_generator;

pub use blue_noise_sampler::BlueNoiseSampler;
pub use random_number_generator::RandomNumberGenerator;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::{BackendError, BufferHandle, GpuBackend};
use crate::types::{BufferDescriptor, BufferUsage};

/// A generator seeded from `seed` when deterministic, from entropy otherwise.
pub(crate) fn seeded_rng(deterministic: bool, seed: u32) -> StdRng {
    if deterministic {
        StdRng::seed_from_u64(u64::from(seed))
    } else {
        StdRng::seed_from_u64(rand::rng().random())
    }
}

/// Create a storage buffer holding `values`.
pub(crate) fn upload_u32s(
    backend: &dyn GpuBackend,
    label: &str,
    values: &[u32],
) -> Result<BufferHandle, BackendError> {
    let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_le_bytes()).collect();
    let descriptor = BufferDescriptor::new(bytes.len() as u64, BufferUsage::STORAGE | BufferUsage::COPY_DST)
        .with_label(label);
    let buffer = backend.create_buffer(&descriptor)?;
    if let Err(err) = backend.write_buffer(buffer, 0, &bytes) {
        backend.destroy_buffer(buffer);
        return Err(err);
    }
    log::trace!("Uploaded {} ({} bytes)", label, bytes.len());
    Ok(buffer)
}

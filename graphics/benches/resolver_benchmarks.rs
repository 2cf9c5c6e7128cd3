use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lumen_core::OptionRegistry;
use lumen_graphics::{
    ContributorFactory, ContributorRequests, DummyBackend, Extent2d, FrameOrchestrator,
    GpuBackend, Require, ResourceFlags, ResourceResolver, SharedBuffer, SharedTexture,
    TextureFormat,
};

const HD: Extent2d = Extent2d::new(1920, 1080);

fn small_requests() -> Vec<ContributorRequests> {
    vec![
        ContributorRequests::new("GBuffer")
            .with_texture(SharedTexture::write("Color").with_flags(ResourceFlags::CLEAR))
            .with_texture(
                SharedTexture::write("VisibilityDepth").with_format(TextureFormat::Depth32Float),
            ),
        ContributorRequests::new("ToneMapping")
            .with_texture(SharedTexture::read_write("Color"))
            .with_buffer(SharedBuffer::read("Exposure").with_flags(ResourceFlags::OPTIONAL)),
        ContributorRequests::new("TemporalUpscaler")
            .with_texture(
                SharedTexture::write("ColorScaled")
                    .with_flags(ResourceFlags::OPTIONAL)
                    .with_require(Require::name("Color")),
            )
            .with_buffer(
                SharedBuffer::write("Exposure")
                    .with_size(16)
                    .with_flags(ResourceFlags::OPTIONAL_DISCARD),
            ),
    ]
}

/// `count` contributors, each writing its own texture and reading the one
/// written by its predecessor.
fn chained_requests(count: usize) -> Vec<ContributorRequests> {
    (0..count)
        .map(|i| {
            let mut requests = ContributorRequests::new(format!("technique_{i}"))
                .with_texture(SharedTexture::write(format!("target_{i}")))
                .with_buffer(SharedBuffer::write(format!("scratch_{i}")).with_size(256));
            if i > 0 {
                requests = requests.with_texture(
                    SharedTexture::read(format!("target_{}", i - 1))
                        .with_flags(ResourceFlags::OPTIONAL),
                );
            }
            requests
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn bench_resolve_small(c: &mut Criterion) {
    let options = OptionRegistry::new();
    let requests = small_requests();
    c.bench_function("resolve_small_first_frame", |b| {
        b.iter_with_setup(
            || (ResourceResolver::new(), DummyBackend::new()),
            |(mut resolver, backend)| {
                let outcome = resolver.resolve(&requests, &options, HD, &backend);
                black_box(outcome).ok();
                resolver.release_all(&backend);
            },
        );
    });
}

fn bench_resolve_large(c: &mut Criterion) {
    let options = OptionRegistry::new();
    let requests = chained_requests(64);
    c.bench_function("resolve_64_chained_first_frame", |b| {
        b.iter_with_setup(
            || (ResourceResolver::new(), DummyBackend::new()),
            |(mut resolver, backend)| {
                let outcome = resolver.resolve(&requests, &options, HD, &backend);
                black_box(outcome).ok();
                resolver.release_all(&backend);
            },
        );
    });
}

fn bench_resolve_steady_state(c: &mut Criterion) {
    let options = OptionRegistry::new();
    let requests = chained_requests(64);
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    if let Err(err) = resolver.resolve(&requests, &options, HD, &backend) {
        panic!("benchmark setup failed: {err}");
    }

    c.bench_function("resolve_64_chained_steady_state", |b| {
        b.iter(|| {
            let outcome = resolver.resolve(black_box(&requests), &options, HD, &backend);
            black_box(outcome).ok();
        });
    });
    resolver.release_all(&backend);
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

fn bench_frame_builtins(c: &mut Criterion) {
    let backend = Arc::new(DummyBackend::new());
    let shared: Arc<dyn GpuBackend> = backend.clone();
    let factory = ContributorFactory::with_builtins();
    let mut frames = match FrameOrchestrator::from_techniques(
        shared,
        Extent2d::new(1280, 720),
        &factory,
        &["GBuffer", "TemporalUpscaler", "ToneMapping"],
    ) {
        Ok(frames) => frames,
        Err(err) => panic!("benchmark setup failed: {err}"),
    };
    frames.render_frame();

    c.bench_function("frame_builtin_techniques", |b| {
        b.iter(|| {
            black_box(frames.render_frame());
            backend.take_commands();
        });
    });
}

criterion_group!(
    benches,
    bench_resolve_small,
    bench_resolve_large,
    bench_resolve_steady_state,
    bench_frame_builtins,
);
criterion_main!(benches);

//! Integration tests for shared-resource resolution.
//!
//! These drive [`ResourceResolver`] directly with hand-written request sets
//! on the dummy backend.
//!
//! # Test Categories
//!
//! - **Merge Tests**: one resource per name, access union, inherited shapes
//! - **Conflict Tests**: mutually exclusive declarations
//! - **Require Tests**: optional and mandatory predicates, optional creation
//! - **Lifetime Tests**: generations, discard and keep policies, backups

mod common;

use rstest::rstest;

use common::HD;
use lumen_core::OptionRegistry;
use lumen_graphics::{
    Access, ConflictReason, ContributorRequests, DummyBackend, Extent2d, Require, ResolveError,
    ResourceFlags, ResourceResolver, SharedBuffer, SharedTexture, TextureFormat,
};

fn resolve(
    resolver: &mut ResourceResolver,
    backend: &DummyBackend,
    options: &OptionRegistry,
    requests: &[ContributorRequests],
) -> Result<lumen_graphics::ResolveOutcome, ResolveError> {
    resolver.resolve(requests, options, HD, backend)
}

// ============================================================================
// Merge Tests
// ============================================================================

#[rstest]
#[case::read_only(Access::READ, Access::READ, Access::READ)]
#[case::write_read(Access::WRITE, Access::READ, Access::READ_WRITE)]
#[case::write_write(Access::WRITE, Access::WRITE, Access::WRITE)]
#[case::read_write_read(Access::READ_WRITE, Access::READ, Access::READ_WRITE)]
fn test_access_is_union(#[case] first: Access, #[case] second: Access, #[case] expected: Access) {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A").with_texture(SharedTexture::new("Shared", first)),
        ContributorRequests::new("B").with_texture(SharedTexture::new("Shared", second)),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    assert_eq!(resolver.plan().len(), 1);
    let shared = resolver.plan().get("Shared").unwrap();
    assert_eq!(shared.access, expected);
    assert_eq!(shared.contributors, vec!["A", "B"]);
    assert_eq!(backend.live_textures(), 1);
}

#[test]
fn test_color_inherits_render_size() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("GBuffer").with_texture(SharedTexture::write("Color")),
        ContributorRequests::new("ToneMapping").with_texture(SharedTexture::read("Color")),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    let color = resolver.plan().get("Color").unwrap();
    assert_eq!(color.dimensions(), Some(Extent2d::new(1920, 1080)));
    assert_eq!(color.access, Access::READ_WRITE);
    assert_eq!(color.format(), Some(TextureFormat::Rgba16Float));
    assert!(color.cleared);
}

#[test]
fn test_reader_inherits_producer_format() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("Reader").with_texture(SharedTexture::read("Depth")),
        ContributorRequests::new("Producer").with_texture(
            SharedTexture::write("Depth").with_format(TextureFormat::Depth32Float),
        ),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    assert_eq!(
        resolver.plan().get("Depth").and_then(|depth| depth.format()),
        Some(TextureFormat::Depth32Float)
    );
}

#[test]
fn test_mips_give_full_chain() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A")
            .with_texture(SharedTexture::write("Pyramid").with_dimensions(1024, 512)),
        ContributorRequests::new("B").with_texture(SharedTexture::read("Pyramid").with_mips()),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    let pyramid = resolver.plan().get("Pyramid").unwrap();
    assert_eq!(pyramid.texture_descriptor().unwrap().mip_level_count, 11);
}

#[rstest]
#[case::default_stride(0, 0, 1920 * 1080 * 4)]
#[case::explicit_stride(0, 16, 1920 * 1080 * 16)]
#[case::explicit_size(256, 0, 256)]
fn test_buffer_size(#[case] size: u64, #[case] stride: u32, #[case] expected: u64) {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![ContributorRequests::new("A").with_buffer(
        SharedBuffer::write("Data").with_size(size).with_stride(stride),
    )];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    assert_eq!(resolver.plan().get("Data").and_then(|data| data.size()), Some(expected));
}

#[test]
fn test_buffer_takes_largest_size() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A").with_buffer(SharedBuffer::write("Data").with_size(64)),
        ContributorRequests::new("B").with_buffer(SharedBuffer::read("Data").with_size(128)),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    assert_eq!(resolver.plan().get("Data").and_then(|data| data.size()), Some(128));
}

// ============================================================================
// Conflict Tests
// ============================================================================

#[rstest]
#[case::same_contributor("A", "A")]
#[case::different_contributors("A", "B")]
fn test_clear_and_accumulate_conflict(#[case] first: &str, #[case] second: &str) {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new(first)
            .with_texture(SharedTexture::write("History").with_flags(ResourceFlags::CLEAR)),
        ContributorRequests::new(second)
            .with_texture(SharedTexture::read_write("History").with_flags(ResourceFlags::ACCUMULATE)),
    ];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Conflict {
            reason: ConflictReason::ClearAndAccumulate,
            ..
        }
    ));
    assert_eq!(err.resource(), "History");
    assert!(resolver.plan().is_empty());
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn test_format_conflict() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A")
            .with_texture(SharedTexture::write("Color").with_format(TextureFormat::Rgba8Unorm)),
        ContributorRequests::new("B")
            .with_texture(SharedTexture::read("Color").with_format(TextureFormat::Rgba16Float)),
    ];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert_eq!(err.contributors(), vec!["A", "B"]);
    assert!(matches!(
        err,
        ResolveError::Conflict {
            reason: ConflictReason::Format(TextureFormat::Rgba8Unorm, TextureFormat::Rgba16Float),
            ..
        }
    ));
}

#[test]
fn test_texture_and_buffer_conflict() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A").with_texture(SharedTexture::write("Exposure")),
        ContributorRequests::new("B").with_buffer(SharedBuffer::read("Exposure")),
    ];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Conflict {
            reason: ConflictReason::TextureAndBuffer,
            ..
        }
    ));
}

#[test]
fn test_conflict_keeps_previous_plan() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let good = vec![ContributorRequests::new("A").with_texture(SharedTexture::write("Color"))];
    resolve(&mut resolver, &backend, &options, &good).unwrap();
    let handle = resolver.plan().get("Color").unwrap().handle;

    let mut bad = good.clone();
    bad.push(ContributorRequests::new("B").with_texture(
        SharedTexture::read_write("Color").with_flags(ResourceFlags::ACCUMULATE),
    ));
    bad[0].textures[0].flags = ResourceFlags::CLEAR;
    assert!(resolve(&mut resolver, &backend, &options, &bad).is_err());

    assert_eq!(resolver.plan().get("Color").unwrap().handle, handle);
    assert_eq!(backend.live_textures(), 1);
}

// ============================================================================
// Require Tests
// ============================================================================

#[test]
fn test_optional_request_with_false_predicate_is_absent() {
    let backend = DummyBackend::new();
    let mut options = OptionRegistry::new();
    options.register("taa_enable", false).unwrap();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("Upscaler").with_texture(
            SharedTexture::write("ColorScaled")
                .with_flags(ResourceFlags::OPTIONAL)
                .with_require(Require::name("taa_enable")),
        ),
        ContributorRequests::new("ToneMapping").with_texture(
            SharedTexture::read_write("ColorScaled").with_flags(ResourceFlags::OPTIONAL),
        ),
    ];

    resolve(&mut resolver, &backend, &options, &requests).unwrap();
    assert!(!resolver.plan().contains("ColorScaled"));

    options.set("taa_enable", true).unwrap();
    resolve(&mut resolver, &backend, &options, &requests).unwrap();
    assert!(resolver.plan().contains("ColorScaled"));
}

#[test]
fn test_mandatory_request_with_false_predicate_fails() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![ContributorRequests::new("Upscaler")
        .with_texture(SharedTexture::write("ColorScaled").with_require(Require::name("taa_enable")))];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert_eq!(
        err,
        ResolveError::UnsatisfiableRequire {
            name: "ColorScaled".to_string(),
            contributor: "Upscaler".to_string(),
            require: "taa_enable".to_string(),
        }
    );
}

#[rstest]
#[case::bool_true("flag", lumen_core::OptionValue::Bool(true), true)]
#[case::bool_false("flag", lumen_core::OptionValue::Bool(false), false)]
#[case::zero("flag", lumen_core::OptionValue::U32(0), false)]
#[case::non_zero("flag", lumen_core::OptionValue::U8(3), true)]
#[case::empty_string("flag", lumen_core::OptionValue::String(String::new()), false)]
fn test_require_on_option_truthiness(
    #[case] name: &str,
    #[case] value: lumen_core::OptionValue,
    #[case] present: bool,
) {
    let backend = DummyBackend::new();
    let mut options = OptionRegistry::new();
    options.register(name, value).unwrap();
    let mut resolver = ResourceResolver::new();
    let requests = vec![ContributorRequests::new("A").with_buffer(
        SharedBuffer::write("Gated")
            .with_flags(ResourceFlags::OPTIONAL_KEEP)
            .with_require(Require::name(name)),
    )];

    resolve(&mut resolver, &backend, &options, &requests).unwrap();

    assert_eq!(resolver.plan().contains("Gated"), present);
}

#[test]
fn test_require_chains_through_resources() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    // "Exposure" depends on "ColorScaled", which depends on "Color".
    let mut requests = vec![
        ContributorRequests::new("ToneMapping")
            .with_texture(SharedTexture::read_write("ColorScaled").with_flags(ResourceFlags::OPTIONAL))
            .with_buffer(
                SharedBuffer::read("Exposure")
                    .with_flags(ResourceFlags::OPTIONAL)
                    .with_require("ColorScaled".parse().unwrap()),
            ),
        ContributorRequests::new("Upscaler").with_texture(
            SharedTexture::write("ColorScaled")
                .with_flags(ResourceFlags::OPTIONAL)
                .with_require("Color && !Disabled".parse().unwrap()),
        ),
        ContributorRequests::new("AutoExposure").with_buffer(
            SharedBuffer::write("Exposure").with_flags(ResourceFlags::OPTIONAL_DISCARD),
        ),
        ContributorRequests::new("GBuffer").with_texture(SharedTexture::write("Color")),
    ];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();
    assert_eq!(
        resolver.plan().names().collect::<Vec<_>>(),
        vec!["ColorScaled", "Exposure", "Color"]
    );

    requests.pop();
    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();
    assert!(resolver.plan().is_empty());
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[rstest]
#[case::lone_optional(ResourceFlags::OPTIONAL, None, false)]
#[case::connected_optional(ResourceFlags::OPTIONAL, Some(ResourceFlags::OPTIONAL), true)]
#[case::lone_discard(ResourceFlags::OPTIONAL_DISCARD, None, false)]
#[case::discard_pair(ResourceFlags::OPTIONAL_DISCARD, Some(ResourceFlags::OPTIONAL_DISCARD), false)]
#[case::discard_with_optional_reader(
    ResourceFlags::OPTIONAL_DISCARD,
    Some(ResourceFlags::OPTIONAL),
    true
)]
#[case::discard_with_mandatory_reader(
    ResourceFlags::OPTIONAL_DISCARD,
    Some(ResourceFlags::empty()),
    true
)]
#[case::lone_keep(ResourceFlags::OPTIONAL_KEEP, None, true)]
fn test_optional_creation(
    #[case] writer: ResourceFlags,
    #[case] reader: Option<ResourceFlags>,
    #[case] present: bool,
) {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let mut requests = vec![ContributorRequests::new("Producer")
        .with_buffer(SharedBuffer::write("Exposure").with_size(16).with_flags(writer))];
    if let Some(flags) = reader {
        requests.push(
            ContributorRequests::new("Consumer")
                .with_buffer(SharedBuffer::read("Exposure").with_flags(flags)),
        );
    }

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    assert_eq!(resolver.plan().contains("Exposure"), present);
    assert_eq!(backend.live_buffers(), usize::from(present));
}

// ============================================================================
// Lifetime Tests
// ============================================================================

#[test]
fn test_identical_frames_keep_generation() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A")
            .with_texture(SharedTexture::write("Color"))
            .with_buffer(SharedBuffer::write("Counters").with_size(64)),
    ];

    resolve(&mut resolver, &backend, &options, &requests).unwrap();
    for _ in 0..4 {
        let outcome = resolve(&mut resolver, &backend, &options, &requests).unwrap();
        assert!(outcome.is_unchanged());
    }

    for resource in resolver.plan().iter() {
        assert_eq!(resource.generation, 1);
        assert_eq!(resource.frames_valid, 4);
        assert!(!resource.cleared);
    }
    assert_eq!(backend.stats().textures_created, 1);
    assert_eq!(backend.stats().buffers_created, 1);
}

#[test]
fn test_dimension_change_bumps_only_that_name() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let requests = |width: u32| {
        vec![ContributorRequests::new("A")
            .with_texture(SharedTexture::write("Scaled").with_dimensions(width, 256))
            .with_texture(SharedTexture::write("Color"))]
    };

    resolve(&mut resolver, &backend, &options, &requests(256)).unwrap();
    let outcome = resolve(&mut resolver, &backend, &options, &requests(512)).unwrap();

    assert_eq!(outcome.reallocated, vec!["Scaled"]);
    assert_eq!(outcome.reused, vec!["Color"]);
    assert_eq!(resolver.plan().get("Scaled").unwrap().generation, 2);
    assert_eq!(resolver.plan().get("Color").unwrap().generation, 1);
    assert_eq!(backend.live_textures(), 2);
}

#[test]
fn test_optional_discard_disappears() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let with_exposure = vec![
        ContributorRequests::new("Upscaler").with_buffer(
            SharedBuffer::new("Exposure", Access::WRITE)
                .with_flags(ResourceFlags::OPTIONAL_DISCARD),
        ),
        ContributorRequests::new("ToneMapping").with_buffer(SharedBuffer::read("Exposure")),
    ];

    resolve(&mut resolver, &backend, &options, &with_exposure).unwrap();
    assert!(resolver.plan().contains("Exposure"));

    let outcome = resolve(&mut resolver, &backend, &options, &[]).unwrap();
    assert_eq!(outcome.destroyed, vec!["Exposure"]);
    assert!(!resolver.plan().contains("Exposure"));
    assert!(!resolver.is_dormant("Exposure"));
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn test_optional_keep_stays_allocated() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let with_cache = vec![ContributorRequests::new("Cache").with_texture(
        SharedTexture::write("Irradiance")
            .with_flags(ResourceFlags::OPTIONAL_KEEP)
            .with_dimensions(64, 64),
    )];

    resolve(&mut resolver, &backend, &options, &with_cache).unwrap();
    let handle = resolver.plan().get("Irradiance").unwrap().handle;

    let outcome = resolve(&mut resolver, &backend, &options, &[]).unwrap();
    assert_eq!(outcome.retained, vec!["Irradiance"]);
    assert!(!resolver.plan().contains("Irradiance"));
    assert!(resolver.is_dormant("Irradiance"));
    assert_eq!(backend.live_textures(), 1);

    let outcome = resolve(&mut resolver, &backend, &options, &with_cache).unwrap();
    assert_eq!(outcome.revived, vec!["Irradiance"]);
    let irradiance = resolver.plan().get("Irradiance").unwrap();
    assert_eq!(irradiance.generation, 1);
    assert_eq!(irradiance.handle, handle);
    assert!(!irradiance.cleared);
}

#[test]
fn test_optional_keep_revived_with_new_shape() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let with_cache = |size: u32| {
        vec![ContributorRequests::new("Cache").with_texture(
            SharedTexture::write("Irradiance")
                .with_flags(ResourceFlags::OPTIONAL_KEEP)
                .with_dimensions(size, size),
        )]
    };

    resolve(&mut resolver, &backend, &options, &with_cache(64)).unwrap();
    let dormant_handle = resolver.plan().get("Irradiance").unwrap().handle;
    resolve(&mut resolver, &backend, &options, &[]).unwrap();
    assert!(resolver.is_dormant("Irradiance"));

    let outcome = resolve(&mut resolver, &backend, &options, &with_cache(128)).unwrap();

    assert_eq!(outcome.reallocated, vec!["Irradiance"]);
    assert!(outcome.revived.is_empty());
    assert!(!resolver.is_dormant("Irradiance"));
    let irradiance = resolver.plan().get("Irradiance").unwrap();
    assert_eq!(irradiance.generation, 2);
    assert_ne!(irradiance.handle, dormant_handle);
    assert_eq!(irradiance.dimensions(), Some(Extent2d::new(128, 128)));
    assert!(irradiance.cleared);
    assert_eq!(backend.live_textures(), 1);
    assert_eq!(backend.stats().textures_destroyed, 1);
}

#[test]
fn test_backup_twin_goes_dormant_with_primary() {
    let backend = DummyBackend::new();
    let options = OptionRegistry::new();
    let mut resolver = ResourceResolver::new();
    let with_history = vec![ContributorRequests::new("Upscaler").with_texture(
        SharedTexture::read_write("History")
            .with_flags(ResourceFlags::ACCUMULATE | ResourceFlags::OPTIONAL_KEEP)
            .with_dimensions(800, 600)
            .with_backup("HistoryPrevious"),
    )];

    resolve(&mut resolver, &backend, &options, &with_history).unwrap();
    let twin = resolver.plan().get("HistoryPrevious").unwrap();
    assert!(twin.flags.contains(ResourceFlags::OPTIONAL_KEEP));
    let handles = (
        resolver.plan().get("History").unwrap().handle,
        twin.handle,
    );

    let outcome = resolve(&mut resolver, &backend, &options, &[]).unwrap();
    assert_eq!(outcome.retained, vec!["History", "HistoryPrevious"]);
    assert!(outcome.destroyed.is_empty());
    assert!(resolver.is_dormant("History"));
    assert!(resolver.is_dormant("HistoryPrevious"));
    assert_eq!(backend.live_textures(), 2);

    let outcome = resolve(&mut resolver, &backend, &options, &with_history).unwrap();
    assert_eq!(outcome.revived, vec!["History", "HistoryPrevious"]);
    assert_eq!(resolver.plan().get("History").unwrap().handle, handles.0);
    assert_eq!(resolver.plan().get("HistoryPrevious").unwrap().handle, handles.1);
    assert_eq!(resolver.plan().get("HistoryPrevious").unwrap().generation, 1);
    assert_eq!(backend.stats().textures_created, 2);
}

#[test]
fn test_backup_twin_matches_primary() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![ContributorRequests::new("Upscaler").with_texture(
        SharedTexture::read_write("History")
            .with_flags(ResourceFlags::ACCUMULATE)
            .with_format(TextureFormat::Rgba16Float)
            .with_dimensions(800, 600)
            .with_backup("HistoryPrevious"),
    )];

    resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap();

    let primary = resolver.plan().get("History").unwrap();
    let twin = resolver.plan().get("HistoryPrevious").unwrap();
    assert_eq!(primary.backup.as_deref(), Some("HistoryPrevious"));
    assert_eq!(twin.backup_of.as_deref(), Some("History"));
    assert_eq!(twin.dimensions(), primary.dimensions());
    assert_eq!(twin.format(), primary.format());
    assert_ne!(twin.handle, primary.handle);
}

#[test]
fn test_backup_twin_shape_conflict() {
    let backend = DummyBackend::new();
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("Upscaler").with_texture(
            SharedTexture::read_write("History")
                .with_dimensions(800, 600)
                .with_backup("HistoryPrevious"),
        ),
        ContributorRequests::new("Viewer")
            .with_texture(SharedTexture::read("HistoryPrevious").with_dimensions(400, 300)),
    ];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Conflict {
            reason: ConflictReason::BackupShape { .. },
            ..
        }
    ));
}

#[test]
fn test_allocation_failure_is_reported() {
    let backend = DummyBackend::new();
    backend.fail_texture("Broken");
    let mut resolver = ResourceResolver::new();
    let requests = vec![
        ContributorRequests::new("A").with_texture(SharedTexture::write("Fine")),
        ContributorRequests::new("B").with_texture(SharedTexture::write("Broken")),
    ];

    let err = resolve(&mut resolver, &backend, &OptionRegistry::new(), &requests).unwrap_err();

    assert!(matches!(err, ResolveError::AllocationFailed { ref name, .. } if name == "Broken"));
    assert_eq!(err.contributors(), vec!["B"]);
    assert_eq!(backend.live_textures(), 0);
}

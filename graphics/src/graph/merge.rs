//! Grouping and merging of resource requests.
//!
//! This is the pure half of resolution: it turns every contributor's
//! requests into one merged description per name without touching the GPU.

use std::collections::{HashMap, HashSet};

use lumen_core::OptionRegistry;

use super::{Access, ResourceFlags, SharedBuffer, SharedTexture};
use crate::error::{ConflictReason, ResolveError};
use crate::types::{Extent2d, TextureFormat};

/// Default format of a texture no requester names a format for.
pub const DEFAULT_TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

/// Default element stride of a buffer no requester names a stride for.
pub const DEFAULT_BUFFER_STRIDE: u32 = 4;

/// All requests made by one contributor for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributorRequests {
    /// Contributor name.
    pub contributor: String,
    /// Texture requests.
    pub textures: Vec<SharedTexture>,
    /// Buffer requests.
    pub buffers: Vec<SharedBuffer>,
}

impl ContributorRequests {
    /// Create an empty request set for a contributor.
    pub fn new(contributor: impl Into<String>) -> Self {
        Self {
            contributor: contributor.into(),
            ..Self::default()
        }
    }

    /// Add a texture request (builder style).
    pub fn with_texture(mut self, texture: SharedTexture) -> Self {
        self.textures.push(texture);
        self
    }

    /// Add a buffer request (builder style).
    pub fn with_buffer(mut self, buffer: SharedBuffer) -> Self {
        self.buffers.push(buffer);
        self
    }

    /// Returns true if nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.buffers.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Request<'a> {
    Texture(&'a SharedTexture),
    Buffer(&'a SharedBuffer),
}

#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    contributor: &'a str,
    request: Request<'a>,
}

impl<'a> Entry<'a> {
    fn name(&self) -> &'a str {
        match self.request {
            Request::Texture(texture) => &texture.name,
            Request::Buffer(buffer) => &buffer.name,
        }
    }

    fn access(&self) -> Access {
        match self.request {
            Request::Texture(texture) => texture.access,
            Request::Buffer(buffer) => buffer.access,
        }
    }

    fn flags(&self) -> ResourceFlags {
        match self.request {
            Request::Texture(texture) => texture.flags,
            Request::Buffer(buffer) => buffer.flags,
        }
    }

    fn require(&self) -> Option<&'a super::Require> {
        match self.request {
            Request::Texture(texture) => texture.require.as_ref(),
            Request::Buffer(buffer) => buffer.require.as_ref(),
        }
    }
}

/// Concrete shape of a merged resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MergedShape {
    Texture {
        format: TextureFormat,
        dimensions: Extent2d,
        mip_levels: u32,
        explicit_format: bool,
        explicit_dimensions: bool,
    },
    Buffer {
        size: u64,
        stride: u32,
    },
}

impl MergedShape {
    fn same_texture_shape(&self, other: &MergedShape) -> bool {
        match (self, other) {
            (
                MergedShape::Texture {
                    format: a_format,
                    dimensions: a_dimensions,
                    mip_levels: a_mips,
                    ..
                },
                MergedShape::Texture {
                    format: b_format,
                    dimensions: b_dimensions,
                    mip_levels: b_mips,
                    ..
                },
            ) => a_format == b_format && a_dimensions == b_dimensions && a_mips == b_mips,
            _ => false,
        }
    }
}

/// One name's merged request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedResource {
    pub name: String,
    pub shape: MergedShape,
    pub access: Access,
    pub flags: ResourceFlags,
    pub contributors: Vec<String>,
    pub backup: Option<String>,
    pub backup_of: Option<String>,
}

/// Merge every contributor's requests into one description per name.
///
/// Requests whose `require` predicate does not hold are dropped when they
/// are optional and rejected otherwise. All-optional names nothing connects
/// to are dropped as well. The result preserves first-request order, with
/// backup twins appended after all requested names.
pub(crate) fn merge_requests(
    requests: &[ContributorRequests],
    options: &OptionRegistry,
    render_dimensions: Extent2d,
) -> Result<Vec<MergedResource>, ResolveError> {
    let entries = applicable_entries(requests, options)?;

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<Entry<'_>>> = HashMap::new();
    for entry in entries {
        let group = groups.entry(entry.name()).or_default();
        if group.is_empty() {
            order.push(entry.name());
        }
        group.push(entry);
    }

    let mut merged = Vec::with_capacity(order.len());
    for name in order {
        merged.push(merge_group(name, &groups[name], render_dimensions)?);
    }

    attach_backups(&mut merged)?;
    Ok(merged)
}

/// Decide which requests take part in this frame.
///
/// A name is present when its group of honored requests passes
/// [`is_created`]. Conditional requests are evaluated in rounds, each round
/// against the presence set left by the previous one. The first phase honors
/// every request whose predicate becomes satisfied. The second withdraws every
/// honored request whose predicate no longer holds, since a `!NAME` honored
/// early can be invalidated by a name that appeared later. Both phases work on
/// whole sets, so the outcome does not depend on request order.
fn applicable_entries<'a>(
    requests: &'a [ContributorRequests],
    options: &OptionRegistry,
) -> Result<Vec<Entry<'a>>, ResolveError> {
    let entries: Vec<Entry<'a>> = requests
        .iter()
        .flat_map(|set| {
            let textures = set.textures.iter().map(move |texture| Entry {
                contributor: &set.contributor,
                request: Request::Texture(texture),
            });
            let buffers = set.buffers.iter().map(move |buffer| Entry {
                contributor: &set.contributor,
                request: Request::Buffer(buffer),
            });
            textures.chain(buffers)
        })
        .collect();

    let holds = |entry: &Entry<'a>, present: &HashSet<&'a str>| {
        entry.require().map_or(true, |require| {
            require.evaluate(&|name| options.is_truthy(name) || present.contains(name))
        })
    };

    let mut honored: Vec<bool> = entries.iter().map(|entry| entry.require().is_none()).collect();
    let mut present = created_names(&entries, &honored);

    loop {
        let satisfied: Vec<usize> = (0..entries.len())
            .filter(|&position| !honored[position] && holds(&entries[position], &present))
            .collect();
        if satisfied.is_empty() {
            break;
        }
        for position in satisfied {
            honored[position] = true;
        }
        present = created_names(&entries, &honored);
    }

    loop {
        let stale: Vec<usize> = (0..entries.len())
            .filter(|&position| honored[position] && !holds(&entries[position], &present))
            .collect();
        if stale.is_empty() {
            break;
        }
        for position in stale {
            log::debug!(
                "Withdrawing request for '{}' from '{}': predicate no longer holds",
                entries[position].name(),
                entries[position].contributor
            );
            honored[position] = false;
        }
        present = created_names(&entries, &honored);
    }

    let mut applicable = Vec::with_capacity(entries.len());
    for (entry, honored) in entries.into_iter().zip(honored) {
        if honored {
            if present.contains(entry.name()) {
                applicable.push(entry);
            } else {
                log::debug!(
                    "Dropping optional request for '{}' from '{}': nothing connects to it",
                    entry.name(),
                    entry.contributor
                );
            }
            continue;
        }
        let require = entry.require().map(ToString::to_string).unwrap_or_default();
        if entry.flags().is_optional() {
            log::debug!(
                "Dropping optional request for '{}' from '{}': '{}' does not hold",
                entry.name(),
                entry.contributor,
                require
            );
        } else {
            return Err(ResolveError::UnsatisfiableRequire {
                name: entry.name().to_string(),
                contributor: entry.contributor.to_string(),
                require,
            });
        }
    }
    Ok(applicable)
}

/// Names whose honored requests form a group that gets created.
fn created_names<'a>(entries: &[Entry<'a>], honored: &[bool]) -> HashSet<&'a str> {
    let mut groups: HashMap<&'a str, Vec<&Entry<'a>>> = HashMap::new();
    for (entry, _) in entries.iter().zip(honored).filter(|(_, honored)| **honored) {
        groups.entry(entry.name()).or_default().push(entry);
    }
    groups
        .into_iter()
        .filter(|(_, group)| is_created(group))
        .map(|(name, _)| name)
        .collect()
}

/// Creation rule for one name's honored requests.
///
/// Any non-optional request creates the resource. Among optional requests,
/// `OPTIONAL_KEEP` always creates it and `OPTIONAL` creates it once a second
/// contributor asks for the same name. `OPTIONAL_DISCARD` never creates a
/// resource on its own.
fn is_created(group: &[&Entry<'_>]) -> bool {
    if group.iter().any(|entry| !entry.flags().is_optional()) {
        return true;
    }
    if group
        .iter()
        .any(|entry| entry.flags().contains(ResourceFlags::OPTIONAL_KEEP))
    {
        return true;
    }
    let connected = group
        .iter()
        .any(|entry| entry.contributor != group[0].contributor);
    connected
        && group
            .iter()
            .any(|entry| entry.flags().contains(ResourceFlags::OPTIONAL))
}

fn merge_group(
    name: &str,
    group: &[Entry<'_>],
    render_dimensions: Extent2d,
) -> Result<MergedResource, ResolveError> {
    let conflict = |reason: ConflictReason, first: &str, second: &str| ResolveError::Conflict {
        name: name.to_string(),
        reason,
        first: first.to_string(),
        second: second.to_string(),
    };

    let mut access = Access::empty();
    let mut flags = ResourceFlags::empty();
    let mut contributors: Vec<String> = Vec::new();
    let mut clearing: Option<&str> = None;
    let mut accumulating: Option<&str> = None;
    let mut texture_requester: Option<&str> = None;
    let mut buffer_requester: Option<&str> = None;

    for entry in group {
        access |= entry.access();
        flags |= entry.flags();
        if !contributors.iter().any(|name| name == entry.contributor) {
            contributors.push(entry.contributor.to_string());
        }
        if entry.flags().contains(ResourceFlags::CLEAR) {
            clearing.get_or_insert(entry.contributor);
        }
        if entry.flags().contains(ResourceFlags::ACCUMULATE) {
            accumulating.get_or_insert(entry.contributor);
        }
        match entry.request {
            Request::Texture(_) => texture_requester.get_or_insert(entry.contributor),
            Request::Buffer(_) => buffer_requester.get_or_insert(entry.contributor),
        };
    }

    if let (Some(textures), Some(buffers)) = (texture_requester, buffer_requester) {
        return Err(conflict(ConflictReason::TextureAndBuffer, textures, buffers));
    }
    if let (Some(clear), Some(accumulate)) = (clearing, accumulating) {
        return Err(conflict(ConflictReason::ClearAndAccumulate, clear, accumulate));
    }

    let mut backup: Option<(&str, &str)> = None;
    let shape = if texture_requester.is_some() {
        let mut format: Option<(TextureFormat, &str)> = None;
        let mut dimensions: Option<Extent2d> = None;
        let mut mips = false;

        for entry in group {
            let Request::Texture(texture) = entry.request else {
                continue;
            };
            if let Some(requested) = texture.format {
                match format {
                    None => format = Some((requested, entry.contributor)),
                    Some((existing, first)) if existing != requested => {
                        return Err(conflict(
                            ConflictReason::Format(existing, requested),
                            first,
                            entry.contributor,
                        ));
                    }
                    Some(_) => {}
                }
            }
            if !texture.dimensions.is_zero() {
                match dimensions {
                    None => dimensions = Some(texture.dimensions),
                    Some(existing) if existing != texture.dimensions => log::debug!(
                        "'{}' asks for {} of '{}', keeping {}",
                        entry.contributor,
                        texture.dimensions,
                        name,
                        existing
                    ),
                    Some(_) => {}
                }
            }
            mips |= texture.mips;
            if let Some(requested) = texture.backup_name.as_deref() {
                match backup {
                    None => backup = Some((requested, entry.contributor)),
                    Some((existing, first)) if existing != requested => {
                        return Err(conflict(
                            ConflictReason::BackupName(existing.to_string(), requested.to_string()),
                            first,
                            entry.contributor,
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        let resolved_dimensions = dimensions.unwrap_or(render_dimensions);
        MergedShape::Texture {
            format: format.map_or(DEFAULT_TEXTURE_FORMAT, |(format, _)| format),
            dimensions: resolved_dimensions,
            mip_levels: if mips {
                resolved_dimensions.mip_level_count()
            } else {
                1
            },
            explicit_format: format.is_some(),
            explicit_dimensions: dimensions.is_some(),
        }
    } else {
        let mut size = 0u64;
        let mut stride: Option<(u32, &str)> = None;

        for entry in group {
            let Request::Buffer(buffer) = entry.request else {
                continue;
            };
            size = size.max(buffer.size);
            if buffer.stride != 0 {
                match stride {
                    None => stride = Some((buffer.stride, entry.contributor)),
                    Some((existing, first)) if existing != buffer.stride => {
                        return Err(conflict(
                            ConflictReason::Stride(existing, buffer.stride),
                            first,
                            entry.contributor,
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        let stride = stride.map_or(DEFAULT_BUFFER_STRIDE, |(stride, _)| stride);
        if size == 0 {
            size = u64::from(stride) * render_dimensions.area().max(1);
        }
        MergedShape::Buffer { size, stride }
    };

    Ok(MergedResource {
        name: name.to_string(),
        shape,
        access,
        flags,
        contributors,
        backup: backup.map(|(backup, _)| backup.to_string()),
        backup_of: None,
    })
}

/// Make sure every backup twin exists with its primary's shape.
fn attach_backups(merged: &mut Vec<MergedResource>) -> Result<(), ResolveError> {
    let primaries: Vec<usize> = merged
        .iter()
        .enumerate()
        .filter(|(_, resource)| resource.backup.is_some())
        .map(|(position, _)| position)
        .collect();

    for primary_index in primaries {
        let primary = merged[primary_index].clone();
        let Some(backup_name) = primary.backup.as_deref() else {
            continue;
        };

        let MergedShape::Texture {
            format,
            dimensions,
            mip_levels,
            ..
        } = primary.shape
        else {
            continue;
        };

        let twin_shape = MergedShape::Texture {
            format,
            dimensions,
            mip_levels,
            explicit_format: true,
            explicit_dimensions: true,
        };
        let shape_conflict = |twin: &MergedResource| ResolveError::Conflict {
            name: backup_name.to_string(),
            reason: ConflictReason::BackupShape {
                primary: primary.name.clone(),
            },
            first: primary.contributors.first().cloned().unwrap_or_default(),
            second: twin.contributors.first().cloned().unwrap_or_default(),
        };

        match merged.iter().position(|resource| resource.name == backup_name) {
            Some(twin_index) => {
                let twin = &mut merged[twin_index];
                match &twin.shape {
                    MergedShape::Texture {
                        explicit_format,
                        explicit_dimensions,
                        mip_levels: twin_mips,
                        format: twin_format,
                        dimensions: twin_dimensions,
                    } => {
                        let format_ok = !explicit_format || *twin_format == format;
                        let dimensions_ok = !explicit_dimensions || *twin_dimensions == dimensions;
                        let mips_ok = *twin_mips == 1 || *twin_mips == mip_levels;
                        if !(format_ok && dimensions_ok && mips_ok) {
                            return Err(shape_conflict(twin));
                        }
                    }
                    MergedShape::Buffer { .. } => return Err(shape_conflict(twin)),
                }
                twin.shape = twin_shape;
                twin.access |= Access::READ_WRITE;
                twin.backup_of = Some(primary.name.clone());
                for contributor in &primary.contributors {
                    if !twin.contributors.contains(contributor) {
                        twin.contributors.push(contributor.clone());
                    }
                }
            }
            None => merged.push(MergedResource {
                name: backup_name.to_string(),
                shape: twin_shape,
                access: Access::READ_WRITE,
                flags: primary.flags & ResourceFlags::ANY_OPTIONAL,
                contributors: primary.contributors.clone(),
                backup: None,
                backup_of: Some(primary.name.clone()),
            }),
        }
    }

    debug_assert!(merged
        .iter()
        .filter(|resource| resource.backup_of.is_some())
        .all(|twin| merged.iter().any(|primary| {
            primary.backup.as_deref() == Some(twin.name.as_str())
                && primary.shape.same_texture_shape(&twin.shape)
        })));
    Ok(())
}

//! Pipeline and bind-group contracts shared by the concrete objects.
//!
//! Binding arrangements are declared as plain data first, then lowered to
//! wgpu layout entries, so the contract an object commits to can be
//! inspected (and tested) without a device.

use crate::error::EngineError;

/// Entry points every render shader must export.
pub const VERTEX_ENTRY: &str = "vertexMain";
pub const FRAGMENT_ENTRY: &str = "fragmentMain";

/// Entry point every filter shader must export.
pub const COMPUTE_ENTRY: &str = "computeMain";

/// Texel format of filter output textures. Storage textures cannot use
/// sRGB formats, so filters write linear RGBA8.
pub const STORAGE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Resource class a binding slot expects.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    UniformBuffer,
    SampledTexture,
    FilteringSampler,
    StorageTexture,
}

/// One slot of a bind-group arrangement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingSlot {
    pub binding: u32,
    pub kind: BindingKind,
    pub visibility: wgpu::ShaderStages,
}

/// Lowers a binding arrangement to wgpu layout entries, preserving order
/// and indices.
pub(crate) fn layout_entries(plan: &[BindingSlot]) -> Vec<wgpu::BindGroupLayoutEntry> {
    plan.iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: slot.visibility,
            ty: match slot.kind {
                BindingKind::UniformBuffer => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindingKind::SampledTexture => wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                BindingKind::FilteringSampler => {
                    wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                }
                BindingKind::StorageTexture => wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: STORAGE_TEXTURE_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
            },
            count: None,
        })
        .collect()
}

/// Verifies shader source declares `fn <entry>` before a pipeline is built
/// around it, so a missing entry point surfaces as a configuration error
/// instead of a black frame.
pub(crate) fn ensure_entry_point(source: &str, entry: &str) -> Result<(), EngineError> {
    if has_entry_point(source, entry) {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "shader does not declare entry point `{entry}`"
        )))
    }
}

fn has_entry_point(source: &str, entry: &str) -> bool {
    let mut rest = source;
    while let Some(pos) = rest.find(entry) {
        let before = &rest[..pos];
        let after = &rest[pos + entry.len()..];

        let after_ok = after
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');

        let trimmed = before.trim_end();
        let fn_ok = before.len() > trimmed.len()
            && trimmed.ends_with("fn")
            && trimmed[..trimmed.len() - 2]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric() && c != '_');

        if after_ok && fn_ok {
            return true;
        }
        rest = &rest[pos + entry.len()..];
    }
    false
}

/// Workgroup counts covering a `width` × `height` texture with one
/// invocation per texel; at least one group per axis.
pub fn dispatch_extent(width: u32, height: u32, workgroup: (u32, u32)) -> (u32, u32, u32) {
    let x = width.div_ceil(workgroup.0.max(1)).max(1);
    let y = height.div_ceil(workgroup.1.max(1)).max(1);
    (x, y, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── entry point detection ─────────────────────────────────────────────

    #[test]
    fn entry_point_declaration_is_found() {
        let src = "@vertex\nfn vertexMain(@location(0) pos: vec2f) -> vec4f {}";
        assert!(ensure_entry_point(src, VERTEX_ENTRY).is_ok());
    }

    #[test]
    fn missing_entry_point_is_a_configuration_error() {
        let src = "@fragment\nfn fragmentMain() {}";
        let err = ensure_entry_point(src, VERTEX_ENTRY).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn entry_point_name_must_match_whole_identifier() {
        assert!(ensure_entry_point("fn vertexMainOld() {}", VERTEX_ENTRY).is_err());
        assert!(ensure_entry_point("fn myvertexMain() {}", VERTEX_ENTRY).is_err());
        assert!(ensure_entry_point("let vertexMain = 1;", VERTEX_ENTRY).is_err());
    }

    #[test]
    fn later_declaration_is_still_found() {
        let src = "// vertexMain lives below\n@compute @workgroup_size(8, 8)\nfn computeMain(id: vec3u) {}";
        assert!(ensure_entry_point(src, COMPUTE_ENTRY).is_ok());
    }

    // ── layout lowering ───────────────────────────────────────────────────

    #[test]
    fn layout_entries_preserve_bindings_and_kinds() {
        let plan = [
            BindingSlot {
                binding: 0,
                kind: BindingKind::SampledTexture,
                visibility: wgpu::ShaderStages::COMPUTE,
            },
            BindingSlot {
                binding: 1,
                kind: BindingKind::StorageTexture,
                visibility: wgpu::ShaderStages::COMPUTE,
            },
        ];

        let entries = layout_entries(&plan);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].binding, 0);
        assert_eq!(entries[1].binding, 1);
        assert!(matches!(entries[0].ty, wgpu::BindingType::Texture { .. }));

        let wgpu::BindingType::StorageTexture { format, .. } = entries[1].ty else {
            panic!("expected a storage texture binding, got {:?}", entries[1].ty);
        };
        assert_eq!(format, STORAGE_TEXTURE_FORMAT);
    }

    // ── dispatch sizing ───────────────────────────────────────────────────

    #[test]
    fn dispatch_covers_every_texel() {
        assert_eq!(dispatch_extent(640, 480, (8, 8)), (80, 60, 1));
        assert_eq!(dispatch_extent(9, 9, (8, 8)), (2, 2, 1));
    }

    #[test]
    fn dispatch_of_tiny_images_is_one_group() {
        assert_eq!(dispatch_extent(2, 2, (8, 8)), (1, 1, 1));
        assert_eq!(dispatch_extent(0, 0, (8, 8)), (1, 1, 1));
    }
}

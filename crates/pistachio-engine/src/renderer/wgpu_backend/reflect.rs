//! Reflection of the WGSL uniform block a shader reads its named uniforms from.
//!
//! Programs declare their uniforms as one struct bound with
//! `@group(0) @binding(0) var<uniform> name: Struct;`. Field offsets follow
//! the WGSL uniform address space layout rules.

use std::collections::HashMap;

use glam::Mat3;

use crate::error::RenderError;
use crate::renderer::shader::{UniformType, UniformValue};

/// One field of the uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformField {
    pub(crate) ty: UniformType,
    pub(crate) offset: usize,
}

/// Layout of a shader's uniform block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    fields: HashMap<String, UniformField>,
    size: usize,
}

impl UniformBlock {
    /// Block size in bytes, a multiple of 16. Zero when the program has no block.
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.get(name)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Writes `value` into `data` at the field's offset.
    ///
    /// Returns `false` when the block has no such field or its type differs.
    pub(crate) fn write(&self, data: &mut [u8], name: &str, value: UniformValue) -> bool {
        let Some(field) = self.fields.get(name) else {
            return false;
        };
        if field.ty != value.uniform_type() {
            return false;
        }

        let bytes = encode(value);
        match data.get_mut(field.offset..field.offset + bytes.len()) {
            Some(dst) => {
                dst.copy_from_slice(&bytes);
                true
            }
            None => false,
        }
    }
}

/// Reflects the uniform block of one or both stages.
///
/// A block declared in both stages must have the same layout in each.
pub(crate) fn reflect_program(
    name: &str,
    vertex: &str,
    fragment: &str,
) -> Result<UniformBlock, RenderError> {
    let vs = reflect_stage(name, vertex)?;
    let fs = reflect_stage(name, fragment)?;
    match (vs, fs) {
        (Some(vs), Some(fs)) if vs != fs => Err(RenderError::shader_source(
            name,
            "uniform block differs between vertex and fragment stage",
        )),
        (Some(block), _) | (None, Some(block)) => Ok(block),
        (None, None) => Ok(UniformBlock::default()),
    }
}

fn reflect_stage(name: &str, source: &str) -> Result<Option<UniformBlock>, RenderError> {
    let source = strip_comments(source);
    let Some(struct_name) = uniform_struct_name(&source) else {
        return Ok(None);
    };
    let body = struct_body(&source, struct_name).ok_or_else(|| {
        RenderError::shader_source(name, format!("uniform struct `{struct_name}` not found"))
    })?;

    let mut fields = HashMap::new();
    let mut offset = 0;
    let mut max_align = 16;
    for member in body.split([',', ';']) {
        let (attrs, member) =
            split_attributes(member.trim()).map_err(|msg| RenderError::shader_source(name, msg))?;
        if member.is_empty() {
            continue;
        }
        let (field_name, ty) = member.split_once(':').ok_or_else(|| {
            RenderError::shader_source(name, format!("malformed uniform member `{member}`"))
        })?;
        let ty = ty.trim();
        let (uniform_type, type_align, type_size) = wgsl_type(ty).ok_or_else(|| {
            RenderError::shader_source(name, format!("unsupported uniform type `{ty}`"))
        })?;
        let align = attrs.align.map_or(type_align, |a| a.max(type_align));
        let size = match attrs.size {
            Some(size) if size < type_size => {
                return Err(RenderError::shader_source(
                    name,
                    format!("`@size({size})` is smaller than `{ty}`"),
                ));
            }
            Some(size) => size,
            None => type_size,
        };

        offset = round_up(offset, align);
        max_align = max_align.max(align);
        fields.insert(
            field_name.trim().to_string(),
            UniformField {
                ty: uniform_type,
                offset,
            },
        );
        offset += size;
    }

    Ok(Some(UniformBlock {
        fields,
        size: round_up(offset, max_align),
    }))
}

/// Type name of the first `var<uniform>` declaration.
fn uniform_struct_name(source: &str) -> Option<&str> {
    let start = source.find("var<uniform>")? + "var<uniform>".len();
    let decl = &source[start..];
    let decl = &decl[..decl.find(';')?];
    let (_, ty) = decl.split_once(':')?;
    Some(ty.trim())
}

fn struct_body<'a>(source: &'a str, struct_name: &str) -> Option<&'a str> {
    let mut rest = source;
    while let Some(pos) = rest.find("struct") {
        let after = &rest[pos + "struct".len()..];
        let open = after.find('{')?;
        if after[..open].trim() == struct_name {
            let body = &after[open + 1..];
            return Some(&body[..body.find('}')?]);
        }
        rest = after;
    }
    None
}

fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Layout attributes of a struct member.
#[derive(Debug, Default, PartialEq, Eq)]
struct MemberAttributes {
    align: Option<usize>,
    size: Option<usize>,
}

/// Splits leading `@attr` / `@attr(arg)` attributes off a struct member.
///
/// `@align` and `@size` are kept; others are dropped.
fn split_attributes(member: &str) -> Result<(MemberAttributes, &str), String> {
    let mut attrs = MemberAttributes::default();
    let mut member = member;
    while let Some(rest) = member.strip_prefix('@') {
        let name_end = rest
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(rest.len());
        let (attr, after) = rest.split_at(name_end);
        let (arg, after) = match after.trim_start().strip_prefix('(') {
            Some(args) => {
                let close = args
                    .find(')')
                    .ok_or_else(|| format!("unterminated attribute `@{attr}`"))?;
                (Some(args[..close].trim()), &args[close + 1..])
            }
            None => (None, after),
        };

        let value = || {
            arg.and_then(|a| a.trim_end_matches(['u', 'i']).parse::<usize>().ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| format!("invalid argument to `@{attr}`"))
        };
        match attr {
            "align" => {
                let align = value()?;
                if !align.is_power_of_two() {
                    return Err(format!("`@align({align})` is not a power of two"));
                }
                attrs.align = Some(align);
            }
            "size" => attrs.size = Some(value()?),
            _ => {}
        }
        member = after.trim_start();
    }
    Ok((attrs, member))
}

/// (type, alignment, size) in the uniform address space.
fn wgsl_type(ty: &str) -> Option<(UniformType, usize, usize)> {
    let ty: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
    let info = match ty.as_str() {
        "i32" => (UniformType::Int, 4, 4),
        "f32" => (UniformType::Float, 4, 4),
        "vec2<f32>" | "vec2f" => (UniformType::Float2, 8, 8),
        "vec3<f32>" | "vec3f" => (UniformType::Float3, 16, 12),
        "vec4<f32>" | "vec4f" => (UniformType::Float4, 16, 16),
        "mat3x3<f32>" | "mat3x3f" => (UniformType::Mat3, 16, 48),
        "mat4x4<f32>" | "mat4x4f" => (UniformType::Mat4, 16, 64),
        _ => return None,
    };
    Some(info)
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

fn encode(value: UniformValue) -> Vec<u8> {
    match value {
        UniformValue::Int(v) => bytemuck::bytes_of(&v).to_vec(),
        UniformValue::Float(v) => bytemuck::bytes_of(&v).to_vec(),
        UniformValue::Float2(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        UniformValue::Float3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        UniformValue::Float4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        UniformValue::Mat3(m) => mat3_columns(m),
        UniformValue::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
    }
}

/// mat3x3 columns are vec3s padded to 16 bytes.
fn mat3_columns(m: Mat3) -> Vec<u8> {
    let mut padded = [0.0f32; 12];
    for (i, col) in [m.x_axis, m.y_axis, m.z_axis].into_iter().enumerate() {
        padded[i * 4..i * 4 + 3].copy_from_slice(&col.to_array());
    }
    bytemuck::cast_slice(&padded).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3, Vec4};

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    const FLAT_COLOR_VS: &str = "
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Transform: mat4x4<f32>,
    u_Color: vec3<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(@location(0) a_Position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.u_ViewProjection * uniforms.u_Transform * vec4<f32>(a_Position, 1.0);
}
";

    #[test]
    fn offsets_follow_uniform_layout_rules() {
        let block = reflect_stage("FlatColor", FLAT_COLOR_VS).unwrap().unwrap();
        assert_eq!(block.field("u_ViewProjection").unwrap().offset, 0);
        assert_eq!(block.field("u_Transform").unwrap().offset, 64);
        assert_eq!(block.field("u_Color").unwrap().offset, 128);
        assert_eq!(block.field("u_Color").unwrap().ty, UniformType::Float3);
        assert_eq!(block.size(), 144);
    }

    #[test]
    fn scalars_pack_and_vec3_realigns() {
        let src = "
struct U {
    a: f32,
    b: i32,
    c: vec3f, // starts on a 16-byte boundary
    d: f32,
}
@group(0) @binding(0) var<uniform> u: U;
";
        let block = reflect_stage("s", src).unwrap().unwrap();
        assert_eq!(block.field("a").unwrap().offset, 0);
        assert_eq!(block.field("b").unwrap().offset, 4);
        assert_eq!(block.field("c").unwrap().offset, 16);
        assert_eq!(block.field("d").unwrap().offset, 28);
        assert_eq!(block.size(), 32);
    }

    #[test]
    fn source_without_uniforms_has_empty_block() {
        let block = reflect_program("s", "@vertex fn vs() {}", "@fragment fn fs() {}").unwrap();
        assert!(block.is_empty());
        assert_eq!(block.size(), 0);
    }

    #[test]
    fn stages_must_agree_on_the_block() {
        let other = "struct U { x: f32 } @group(0) @binding(0) var<uniform> u: U;";
        assert!(reflect_program("s", FLAT_COLOR_VS, other).is_err());
        assert!(reflect_program("s", FLAT_COLOR_VS, FLAT_COLOR_VS).is_ok());
    }

    #[test]
    fn unsupported_member_type_is_a_source_error() {
        let src = "struct U { x: vec4<u32> } @group(0) @binding(0) var<uniform> u: U;";
        assert!(matches!(
            reflect_stage("s", src),
            Err(RenderError::ShaderSource { .. })
        ));
    }

    #[test]
    fn write_ignores_unknown_names_and_mismatched_types() {
        let block = reflect_stage("FlatColor", FLAT_COLOR_VS).unwrap().unwrap();
        let mut data = vec![0u8; block.size()];

        assert!(!block.write(&mut data, "u_Missing", UniformValue::Float(1.0)));
        assert!(!block.write(&mut data, "u_Color", UniformValue::Float4(Vec4::ONE)));
        assert!(data.iter().all(|b| *b == 0));

        assert!(block.write(&mut data, "u_Color", UniformValue::Float3(Vec3::new(1.0, 2.0, 3.0))));
        assert_eq!(floats(&data[128..140]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn matrices_are_written_column_major() {
        let block = reflect_stage("FlatColor", FLAT_COLOR_VS).unwrap().unwrap();
        let mut data = vec![0u8; block.size()];
        let m = Mat4::from_translation(Vec3::new(5.0, 6.0, 7.0));
        assert!(block.write(&mut data, "u_Transform", UniformValue::Mat4(m)));

        assert_eq!(floats(&data[64..128])[12..15], [5.0, 6.0, 7.0]);
    }

    #[test]
    fn mat3_columns_are_padded() {
        let columns = floats(&mat3_columns(Mat3::IDENTITY));
        assert_eq!(columns.len(), 12);
        assert_eq!(columns[0..4], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(columns[4..8], [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn align_and_size_attributes_move_offsets() {
        let src = "
struct U {
    a: f32,
    @align(16) b: f32,
    @size(32) c: f32,
    d: f32,
}
@group(0) @binding(0) var<uniform> u: U;
";
        let block = reflect_stage("s", src).unwrap().unwrap();
        assert_eq!(block.field("a").unwrap().offset, 0);
        assert_eq!(block.field("b").unwrap().offset, 16);
        assert_eq!(block.field("c").unwrap().offset, 20);
        assert_eq!(block.field("d").unwrap().offset, 52);
        assert_eq!(block.size(), 64);
    }

    #[test]
    fn align_attribute_never_lowers_type_alignment() {
        let src = "
struct U {
    a: f32,
    @align(4) b: vec4f,
    @align(32) c: f32,
}
@group(0) @binding(0) var<uniform> u: U;
";
        let block = reflect_stage("s", src).unwrap().unwrap();
        assert_eq!(block.field("b").unwrap().offset, 16);
        assert_eq!(block.field("c").unwrap().offset, 32);
        assert_eq!(block.size(), 64);
    }

    #[test]
    fn other_member_attributes_are_skipped() {
        let (attrs, rest) = split_attributes("@size(16u) @invariant x: f32").unwrap();
        assert_eq!(rest, "x: f32");
        assert_eq!(attrs, MemberAttributes { align: None, size: Some(16) });

        let (attrs, rest) = split_attributes("x: f32").unwrap();
        assert_eq!(rest, "x: f32");
        assert_eq!(attrs, MemberAttributes::default());
    }

    #[test]
    fn malformed_layout_attributes_are_source_errors() {
        for member in ["@align(12) x: f32", "@size(2) x: f32", "@size(n) x: f32"] {
            let src = format!("struct U {{ {member} }} @group(0) @binding(0) var<uniform> u: U;");
            assert!(
                matches!(reflect_stage("s", &src), Err(RenderError::ShaderSource { .. })),
                "{member}"
            );
        }
    }
}

//! GPU shaders
//!
//! One WGSL module drives every primitive: the fragment stage evaluates a
//! rounded-box SDF (with per-quadrant corner radius selection) and branches
//! on the per-instance kind discriminant into fill, hollow ring, text
//! coverage, gradient, or drop-shadow shading. Kind values and the instance
//! layout must match `crate::primitives`.

/// WGSL shader for the SDF instance pipeline
pub const SDF_SHADER: &str = r#"
// Kinds: 0 = fill (textured when uv.x >= 0), >0 = hollow with stroke width,
// -1 = text, -2 = linear gradient, -3 = radial gradient, -4 = box gradient,
// -5 = drop shadow. radii.y < 0 marks a plain rectangle.

struct Segment {
    transform: mat4x4<f32>,
    // device width, device height, pixel ratio, padding
    viewport: vec4<f32>,
};

struct Instance {
    bounds: vec4<f32>,
    radii: vec4<f32>,
    color0: vec4<f32>,
    color1: vec4<f32>,
    uv: vec4<f32>,
    kind: vec4<f32>,
};

@group(0) @binding(0) var<uniform> segment: Segment;
@group(0) @binding(1) var<storage, read> instances: array<Instance>;
@group(0) @binding(2) var atlas_texture: texture_2d<f32>;
@group(0) @binding(3) var atlas_sampler: sampler;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    // position within the quad, in rect-local pixels
    @location(0) local: vec2<f32>,
    @location(1) @interpolate(flat) instance_index: u32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VsOut {
    let inst = instances[instance_index];

    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 0.0), vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0), vec2<f32>(1.0, 1.0), vec2<f32>(0.0, 1.0),
    );
    let corner = corners[vertex_index];

    let k = inst.kind.x;
    // Expand the quad so feathered edges are not cut off. Textured quads
    // (text, images) map UVs exactly and get no outset.
    var outset = 1.0;
    if (k == -5.0) {
        outset = inst.uv.x + inst.uv.y + 1.0;
    } else if (k == -1.0 || (k == 0.0 && inst.uv.x >= 0.0)) {
        outset = 0.0;
    }

    let size = inst.bounds.zw;
    let local = corner * (size + 2.0 * outset) - vec2<f32>(outset);
    let world = (segment.transform * vec4<f32>(inst.bounds.xy + local, 0.0, 1.0)).xy;
    let device = world * segment.viewport.z;
    let ndc = vec2<f32>(
        device.x / segment.viewport.x * 2.0 - 1.0,
        1.0 - device.y / segment.viewport.y * 2.0,
    );

    var out: VsOut;
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.local = local;
    out.instance_index = instance_index;
    return out;
}

// Per-quadrant corner radius; p is center-relative, radii = (tl, tr, br, bl)
fn corner_radius(p: vec2<f32>, radii: vec4<f32>) -> f32 {
    if (p.x < 0.0) {
        if (p.y < 0.0) { return radii.x; }
        return radii.w;
    }
    if (p.y < 0.0) { return radii.y; }
    return radii.z;
}

fn sd_rounded_box(p: vec2<f32>, half_size: vec2<f32>, r: f32) -> f32 {
    let q = abs(p) - half_size + vec2<f32>(r);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - r;
}

// Active radius for this fragment; 0 on the rectangular fast path
fn active_radius(p: vec2<f32>, radii: vec4<f32>) -> f32 {
    if (radii.y < 0.0) {
        return 0.0;
    }
    return corner_radius(p, radii);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let inst = instances[in.instance_index];
    let size = inst.bounds.zw;
    let half_size = size * 0.5;
    let p = in.local - half_size;
    let k = inst.kind.x;

    // Sampled unconditionally: implicit derivatives need uniform control flow
    let tex_uv = mix(
        inst.uv.xy,
        inst.uv.zw,
        clamp(in.local / max(size, vec2<f32>(1e-6)), vec2<f32>(0.0), vec2<f32>(1.0)),
    );
    let texel = textureSample(atlas_texture, atlas_sampler, tex_uv);
    let coverage_width = 0.5 * fwidth(texel.r) + 0.25;

    let r = active_radius(p, inst.radii);

    var color = inst.color0;
    var alpha = 0.0;

    if (k == -1.0) {
        // Text: red channel is coverage; derivative-modulated smoothstep
        // keeps small text crisp and large text soft
        alpha = smoothstep(0.5 - coverage_width, 0.5 + coverage_width, texel.r);
    } else if (k == -5.0) {
        // Drop shadow: SDF outset by spread, feathered over the blur width
        let spread = inst.uv.x;
        let blur = max(inst.uv.y, 1e-3);
        let d = sd_rounded_box(p, half_size + vec2<f32>(spread), r + spread);
        alpha = 1.0 - smoothstep(-blur, blur, d);
    } else if (k > 0.0) {
        // Hollow ring: outer SDF minus the inset inner SDF
        let outer = sd_rounded_box(p, half_size, r);
        let inner = sd_rounded_box(
            p,
            max(half_size - vec2<f32>(k), vec2<f32>(0.0)),
            max(r - k, 0.0),
        );
        alpha = clamp(0.5 - max(outer, -inner), 0.0, 1.0);
    } else {
        // Filled shapes: one-pixel feathered coverage from the SDF
        let d = sd_rounded_box(p, half_size, r);
        alpha = clamp(0.5 - d, 0.0, 1.0);

        if (k == -2.0) {
            let dir = inst.uv.zw - inst.uv.xy;
            let t = clamp(
                dot(in.local - inst.uv.xy, dir) / max(dot(dir, dir), 1e-6),
                0.0,
                1.0,
            );
            color = mix(inst.color0, inst.color1, t);
        } else if (k == -3.0) {
            let q = (in.local - inst.uv.xy) / max(inst.uv.zw, vec2<f32>(1e-6));
            color = mix(inst.color0, inst.color1, clamp(length(q), 0.0, 1.0));
        } else if (k == -4.0) {
            let inset = inst.uv.x;
            let feather = max(inst.uv.y, 1e-3);
            let d_inner = sd_rounded_box(
                p,
                max(half_size - vec2<f32>(inset), vec2<f32>(0.0)),
                max(r - inset, 0.0),
            );
            let t = clamp((d_inner + feather * 0.5) / feather, 0.0, 1.0);
            color = mix(inst.color0, inst.color1, t);
        } else if (inst.uv.x >= 0.0) {
            // Textured fill: tint the atlas sample with color0
            color = inst.color0 * texel;
        }
    }

    return vec4<f32>(color.rgb, color.a * alpha);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdf_shader_parses() {
        naga::front::wgsl::parse_str(SDF_SHADER).expect("SDF shader must parse");
    }

    #[test]
    fn test_sdf_shader_validates() {
        let module = naga::front::wgsl::parse_str(SDF_SHADER).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .expect("SDF shader must validate");
    }
}

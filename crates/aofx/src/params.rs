use aofx_pal::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec2, Vec4};
use static_assertions::const_assert_eq;

use crate::desc::{Camera, LayerDesc};

/// Parameter blob of the AO estimation kernels.
///
/// Sizes are filled in by the scheduler per pass; the constructor covers the
/// camera and layer derived fields.
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct AoConstants {
    pub output_size: UVec2,
    pub output_size_rcp: Vec2,
    pub input_size: UVec2,
    pub input_size_rcp: Vec2,

    pub camera_q: f32,
    pub camera_q_times_znear: f32,
    pub camera_tan_half_fov_horizontal: f32,
    pub camera_tan_half_fov_vertical: f32,

    pub reject_radius: f32,
    pub accept_radius: f32,
    pub recip_fade_out_dist: f32,
    pub linear_intensity: f32,

    pub normal_scale: f32,
    pub layer_scale: f32,
    pub view_distance_fade: f32,
    pub view_distance_discard: f32,

    pub fade_interval_length: f32,
    pub _pad: [f32; 3],
}

const_assert_eq!(std::mem::size_of::<AoConstants>() % 16, 0);

impl AoConstants {
    pub fn new(camera: &Camera, layer: &LayerDesc) -> Self {
        let camera_q = camera.far / (camera.far - camera.near);
        Self {
            output_size: UVec2::ZERO,
            output_size_rcp: Vec2::ZERO,
            input_size: UVec2::ZERO,
            input_size_rcp: Vec2::ZERO,
            camera_q,
            camera_q_times_znear: camera_q * camera.near,
            camera_tan_half_fov_horizontal: (camera.fov * 0.5 * camera.aspect).tan(),
            camera_tan_half_fov_vertical: (camera.fov * 0.5).tan(),
            reject_radius: layer.reject_radius,
            accept_radius: layer.accept_radius,
            recip_fade_out_dist: layer.recip_fade_out_dist,
            linear_intensity: layer.linear_intensity,
            normal_scale: layer.normal_scale,
            layer_scale: layer.scale,
            view_distance_fade: layer.view_distance_fade,
            view_distance_discard: layer.view_distance_discard,
            fade_interval_length: layer.view_distance_discard - layer.view_distance_fade,
            _pad: [0.0; 3],
        }
    }
}

/// Parameter blob shared by the input preparation and blur passes.
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct InputConstants {
    pub output_size: UVec2,
    pub output_size_rcp: Vec2,
    pub input_size: UVec2,
    pub input_size_rcp: Vec2,

    pub z_far: f32,
    pub z_near: f32,
    pub camera_q: f32,
    pub camera_q_times_znear: f32,

    pub camera_tan_half_fov_horizontal: f32,
    pub camera_tan_half_fov_vertical: f32,
    pub depth_upsample_threshold: f32,
    pub normal_scale: f32,

    pub scale: f32,
    pub scale_rcp: f32,
    pub _pad: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<InputConstants>() % 16, 0);

impl InputConstants {
    pub fn new(camera: &Camera, layer: &LayerDesc) -> Self {
        let camera_q = camera.far / (camera.far - camera.near);
        Self {
            output_size: UVec2::ZERO,
            output_size_rcp: Vec2::ZERO,
            input_size: UVec2::ZERO,
            input_size_rcp: Vec2::ZERO,
            z_far: camera.far,
            z_near: camera.near,
            camera_q,
            camera_q_times_znear: camera_q * camera.near,
            camera_tan_half_fov_horizontal: (camera.fov * 0.5 * camera.aspect).tan(),
            camera_tan_half_fov_vertical: (camera.fov * 0.5).tan(),
            depth_upsample_threshold: layer.depth_upsample_threshold,
            normal_scale: layer.normal_scale,
            scale: layer.scale,
            scale_rcp: 1.0 / layer.scale,
            _pad: [0.0; 2],
        }
    }

    pub fn with_sizes(mut self, output_size: UVec2, input_size: UVec2) -> Self {
        self.output_size = output_size;
        self.output_size_rcp = Vec2::ONE / output_size.as_vec2();
        self.input_size = input_size;
        self.input_size_rcp = Vec2::ONE / input_size.as_vec2();
        self
    }
}

/// Pipeline-wide blob refreshed unconditionally on every `resize`.
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DilateConstants {
    /// Output size (xy) and reciprocal (zw).
    pub output_size: Vec4,
    pub camera_q: f32,
    pub camera_q_times_znear: f32,
    pub _pad: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<DilateConstants>() % 16, 0);

impl DilateConstants {
    pub fn new(camera: &Camera, input_size: UVec2) -> Self {
        let camera_q = camera.far / (camera.far - camera.near);
        Self {
            output_size: Vec4::new(
                input_size.x as f32,
                input_size.y as f32,
                1.0 / input_size.x as f32,
                1.0 / input_size.y as f32,
            ),
            camera_q,
            camera_q_times_znear: camera_q * camera.near,
            _pad: [0.0; 2],
        }
    }
}

/// Per-layer gamma forwarded to the merge pass. Uploaded unconditionally;
/// this blob is not one of the cached pass families.
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct MergeConstants {
    pub pow_intensity: Vec4,
}

const_assert_eq!(std::mem::size_of::<MergeConstants>() % 16, 0);

/// Host-side shadow of the last uploaded blob for one constant buffer.
///
/// The shadow starts empty and is cleared whenever the owning layer is
/// disabled, so a later re-enable always re-uploads.
pub(crate) struct CbCache<T: Pod> {
    shadow: Option<T>,
}

impl<T: Pod> Default for CbCache<T> {
    fn default() -> Self {
        Self { shadow: None }
    }
}

impl<T: Pod> CbCache<T> {
    pub fn clear(&mut self) {
        self.shadow = None;
    }

    /// Byte-compares `value` against the shadow and maps/writes the buffer
    /// only on inequality. Returns whether an upload happened.
    pub fn upload_if_changed<B: Backend>(
        &mut self,
        buffer: &Buffer<B>,
        value: &T,
    ) -> Result<bool, BufferViewError> {
        if let Some(prev) = &self.shadow {
            if bytemuck::bytes_of(prev) == bytemuck::bytes_of(value) {
                return Ok(false);
            }
        }
        upload(buffer, value)?;
        self.shadow = Some(*value);
        Ok(true)
    }
}

/// The three cached pass families, one shadow per layer each.
#[derive(Default)]
pub(crate) struct ParamCaches {
    pub ao: [CbCache<AoConstants>; crate::desc::LAYER_COUNT],
    pub input: [CbCache<InputConstants>; crate::desc::LAYER_COUNT],
    pub blur: [CbCache<InputConstants>; crate::desc::LAYER_COUNT],
}

impl ParamCaches {
    pub fn clear_layer(&mut self, layer: usize) {
        self.ao[layer].clear();
        self.input[layer].clear();
        self.blur[layer].clear();
    }
}

/// Writes `value` into array element 0 of `buffer` without any dirty check.
pub(crate) fn upload<B: Backend, T: Pod>(
    buffer: &Buffer<B>,
    value: &T,
) -> Result<(), BufferViewError> {
    let bytes = bytemuck::bytes_of(value);
    let mut view = buffer.write(0)?;
    view[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

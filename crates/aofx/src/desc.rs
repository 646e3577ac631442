use aofx_pal::prelude::*;
use bitflags::bitflags;
use glam::UVec2;
use serde::{Deserialize, Serialize};

/// Number of independently configured resolution layers. Fixed.
pub const LAYER_COUNT: usize = 3;

bitflags! {
    /// Selects between the pixel shader and compute shader code paths for
    /// the AO kernels and the input preparation utility passes. Bits of the
    /// same family may be combined, in which case both paths run.
    #[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(transparent)]
    pub struct Implementation: u32 {
        const KERNEL_CS  = 0b0001;
        const KERNEL_PS  = 0b0010;
        const UTILITY_CS = 0b0100;
        const UTILITY_PS = 0b1000;
    }
}

impl Default for Implementation {
    fn default() -> Self {
        Implementation::KERNEL_CS | Implementation::UTILITY_CS
    }
}

/// How a layer's input is tiled before AO estimation.
#[derive(Debug, Default, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerProcess {
    /// The layer does not run at all.
    Disabled,
    /// Process the input at its native (scaled) resolution.
    #[default]
    Native,
    Deinterleave2,
    Deinterleave4,
    Deinterleave8,
}

impl LayerProcess {
    #[inline(always)]
    pub fn is_enabled(self) -> bool {
        self != LayerProcess::Disabled
    }

    /// Tiling factor. The identity tiling of [`Native`](LayerProcess::Native)
    /// is factor 1.
    #[inline(always)]
    pub fn deinterleave_factor(self) -> u32 {
        match self {
            LayerProcess::Disabled | LayerProcess::Native => 1,
            LayerProcess::Deinterleave2 => 2,
            LayerProcess::Deinterleave4 => 4,
            LayerProcess::Deinterleave8 => 8,
        }
    }

    /// Index into the kernel variant tables. Disabled layers are never
    /// dispatched.
    #[inline(always)]
    pub(crate) fn kernel_index(self) -> usize {
        match self {
            LayerProcess::Native => 0,
            LayerProcess::Deinterleave2 => 1,
            LayerProcess::Deinterleave4 => 2,
            LayerProcess::Deinterleave8 => 3,
            LayerProcess::Disabled => unreachable!("disabled layers are not dispatched"),
        }
    }
}

/// Kernel radius of the separable bilateral blur, in pixels.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlurRadius {
    R2,
    R4,
    R8,
    R16,
}

impl BlurRadius {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        match self {
            BlurRadius::R2 => 0,
            BlurRadius::R4 => 1,
            BlurRadius::R8 => 2,
            BlurRadius::R16 => 3,
        }
    }

    #[inline(always)]
    pub fn pixels(self) -> u32 {
        match self {
            BlurRadius::R2 => 2,
            BlurRadius::R4 => 4,
            BlurRadius::R8 => 8,
            BlurRadius::R16 => 16,
        }
    }
}

/// Whether the AO estimator reconstructs positions using a normal buffer.
#[derive(Debug, Default, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NormalOption {
    #[default]
    None,
    FromTexture,
}

impl NormalOption {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        match self {
            NormalOption::None => 0,
            NormalOption::FromTexture => 1,
        }
    }
}

/// Sampling tap strategy of the AO estimator.
#[derive(Debug, Default, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TapType {
    /// A fixed tap pattern baked into the kernel.
    #[default]
    Fixed,
    /// Random taps fetched from the sample pattern uniform buffer.
    RandomUniform,
    /// Random taps fetched from the sample pattern storage buffer.
    RandomBuffer,
}

impl TapType {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        match self {
            TapType::Fixed => 0,
            TapType::RandomUniform => 1,
            TapType::RandomBuffer => 2,
        }
    }
}

/// Number of estimator taps per pixel: 8, 16, 24 or 32.
#[derive(Debug, Default, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleCount {
    #[default]
    Low,
    Medium,
    High,
    Ultra,
}

impl SampleCount {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        match self {
            SampleCount::Low => 0,
            SampleCount::Medium => 1,
            SampleCount::High => 2,
            SampleCount::Ultra => 3,
        }
    }

    #[inline(always)]
    pub fn taps(self) -> u32 {
        match self {
            SampleCount::Low => 8,
            SampleCount::Medium => 16,
            SampleCount::High => 24,
            SampleCount::Ultra => 32,
        }
    }
}

/// Per-layer tunables.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct LayerDesc {
    pub process: LayerProcess,
    /// Resolution scale. Must be in `(0, 1]`.
    pub scale: f32,
    pub normals: NormalOption,
    pub tap_type: TapType,
    pub sample_count: SampleCount,
    /// `None` skips blurring for this layer.
    pub blur_radius: Option<BlurRadius>,
    /// Gamma applied to the layer during the merge pass.
    pub pow_intensity: f32,
    pub reject_radius: f32,
    pub accept_radius: f32,
    pub recip_fade_out_dist: f32,
    pub linear_intensity: f32,
    pub normal_scale: f32,
    /// AO is not computed past this camera space distance. Must be greater
    /// than `view_distance_fade`.
    pub view_distance_discard: f32,
    /// AO starts fading to 1.0 past this camera space distance.
    pub view_distance_fade: f32,
    pub depth_upsample_threshold: f32,
}

impl Default for LayerDesc {
    fn default() -> Self {
        Self {
            process: LayerProcess::Native,
            scale: 1.0,
            normals: NormalOption::None,
            tap_type: TapType::Fixed,
            sample_count: SampleCount::Low,
            blur_radius: None,
            pow_intensity: 1.0,
            reject_radius: 0.8,
            accept_radius: 0.003,
            recip_fade_out_dist: 6.0,
            linear_intensity: 0.6,
            normal_scale: 0.1,
            view_distance_discard: 100.0,
            view_distance_fade: 99.0,
            depth_upsample_threshold: 0.05,
        }
    }
}

impl LayerDesc {
    /// Input size after applying the layer's resolution scale, clamped to at
    /// least one pixel per axis.
    #[inline]
    pub fn scaled_size(&self, input_size: UVec2) -> UVec2 {
        UVec2::new(
            ((input_size.x as f32 * self.scale) as u32).max(1),
            ((input_size.y as f32 * self.scale) as u32).max(1),
        )
    }

    /// Size of one tile of the deinterleaved input surface.
    #[inline]
    pub fn deinterleaved_size(&self, input_size: UVec2) -> UVec2 {
        let scaled = self.scaled_size(input_size);
        let factor = self.process.deinterleave_factor();
        UVec2::new(scaled.x.div_ceil(factor), scaled.y.div_ceil(factor))
    }
}

/// Camera properties used to reconstruct view space positions from depth.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// The per-call configuration snapshot. The caller owns this and the
/// referenced views; the effect owns everything it allocates from it.
pub struct AoDescriptor<'a, B: Backend> {
    pub layers: [LayerDesc; LAYER_COUNT],
    pub camera: Camera,
    /// Dimensions of the depth input. Must be nonzero for `resize`/`render`.
    pub input_size: UVec2,
    /// Required by `render`.
    pub depth: Option<&'a Texture<B>>,
    /// Consulted only by layers with [`NormalOption::FromTexture`]. Must
    /// match the depth input's dimensions.
    pub normal: Option<&'a Texture<B>>,
    /// Required by `render`. Must match `input_size`.
    pub output: Option<&'a Texture<B>>,
    pub implementation: Implementation,
    /// Channels of the output target written by the composite pass.
    pub output_channels: ColorComponents,
    /// Overrides `output_channels` with a full blend description when set.
    pub output_blend: Option<ColorBlendAttachment>,
}

impl<'a, B: Backend> Default for AoDescriptor<'a, B> {
    fn default() -> Self {
        let mut layers = [LayerDesc::default(); LAYER_COUNT];
        for (i, layer) in layers.iter_mut().enumerate() {
            layer.scale = 1.0 / 2.0_f32.powi(i as i32);
        }
        Self {
            layers,
            camera: Camera::default(),
            input_size: UVec2::ZERO,
            depth: None,
            normal: None,
            output: None,
            implementation: Implementation::default(),
            output_channels: ColorComponents::ALL,
            output_blend: None,
        }
    }
}

impl<'a, B: Backend> AoDescriptor<'a, B> {
    #[inline]
    pub fn any_enabled(&self) -> bool {
        self.layers.iter().any(|l| l.process.is_enabled())
    }

    /// 3-bit mask of enabled layers, bit `i` for layer `i`.
    #[inline]
    pub fn active_mask(&self) -> usize {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.process.is_enabled())
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }
}

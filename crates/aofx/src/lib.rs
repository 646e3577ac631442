//! Multi resolution, multi layer screen space ambient occlusion.
//!
//! The effect estimates occlusion from a depth buffer (and optionally a
//! normal buffer) over up to three independently configured resolution
//! layers, merges the layers with a depth aware dilate, and composites the
//! result onto a caller provided render target.
//!
//! [`AoFx`] owns every GPU resource involved. Callers describe a frame with
//! an [`AoDescriptor`](desc::AoDescriptor), call [`AoFx::resize`] whenever
//! the configuration changes shape, and [`AoFx::render`] once per frame.

pub mod desc;

mod params;
mod passes;
mod patterns;
mod resources;
mod shaders;

#[cfg(test)]
mod tests;

use aofx_pal::prelude::*;
use log::info;
use thiserror::Error;

use desc::AoDescriptor;
use params::{upload, AoConstants, DilateConstants, InputConstants, MergeConstants, ParamCaches};
use patterns::SamplePatterns;
use resources::SurfacePool;
use shaders::ShaderTable;

#[derive(Debug, Error)]
pub enum AoFxError {
    #[error("input size must be nonzero")]
    InvalidArgument,
    #[error("a depth input is required")]
    MissingDepthInput,
    #[error("an output target is required")]
    MissingOutputTarget,
    #[error("the effect has been released")]
    NotInitialized,
    #[error("surfaces have not been allocated for the active layers")]
    SurfacesNotReady,
    #[error(transparent)]
    BufferCreate(#[from] BufferCreateError),
    #[error(transparent)]
    TextureCreate(#[from] TextureCreateError),
    #[error(transparent)]
    ShaderCreate(#[from] ShaderCreateError),
    #[error(transparent)]
    ComputePipelineCreate(#[from] ComputePipelineCreateError),
    #[error(transparent)]
    GraphicsPipelineCreate(#[from] GraphicsPipelineCreateError),
    #[error(transparent)]
    BufferView(#[from] BufferViewError),
}

/// Counters accumulated across the lifetime of the effect. They survive
/// [`AoFx::release`].
#[derive(Debug, Default, Copy, Clone)]
pub struct RenderStats {
    /// Surfaces allocated by reconfiguration.
    pub surface_reallocs: u64,
    /// Input preparation constant uploads that were not elided.
    pub input_uploads: u64,
    /// AO kernel constant uploads that were not elided.
    pub ao_uploads: u64,
    /// Blur constant uploads that were not elided.
    pub blur_uploads: u64,
}

/// Every parameter buffer of the pipeline. The per layer families are backed
/// by one buffer per layer so uploads for one layer never invalidate another.
pub(crate) struct ConstantBuffers<B: Backend> {
    pub ao: [Buffer<B>; desc::LAYER_COUNT],
    pub input: [Buffer<B>; desc::LAYER_COUNT],
    pub blur: [Buffer<B>; desc::LAYER_COUNT],
    pub dilate: Buffer<B>,
    pub merge: Buffer<B>,
    /// Random tap table for [`TapType::RandomUniform`](desc::TapType), 16
    /// byte entries. Written once.
    pub pattern_uniform: Buffer<B>,
    /// Random tap table for [`TapType::RandomBuffer`](desc::TapType), packed
    /// `i8` pairs. Written once.
    pub pattern_storage: Buffer<B>,
}

fn uniform_buffer<B: Backend>(
    ctx: &Context<B>,
    size: u64,
    debug_name: String,
) -> Result<Buffer<B>, AoFxError> {
    Ok(Buffer::new(
        ctx.clone(),
        BufferCreateInfo {
            size,
            array_elements: 1,
            buffer_usage: BufferUsage::UNIFORM_BUFFER,
            memory_usage: MemoryUsage::CpuToGpu,
            debug_name: Some(debug_name),
        },
    )?)
}

impl<B: Backend> ConstantBuffers<B> {
    fn new(ctx: &Context<B>) -> Result<Self, AoFxError> {
        let per_layer = |size: u64, family: &str| -> Result<[Buffer<B>; 3], AoFxError> {
            Ok([
                uniform_buffer(ctx, size, format!("ao_{family}_cb_0"))?,
                uniform_buffer(ctx, size, format!("ao_{family}_cb_1"))?,
                uniform_buffer(ctx, size, format!("ao_{family}_cb_2"))?,
            ])
        };

        let patterns = SamplePatterns::generate();

        let pattern_uniform = uniform_buffer(
            ctx,
            std::mem::size_of_val(patterns.uniform_taps.as_slice()) as u64,
            "ao_pattern_uniform".into(),
        )?;
        {
            let mut view = pattern_uniform.write(0)?;
            view.copy_from_slice(bytemuck::cast_slice(&patterns.uniform_taps));
        }

        let pattern_storage = Buffer::new(
            ctx.clone(),
            BufferCreateInfo {
                size: std::mem::size_of_val(patterns.buffer_taps.as_slice()) as u64,
                array_elements: 1,
                buffer_usage: BufferUsage::STORAGE_BUFFER,
                memory_usage: MemoryUsage::CpuToGpu,
                debug_name: Some("ao_pattern_storage".into()),
            },
        )?;
        {
            let mut view = pattern_storage.write(0)?;
            view.copy_from_slice(bytemuck::cast_slice(&patterns.buffer_taps));
        }

        Ok(Self {
            ao: per_layer(std::mem::size_of::<AoConstants>() as u64, "kernel")?,
            input: per_layer(std::mem::size_of::<InputConstants>() as u64, "input")?,
            blur: per_layer(std::mem::size_of::<InputConstants>() as u64, "blur")?,
            dilate: uniform_buffer(
                ctx,
                std::mem::size_of::<DilateConstants>() as u64,
                "ao_dilate_cb".into(),
            )?,
            merge: uniform_buffer(
                ctx,
                std::mem::size_of::<MergeConstants>() as u64,
                "ao_merge_cb".into(),
            )?,
            pattern_uniform,
            pattern_storage,
        })
    }
}

/// Everything [`AoFx::release`] throws away and [`AoFx::initialize`]
/// rebuilds.
pub(crate) struct FxState<B: Backend> {
    pub shaders: ShaderTable<B>,
    pub pool: SurfacePool<B>,
    pub buffers: ConstantBuffers<B>,
    pub caches: ParamCaches,
}

/// The ambient occlusion effect.
pub struct AoFx<B: Backend> {
    ctx: Context<B>,
    pub(crate) state: Option<FxState<B>>,
    stats: RenderStats,
}

impl<B: Backend> AoFx<B> {
    /// Creates the effect and all configuration independent GPU objects.
    /// Surfaces are not allocated until the first [`resize`](AoFx::resize).
    pub fn new(ctx: Context<B>) -> Result<Self, AoFxError> {
        let mut fx = Self {
            ctx,
            state: None,
            stats: RenderStats::default(),
        };
        fx.initialize()?;
        Ok(fx)
    }

    /// Rebuilds the GPU state after a [`release`](AoFx::release). A no-op
    /// when already initialized.
    pub fn initialize(&mut self) -> Result<(), AoFxError> {
        if self.state.is_some() {
            return Ok(());
        }

        let shaders = ShaderTable::new(&self.ctx)?;
        let buffers = ConstantBuffers::new(&self.ctx)?;
        info!("ao effect initialized");

        self.state = Some(FxState {
            shaders,
            pool: SurfacePool::new(self.ctx.clone()),
            buffers,
            caches: ParamCaches::default(),
        });
        Ok(())
    }

    /// Frees every GPU object owned by the effect. Idempotent. A released
    /// effect fails [`resize`](AoFx::resize) and [`render`](AoFx::render)
    /// with [`AoFxError::NotInitialized`] until reinitialized.
    pub fn release(&mut self) {
        self.state = None;
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    #[inline(always)]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Reconciles all owned surfaces with `desc`, then refreshes the dilate
    /// constants for the new dimensions. Must be called before the first
    /// [`render`](AoFx::render) and after any change to the input size, a
    /// layer's process mode, scale, or normal option.
    pub fn resize(&mut self, desc: &AoDescriptor<B>) -> Result<(), AoFxError> {
        let state = self.state.as_mut().ok_or(AoFxError::NotInitialized)?;
        state
            .pool
            .reconcile(desc, &mut state.caches, &mut self.stats)?;
        upload(
            &state.buffers.dilate,
            &DilateConstants::new(&desc.camera, desc.input_size),
        )?;
        Ok(())
    }
}

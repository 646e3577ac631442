use aofx_pal::prelude::*;
use glam::UVec2;
use log::debug;

use crate::{
    desc::{AoDescriptor, LayerProcess, NormalOption, LAYER_COUNT},
    params::ParamCaches,
    AoFxError, RenderStats,
};

pub(crate) const FORMAT_AO: Format = Format::R8Unorm;
pub(crate) const FORMAT_DEPTH: Format = Format::R16SFloat;
pub(crate) const FORMAT_DEPTH_NORMAL: Format = Format::Rgba16SFloat;

fn input_format(normals: NormalOption) -> Format {
    match normals {
        NormalOption::None => FORMAT_DEPTH,
        NormalOption::FromTexture => FORMAT_DEPTH_NORMAL,
    }
}

/// Owns every surface of the pipeline and reconciles it against the current
/// configuration. Disabled layers hold no surfaces.
pub(crate) struct SurfacePool<B: Backend> {
    ctx: Context<B>,
    /// Shared cross-layer merge surface, full resolution.
    pub merge: Option<Texture<B>>,
    /// Per-layer AO estimate, full resolution.
    pub ao: [Option<Texture<B>>; LAYER_COUNT],
    /// Per-layer scaled intermediate AO result.
    pub result: [Option<Texture<B>>; LAYER_COUNT],
    /// Per-layer deinterleaved input, `factor^2` array elements.
    pub input: [Option<Texture<B>>; LAYER_COUNT],

    pub resolution: UVec2,
    applied_process: [LayerProcess; LAYER_COUNT],
    applied_normals: [NormalOption; LAYER_COUNT],
    pub scaled: [UVec2; LAYER_COUNT],
}

impl<B: Backend> SurfacePool<B> {
    pub fn new(ctx: Context<B>) -> Self {
        Self {
            ctx,
            merge: None,
            ao: Default::default(),
            result: Default::default(),
            input: Default::default(),
            resolution: UVec2::ZERO,
            applied_process: [LayerProcess::Disabled; LAYER_COUNT],
            applied_normals: [NormalOption::None; LAYER_COUNT],
            scaled: [UVec2::ONE; LAYER_COUNT],
        }
    }

    fn surface(
        &self,
        debug_name: String,
        size: UVec2,
        array_elements: usize,
        format: Format,
        stats: &mut RenderStats,
    ) -> Result<Texture<B>, AoFxError> {
        stats.surface_reallocs += 1;
        debug!(
            "allocating {debug_name}: {}x{} x{array_elements} {format:?}",
            size.x, size.y
        );
        Ok(Texture::new(
            self.ctx.clone(),
            TextureCreateInfo {
                format,
                ty: TextureType::Type2D,
                width: size.x,
                height: size.y,
                depth: 1,
                array_elements,
                mip_levels: 1,
                texture_usage: TextureUsage::SAMPLED
                    | TextureUsage::STORAGE
                    | TextureUsage::COLOR_ATTACHMENT,
                memory_usage: MemoryUsage::GpuOnly,
                debug_name: Some(debug_name),
            },
        )?)
    }

    /// Reconciles all owned surfaces with `desc`. After a successful call
    /// every enabled layer has correctly sized surfaces and disabled layers
    /// hold none. On failure no further allocations are attempted; whatever
    /// was released stays released until the next successful call.
    pub fn reconcile(
        &mut self,
        desc: &AoDescriptor<B>,
        caches: &mut ParamCaches,
        stats: &mut RenderStats,
    ) -> Result<(), AoFxError> {
        let size = desc.input_size;
        if size.x == 0 || size.y == 0 {
            return Err(AoFxError::InvalidArgument);
        }
        for layer in desc.layers.iter().filter(|l| l.process.is_enabled()) {
            // Scale must be in (0, 1].
            if layer.scale <= 0.0 || layer.scale > 1.0 {
                return Err(AoFxError::InvalidArgument);
            }
        }

        let resolution_changed = self.resolution != size;
        if resolution_changed {
            self.merge = None;
            self.merge = Some(self.surface("ao_merge".into(), size, 1, FORMAT_AO, stats)?);
            self.resolution = size;
        }

        for i in 0..LAYER_COUNT {
            let layer = &desc.layers[i];

            if !layer.process.is_enabled() {
                self.ao[i] = None;
                self.result[i] = None;
                self.input[i] = None;
                // A later re-enable must force full re-upload.
                caches.clear_layer(i);
            } else {
                let was_disabled = !self.applied_process[i].is_enabled();
                if was_disabled || resolution_changed {
                    self.ao[i] = None;
                    self.ao[i] =
                        Some(self.surface(format!("ao_layer_{i}"), size, 1, FORMAT_AO, stats)?);
                }

                let scaled = layer.scaled_size(size);
                let mode_changed = layer.process != self.applied_process[i];
                let normal_changed = layer.normals != self.applied_normals[i];
                let scale_changed = self.scaled[i] != scaled;

                if mode_changed || resolution_changed || normal_changed || scale_changed {
                    let factor = layer.process.deinterleave_factor();
                    let deinterleaved = layer.deinterleaved_size(size);
                    let format = input_format(layer.normals);

                    self.result[i] = None;
                    self.result[i] = Some(self.surface(
                        format!("ao_result_{i}"),
                        scaled,
                        1,
                        FORMAT_AO,
                        stats,
                    )?);

                    self.input[i] = None;
                    self.input[i] = Some(self.surface(
                        format!("ao_input_{i}"),
                        deinterleaved,
                        (factor * factor) as usize,
                        format,
                        stats,
                    )?);

                    self.scaled[i] = scaled;
                }
            }

            self.applied_process[i] = layer.process;
            self.applied_normals[i] = layer.normals;
        }

        Ok(())
    }
}

use aofx_pal::prelude::*;
use glam::{UVec2, Vec2, Vec4};

use crate::{
    desc::{AoDescriptor, BlurRadius, Implementation, LayerDesc, NormalOption, LAYER_COUNT},
    params::{upload, AoConstants, InputConstants, MergeConstants},
    shaders::{
        ShaderTable, AO_GROUP_DIM, BLUR_GROUP_LINES, BLUR_GROUP_SIZE, DEINTERLEAVE_GROUP_DIM,
        LINEAR_CLAMP, POINT_CLAMP,
    },
    AoFx, AoFxError, ConstantBuffers,
};

/// A fully resolved view of one enabled layer for the duration of a single
/// `render` call.
struct LayerCtx<'a, B: Backend> {
    index: usize,
    desc: &'a LayerDesc,
    scaled: UVec2,
    deinterleaved: UVec2,
    ao: &'a Texture<B>,
    result: &'a Texture<B>,
    input: &'a Texture<B>,
}

impl<'a, B: Backend> LayerCtx<'a, B> {
    /// Where the AO kernel writes. Downscaled layers estimate into the
    /// scaled intermediate and get upsampled into `ao` afterwards.
    #[inline(always)]
    fn kernel_target(&self) -> &'a Texture<B> {
        if self.desc.scale < 1.0 {
            self.result
        } else {
            self.ao
        }
    }
}

impl<B: Backend> AoFx<B> {
    /// Runs the full pipeline for one frame and blocks until the GPU work
    /// completes.
    ///
    /// Requires a successful [`resize`](AoFx::resize) with the same input
    /// size and layer shape beforehand. With every layer disabled this is a
    /// no-op that succeeds without touching the GPU.
    pub fn render(&mut self, desc: &AoDescriptor<B>) -> Result<(), AoFxError> {
        let state = self.state.as_mut().ok_or(AoFxError::NotInitialized)?;

        let depth = desc.depth.ok_or(AoFxError::MissingDepthInput)?;
        let output = desc.output.ok_or(AoFxError::MissingOutputTarget)?;
        if desc.input_size.x == 0 || desc.input_size.y == 0 {
            return Err(AoFxError::InvalidArgument);
        }
        if !desc.any_enabled() {
            return Ok(());
        }

        let crate::FxState {
            shaders,
            pool,
            buffers,
            caches,
        } = state;

        if pool.resolution != desc.input_size {
            return Err(AoFxError::SurfacesNotReady);
        }

        let pool = &*pool;
        let buffers = &*buffers;
        let merge = pool.merge.as_ref().ok_or(AoFxError::SurfacesNotReady)?;

        let mut layers = Vec::with_capacity(LAYER_COUNT);
        for i in 0..LAYER_COUNT {
            let layer = &desc.layers[i];
            if !layer.process.is_enabled() {
                continue;
            }
            layers.push(LayerCtx {
                index: i,
                desc: layer,
                scaled: layer.scaled_size(desc.input_size),
                deinterleaved: layer.deinterleaved_size(desc.input_size),
                ao: pool.ao[i].as_ref().ok_or(AoFxError::SurfacesNotReady)?,
                result: pool.result[i].as_ref().ok_or(AoFxError::SurfacesNotReady)?,
                input: pool.input[i].as_ref().ok_or(AoFxError::SurfacesNotReady)?,
            });
        }

        // Layers may only share one blur over the merged image when every
        // active layer agrees on the radius.
        let mut active = [false; LAYER_COUNT];
        let mut radius: [Option<BlurRadius>; LAYER_COUNT] = [None; LAYER_COUNT];
        let mut max_radius = None;
        for i in 0..LAYER_COUNT {
            active[i] = desc.layers[i].process.is_enabled();
            radius[i] = if active[i] {
                desc.layers[i].blur_radius
            } else {
                None
            };
            max_radius = max_radius.max(radius[i]);
        }
        let mut separate_blur = false;
        for i in 0..LAYER_COUNT {
            let j = (i + 1) % LAYER_COUNT;
            separate_blur |= active[i] && active[j] && radius[i] != radius[j];
        }
        // The merged blur borrows the first active layer's surfaces and
        // parameters. All radii are equal at that point.
        let merged_slot = layers[0].index;

        let implementation = desc.implementation;

        // Upload phase. Every cached blob is compared against its shadow
        // before the passes are recorded so that recording stays infallible.
        for layer in &layers {
            let i = layer.index;

            if implementation.contains(Implementation::UTILITY_PS) {
                let blob = InputConstants::new(&desc.camera, layer.desc)
                    .with_sizes(layer.deinterleaved, desc.input_size);
                if caches.input[i].upload_if_changed(&buffers.input[i], &blob)? {
                    self.stats.input_uploads += 1;
                }
            }
            if implementation.contains(Implementation::UTILITY_CS) {
                let blob = InputConstants::new(&desc.camera, layer.desc)
                    .with_sizes(layer.deinterleaved, layer.scaled);
                if caches.input[i].upload_if_changed(&buffers.input[i], &blob)? {
                    self.stats.input_uploads += 1;
                }
            }

            if implementation
                .intersects(Implementation::KERNEL_CS | Implementation::KERNEL_PS)
            {
                let mut blob = AoConstants::new(&desc.camera, layer.desc);
                blob.output_size = layer.deinterleaved;
                blob.output_size_rcp = Vec2::ONE / layer.deinterleaved.as_vec2();
                blob.input_size = layer.scaled;
                blob.input_size_rcp = Vec2::splat(2.0) / layer.scaled.as_vec2();
                if caches.ao[i].upload_if_changed(&buffers.ao[i], &blob)? {
                    self.stats.ao_uploads += 1;
                }
            }
        }

        if separate_blur {
            for layer in &layers {
                if layer.desc.blur_radius.is_none() {
                    continue;
                }
                let blob = InputConstants::new(&desc.camera, layer.desc)
                    .with_sizes(desc.input_size, desc.input_size);
                if caches.blur[layer.index]
                    .upload_if_changed(&buffers.blur[layer.index], &blob)?
                {
                    self.stats.blur_uploads += 1;
                }
            }
        } else if max_radius.is_some() {
            let blob = InputConstants::new(&desc.camera, &desc.layers[merged_slot])
                .with_sizes(desc.input_size, desc.input_size);
            if caches.blur[merged_slot].upload_if_changed(&buffers.blur[merged_slot], &blob)? {
                self.stats.blur_uploads += 1;
            }
        }

        upload(
            &buffers.merge,
            &MergeConstants {
                pow_intensity: Vec4::new(
                    desc.layers[0].pow_intensity,
                    desc.layers[1].pow_intensity,
                    desc.layers[2].pow_intensity,
                    0.0,
                ),
            },
        )?;

        let output_pipeline = shaders.output_pipeline(desc.output_channels, desc.output_blend)?;
        let shaders = &*shaders;
        let normal = desc.normal;
        let active_mask = desc.active_mask();
        let input_size = desc.input_size;

        let queue = self.ctx.main();
        let job = queue.submit(Some("ao"), |commands| {
            // Input preparation.
            for layer in &layers {
                if implementation.contains(Implementation::UTILITY_PS) {
                    record_input_ps(commands, shaders, buffers, depth, normal, layer);
                }
                if implementation.contains(Implementation::UTILITY_CS) {
                    record_input_cs(commands, shaders, buffers, depth, normal, layer);
                }
            }

            // AO estimation.
            for layer in &layers {
                if implementation.contains(Implementation::KERNEL_CS) {
                    record_kernel_cs(commands, shaders, buffers, depth, normal, layer);
                }
                if implementation.contains(Implementation::KERNEL_PS) {
                    record_kernel_ps(commands, shaders, buffers, depth, normal, layer);
                }
            }

            // Downscaled layers come back to full resolution before merging.
            for layer in &layers {
                if layer.desc.scale < 1.0 {
                    record_upsample(commands, shaders, buffers, depth, layer);
                }
            }

            if separate_blur {
                for layer in &layers {
                    if let Some(radius) = layer.desc.blur_radius {
                        record_blur(
                            commands,
                            shaders,
                            buffers,
                            depth,
                            normal,
                            radius,
                            layer.index,
                            layer.kernel_target(),
                            merge,
                            merge,
                            layer.ao,
                            input_size,
                        );
                    }
                }
            }

            // Merge with a min filter across the active layers.
            commands.render_pass(
                RenderPassDescriptor {
                    color_attachments: vec![ColorAttachment {
                        texture: merge,
                        array_element: 0,
                        mip_level: 0,
                        load_op: LoadOp::DontCare,
                        store_op: StoreOp::Store,
                    }],
                    viewport: None,
                },
                Some("ao_dilate"),
                |pass| {
                    pass.bind_pipeline(shaders.dilate(active_mask).clone());
                    pass.bind_uniform_buffer(0, &buffers.merge, 0);
                    for layer in &layers {
                        pass.bind_texture(layer.index as u32, layer.ao, 0, LINEAR_CLAMP);
                        pass.bind_texture(3 + layer.index as u32, layer.input, 0, POINT_CLAMP);
                    }
                    pass.bind_texture(6, depth, 0, POINT_CLAMP);
                    pass.draw(3, 1, 0, 0);
                },
            );

            if !separate_blur {
                if let Some(radius) = max_radius {
                    let scratch = layers[0].ao;
                    record_blur(
                        commands,
                        shaders,
                        buffers,
                        depth,
                        normal,
                        radius,
                        merged_slot,
                        merge,
                        scratch,
                        scratch,
                        merge,
                        input_size,
                    );
                }
            }

            // Composite onto the caller's target, preserving its contents in
            // the untouched channels.
            commands.render_pass(
                RenderPassDescriptor {
                    color_attachments: vec![ColorAttachment {
                        texture: output,
                        array_element: 0,
                        mip_level: 0,
                        load_op: LoadOp::Load,
                        store_op: StoreOp::Store,
                    }],
                    viewport: Some(Viewport {
                        x: 0.0,
                        y: 0.0,
                        width: input_size.x as f32,
                        height: input_size.y as f32,
                    }),
                },
                Some("ao_output"),
                |pass| {
                    pass.bind_pipeline(output_pipeline);
                    pass.bind_texture(0, merge, 0, LINEAR_CLAMP);
                    pass.draw(3, 1, 0, 0);
                },
            );
        });
        job.wait_on(None);

        Ok(())
    }
}

fn record_input_cs<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    layer: &LayerCtx<'a, B>,
) {
    let pipeline = shaders.input_cs(layer.desc.process, layer.desc.normals);
    commands.compute_pass(pipeline, Some("ao_input_cs"), |pass| {
        pass.bind_uniform_buffer(0, &buffers.input[layer.index], 0);
        pass.bind_texture(0, depth, 0, POINT_CLAMP);
        if let (NormalOption::FromTexture, Some(normal)) = (layer.desc.normals, normal) {
            pass.bind_texture(1, normal, 0, POINT_CLAMP);
        }
        pass.bind_storage_image(0, layer.input, 0, 0);
        (
            layer.scaled.x.div_ceil(DEINTERLEAVE_GROUP_DIM),
            layer.scaled.y.div_ceil(DEINTERLEAVE_GROUP_DIM),
            1,
        )
    });
}

fn record_input_ps<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    layer: &LayerCtx<'a, B>,
) {
    let factor = layer.desc.process.deinterleave_factor();
    commands.render_pass(
        RenderPassDescriptor {
            color_attachments: Vec::default(),
            viewport: Some(Viewport {
                x: 0.0,
                y: 0.0,
                width: (layer.deinterleaved.x * factor) as f32,
                height: (layer.deinterleaved.y * factor) as f32,
            }),
        },
        Some("ao_input_ps"),
        |pass| {
            pass.bind_pipeline(
                shaders
                    .input_ps(layer.desc.process, layer.desc.normals)
                    .clone(),
            );
            pass.bind_uniform_buffer(0, &buffers.input[layer.index], 0);
            pass.bind_texture(0, depth, 0, POINT_CLAMP);
            if let (NormalOption::FromTexture, Some(normal)) = (layer.desc.normals, normal) {
                pass.bind_texture(1, normal, 0, POINT_CLAMP);
            }
            pass.bind_storage_image(0, layer.input, 0, 0);
            pass.draw(3, 1, 0, 0);
        },
    );
}

fn bind_kernel_inputs<'a, B: Backend>(
    pass: &mut ComputePass<'a, B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    layer: &LayerCtx<'a, B>,
) {
    pass.bind_uniform_buffer(0, &buffers.ao[layer.index], 0);
    pass.bind_uniform_buffer(1, &buffers.pattern_uniform, 0);
    pass.bind_storage_buffer(0, &buffers.pattern_storage, 0);
    pass.bind_texture(0, depth, 0, POINT_CLAMP);
    if let (NormalOption::FromTexture, Some(normal)) = (layer.desc.normals, normal) {
        pass.bind_texture(1, normal, 0, POINT_CLAMP);
    }
    pass.bind_texture(2, layer.input, 0, POINT_CLAMP);
    pass.bind_storage_image(0, layer.kernel_target(), 0, 0);
}

fn record_kernel_cs<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    layer: &LayerCtx<'a, B>,
) {
    let pipeline = shaders.ao_cs(
        layer.desc.process,
        layer.desc.normals,
        layer.desc.tap_type,
        layer.desc.sample_count,
    );
    let factor = layer.desc.process.deinterleave_factor();
    commands.compute_pass(pipeline, Some("ao_kernel_cs"), |pass| {
        bind_kernel_inputs(pass, buffers, depth, normal, layer);
        (
            layer.deinterleaved.x.div_ceil(AO_GROUP_DIM) * factor,
            layer.deinterleaved.y.div_ceil(AO_GROUP_DIM) * factor,
            1,
        )
    });
}

fn record_kernel_ps<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    layer: &LayerCtx<'a, B>,
) {
    let factor = layer.desc.process.deinterleave_factor();
    commands.render_pass(
        RenderPassDescriptor {
            color_attachments: Vec::default(),
            viewport: Some(Viewport {
                x: 0.0,
                y: 0.0,
                width: (layer.deinterleaved.x * factor) as f32,
                height: (layer.deinterleaved.y * factor) as f32,
            }),
        },
        Some("ao_kernel_ps"),
        |pass| {
            pass.bind_pipeline(
                shaders
                    .ao_ps(
                        layer.desc.process,
                        layer.desc.normals,
                        layer.desc.tap_type,
                        layer.desc.sample_count,
                    )
                    .clone(),
            );
            pass.bind_uniform_buffer(0, &buffers.ao[layer.index], 0);
            pass.bind_uniform_buffer(1, &buffers.pattern_uniform, 0);
            pass.bind_storage_buffer(0, &buffers.pattern_storage, 0);
            pass.bind_texture(0, depth, 0, POINT_CLAMP);
            if let (NormalOption::FromTexture, Some(normal)) = (layer.desc.normals, normal) {
                pass.bind_texture(1, normal, 0, POINT_CLAMP);
            }
            pass.bind_texture(2, layer.input, 0, POINT_CLAMP);
            pass.bind_storage_image(0, layer.kernel_target(), 0, 0);
            pass.draw(3, 1, 0, 0);
        },
    );
}

fn record_upsample<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    layer: &LayerCtx<'a, B>,
) {
    commands.render_pass(
        RenderPassDescriptor {
            color_attachments: vec![ColorAttachment {
                texture: layer.ao,
                array_element: 0,
                mip_level: 0,
                load_op: LoadOp::DontCare,
                store_op: StoreOp::Store,
            }],
            viewport: None,
        },
        Some("ao_upsample"),
        |pass| {
            pass.bind_pipeline(shaders.upsample.clone());
            pass.bind_uniform_buffer(0, &buffers.input[layer.index], 0);
            pass.bind_texture(0, depth, 0, POINT_CLAMP);
            pass.bind_texture(1, layer.input, 0, POINT_CLAMP);
            pass.bind_texture(2, layer.result, 0, POINT_CLAMP);
            pass.draw(3, 1, 0, 0);
        },
    );
}

/// Records one separable blur: a horizontal pass from `h_src` into `h_dst`,
/// then a vertical pass from `v_src` into `v_dst`. Both run over the full
/// input resolution.
#[allow(clippy::too_many_arguments)]
fn record_blur<'a, B: Backend>(
    commands: &mut CommandBuffer<'a, B>,
    shaders: &'a ShaderTable<B>,
    buffers: &'a ConstantBuffers<B>,
    depth: &'a Texture<B>,
    normal: Option<&'a Texture<B>>,
    radius: BlurRadius,
    slot: usize,
    h_src: &'a Texture<B>,
    h_dst: &'a Texture<B>,
    v_src: &'a Texture<B>,
    v_dst: &'a Texture<B>,
    size: UVec2,
) {
    commands.compute_pass(shaders.blur_h(radius), Some("ao_blur_h"), |pass| {
        pass.bind_uniform_buffer(0, &buffers.blur[slot], 0);
        pass.bind_texture(0, depth, 0, POINT_CLAMP);
        if let Some(normal) = normal {
            pass.bind_texture(1, normal, 0, POINT_CLAMP);
        }
        pass.bind_texture(2, h_src, 0, POINT_CLAMP);
        pass.bind_storage_image(0, h_dst, 0, 0);
        (
            size.x.div_ceil(BLUR_GROUP_SIZE),
            size.y.div_ceil(BLUR_GROUP_LINES),
            1,
        )
    });

    commands.compute_pass(shaders.blur_v(radius), Some("ao_blur_v"), |pass| {
        pass.bind_uniform_buffer(0, &buffers.blur[slot], 0);
        pass.bind_texture(0, depth, 0, POINT_CLAMP);
        if let Some(normal) = normal {
            pass.bind_texture(1, normal, 0, POINT_CLAMP);
        }
        pass.bind_texture(2, v_src, 0, POINT_CLAMP);
        pass.bind_storage_image(0, v_dst, 0, 0);
        (
            size.x.div_ceil(BLUR_GROUP_LINES),
            size.y.div_ceil(BLUR_GROUP_SIZE),
            1,
        )
    });
}

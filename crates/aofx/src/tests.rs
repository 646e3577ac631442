use std::{
    ptr::NonNull,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use aofx_pal::prelude::*;
use glam::UVec2;

use crate::{
    desc::{AoDescriptor, BlurRadius, LayerDesc, LayerProcess, LAYER_COUNT},
    AoFx, AoFxError,
};

#[derive(Default)]
struct Counters {
    dispatches: AtomicU64,
    draws: AtomicU64,
}

impl Counters {
    fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }
}

struct TestBuffer {
    data: Vec<Vec<u8>>,
}

/// A backend that allocates real CPU memory for buffers and tallies the GPU
/// work submitted to it.
struct TestBackend {
    counters: Arc<Counters>,
}

impl Backend for TestBackend {
    type Buffer = TestBuffer;
    type Texture = ();
    type Shader = ();
    type ComputePipeline = ();
    type GraphicsPipeline = ();
    type Job = ();

    unsafe fn create_buffer(
        &self,
        create_info: BufferCreateInfo,
    ) -> Result<TestBuffer, BufferCreateError> {
        Ok(TestBuffer {
            data: vec![vec![0; create_info.size as usize]; create_info.array_elements],
        })
    }

    unsafe fn create_texture(
        &self,
        _create_info: TextureCreateInfo,
    ) -> Result<(), TextureCreateError> {
        Ok(())
    }

    unsafe fn create_shader(&self, _create_info: ShaderCreateInfo) -> Result<(), ShaderCreateError> {
        Ok(())
    }

    unsafe fn create_compute_pipeline(
        &self,
        _create_info: ComputePipelineCreateInfo<Self>,
    ) -> Result<(), ComputePipelineCreateError> {
        Ok(())
    }

    unsafe fn create_graphics_pipeline(
        &self,
        _create_info: GraphicsPipelineCreateInfo<Self>,
    ) -> Result<(), GraphicsPipelineCreateError> {
        Ok(())
    }

    unsafe fn destroy_buffer(&self, _id: &mut TestBuffer) {}
    unsafe fn destroy_texture(&self, _id: &mut ()) {}
    unsafe fn destroy_shader(&self, _id: &mut ()) {}
    unsafe fn destroy_compute_pipeline(&self, _id: &mut ()) {}
    unsafe fn destroy_graphics_pipeline(&self, _id: &mut ()) {}

    unsafe fn submit_commands(
        &self,
        _queue: QueueType,
        _debug_name: Option<&str>,
        commands: Vec<Command<'_, Self>>,
    ) {
        for command in &commands {
            match command {
                Command::EndComputePass(..) => {
                    self.counters.dispatches.fetch_add(1, Ordering::Relaxed);
                }
                Command::Draw { .. } => {
                    self.counters.draws.fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            }
        }
    }

    unsafe fn wait_on(&self, _job: &(), _timeout: Option<Duration>) -> JobStatus {
        JobStatus::Complete
    }

    unsafe fn poll_status(&self, _job: &()) -> JobStatus {
        JobStatus::Complete
    }

    unsafe fn map_memory(
        &self,
        id: &TestBuffer,
        idx: usize,
    ) -> Result<(NonNull<u8>, u64), BufferViewError> {
        let elem = &id.data[idx];
        Ok((
            NonNull::new(elem.as_ptr() as *mut u8).unwrap(),
            elem.len() as u64,
        ))
    }

    unsafe fn unmap_memory(&self, _id: &TestBuffer) {}
    unsafe fn flush_range(&self, _id: &TestBuffer, _idx: usize) {}
    unsafe fn invalidate_range(&self, _id: &TestBuffer, _idx: usize) {}
}

fn fx() -> (AoFx<TestBackend>, Context<TestBackend>, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let ctx = Context::new(TestBackend {
        counters: counters.clone(),
    });
    (AoFx::new(ctx.clone()).unwrap(), ctx, counters)
}

fn texture(ctx: &Context<TestBackend>, size: UVec2) -> Texture<TestBackend> {
    Texture::new(
        ctx.clone(),
        TextureCreateInfo {
            format: Format::Rgba16SFloat,
            ty: TextureType::Type2D,
            width: size.x,
            height: size.y,
            depth: 1,
            array_elements: 1,
            mip_levels: 1,
            texture_usage: TextureUsage::SAMPLED | TextureUsage::COLOR_ATTACHMENT,
            memory_usage: MemoryUsage::GpuOnly,
            debug_name: None,
        },
    )
    .unwrap()
}

fn layer(process: LayerProcess, scale: f32, blur_radius: Option<BlurRadius>) -> LayerDesc {
    LayerDesc {
        process,
        scale,
        blur_radius,
        ..Default::default()
    }
}

fn disabled() -> LayerDesc {
    LayerDesc {
        process: LayerProcess::Disabled,
        ..Default::default()
    }
}

fn descriptor<'a>(
    size: UVec2,
    layers: [LayerDesc; LAYER_COUNT],
    depth: &'a Texture<TestBackend>,
    output: &'a Texture<TestBackend>,
) -> AoDescriptor<'a, TestBackend> {
    AoDescriptor {
        layers,
        input_size: size,
        depth: Some(depth),
        output: Some(output),
        ..Default::default()
    }
}

const SIZE: UVec2 = UVec2::new(256, 128);

fn shape(texture: &Texture<TestBackend>) -> ((u32, u32, u32), usize) {
    (texture.dims(), texture.array_elements())
}

#[test]
fn scaled_and_deinterleaved_sizes() {
    let layer = layer(LayerProcess::Deinterleave4, 0.5, None);
    let input = UVec2::new(1920, 1080);
    assert_eq!(layer.scaled_size(input), UVec2::new(960, 540));
    assert_eq!(layer.deinterleaved_size(input), UVec2::new(240, 135));

    // Odd sizes round the tiles up so no pixel is dropped.
    let input = UVec2::new(1919, 1079);
    assert_eq!(layer.scaled_size(input), UVec2::new(959, 539));
    assert_eq!(layer.deinterleaved_size(input), UVec2::new(240, 135));

    // Tiny inputs never collapse to zero.
    assert_eq!(layer.scaled_size(UVec2::new(1, 1)), UVec2::new(1, 1));
}

#[test]
fn resize_reuses_surfaces_when_unchanged() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    // Merge plus the layer's ao, result, and input surfaces.
    assert_eq!(fx.stats().surface_reallocs, 4);

    fx.resize(&desc).unwrap();
    assert_eq!(fx.stats().surface_reallocs, 4);
}

#[test]
fn resize_allocates_deinterleaved_array_surfaces() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [
            layer(LayerProcess::Deinterleave4, 0.5, None),
            disabled(),
            disabled(),
        ],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();

    let state = fx.state.as_ref().unwrap();
    let input = state.pool.input[0].as_ref().unwrap();
    assert_eq!(input.array_elements(), 16);
    let (w, h, _) = input.dims();
    assert_eq!(UVec2::new(w, h), UVec2::new(32, 16));
    let result = state.pool.result[0].as_ref().unwrap();
    let (w, h, _) = result.dims();
    assert_eq!(UVec2::new(w, h), UVec2::new(128, 64));
}

#[test]
fn resize_rejects_zero_sizes() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        UVec2::ZERO,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );

    assert!(matches!(fx.resize(&desc), Err(AoFxError::InvalidArgument)));
}

#[test]
fn resize_rejects_out_of_range_scales() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);

    for scale in [0.0, -0.5, 1.5] {
        let desc = descriptor(
            SIZE,
            [
                layer(LayerProcess::Native, scale, None),
                disabled(),
                disabled(),
            ],
            &depth,
            &output,
        );
        assert!(matches!(fx.resize(&desc), Err(AoFxError::InvalidArgument)));
    }

    // Disabled layers are exempt. Their scale is never applied.
    let desc = descriptor(
        SIZE,
        [
            layer(LayerProcess::Disabled, 0.0, None),
            layer(LayerProcess::Native, 1.0, None),
            disabled(),
        ],
        &depth,
        &output,
    );
    fx.resize(&desc).unwrap();
}

#[test]
fn disabling_a_layer_releases_its_surfaces() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);

    let enabled = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );
    fx.resize(&enabled).unwrap();
    let after_enable = fx.stats().surface_reallocs;

    let all_off = descriptor(SIZE, [disabled(), disabled(), disabled()], &depth, &output);
    fx.resize(&all_off).unwrap();
    {
        let state = fx.state.as_ref().unwrap();
        assert!(state.pool.ao[0].is_none());
        assert!(state.pool.result[0].is_none());
        assert!(state.pool.input[0].is_none());
    }
    assert_eq!(fx.stats().surface_reallocs, after_enable);

    // Re-enabling with identical dimensions still reallocates. The release
    // already happened.
    fx.resize(&enabled).unwrap();
    assert!(fx.stats().surface_reallocs > after_enable);
}

#[test]
fn reenabling_reproduces_surface_shapes() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let enabled = descriptor(
        SIZE,
        [
            layer(LayerProcess::Deinterleave4, 0.5, None),
            disabled(),
            disabled(),
        ],
        &depth,
        &output,
    );

    fx.resize(&enabled).unwrap();
    let before = {
        let pool = &fx.state.as_ref().unwrap().pool;
        [
            shape(pool.ao[0].as_ref().unwrap()),
            shape(pool.result[0].as_ref().unwrap()),
            shape(pool.input[0].as_ref().unwrap()),
        ]
    };

    let all_off = descriptor(SIZE, [disabled(), disabled(), disabled()], &depth, &output);
    fx.resize(&all_off).unwrap();
    fx.resize(&enabled).unwrap();

    let after = {
        let pool = &fx.state.as_ref().unwrap().pool;
        [
            shape(pool.ao[0].as_ref().unwrap()),
            shape(pool.result[0].as_ref().unwrap()),
            shape(pool.input[0].as_ref().unwrap()),
        ]
    };
    assert_eq!(before, after);
}

#[test]
fn reenabling_a_layer_forces_constant_reupload() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);

    let enabled = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );
    fx.resize(&enabled).unwrap();
    fx.render(&enabled).unwrap();
    assert_eq!(fx.stats().ao_uploads, 1);

    fx.render(&enabled).unwrap();
    assert_eq!(fx.stats().ao_uploads, 1);

    let all_off = descriptor(SIZE, [disabled(), disabled(), disabled()], &depth, &output);
    fx.resize(&all_off).unwrap();
    fx.resize(&enabled).unwrap();
    fx.render(&enabled).unwrap();
    assert_eq!(fx.stats().ao_uploads, 2);
}

#[test]
fn constant_uploads_are_elided_when_unchanged() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let mut desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();
    let stats = fx.stats();
    assert_eq!(stats.ao_uploads, 1);
    assert_eq!(stats.input_uploads, 1);

    fx.render(&desc).unwrap();
    let stats = fx.stats();
    assert_eq!(stats.ao_uploads, 1);
    assert_eq!(stats.input_uploads, 1);

    // An estimator tunable only dirties the kernel constants.
    desc.layers[0].linear_intensity = 0.75;
    fx.render(&desc).unwrap();
    let stats = fx.stats();
    assert_eq!(stats.ao_uploads, 2);
    assert_eq!(stats.input_uploads, 1);
}

#[test]
fn differing_radii_blur_each_layer_separately() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [
            layer(LayerProcess::Native, 1.0, Some(BlurRadius::R4)),
            layer(LayerProcess::Native, 1.0, Some(BlurRadius::R8)),
            disabled(),
        ],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();

    // 2 input preparations, 2 kernels, and an H/V pair per layer.
    assert_eq!(counters.dispatches(), 8);
    // Merge and composite.
    assert_eq!(counters.draws(), 2);
    // One blur blob per blurred layer.
    assert_eq!(fx.stats().blur_uploads, 2);
}

#[test]
fn matching_radii_blur_the_merged_image_once() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [
            layer(LayerProcess::Native, 1.0, Some(BlurRadius::R4)),
            layer(LayerProcess::Native, 1.0, Some(BlurRadius::R4)),
            disabled(),
        ],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();

    // 2 input preparations, 2 kernels, and a single H/V pair after merging.
    assert_eq!(counters.dispatches(), 6);
    assert_eq!(counters.draws(), 2);
    // The merged blur shares the first active layer's parameter slot.
    assert_eq!(fx.stats().blur_uploads, 1);

    // An identical frame elides the blur blob like the other families.
    fx.render(&desc).unwrap();
    assert_eq!(fx.stats().blur_uploads, 1);
}

#[test]
fn downscaled_layers_are_upsampled() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 0.5, None), disabled(), disabled()],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();

    assert_eq!(counters.dispatches(), 2);
    // Upsample, merge, and composite.
    assert_eq!(counters.draws(), 3);
}

#[test]
fn buffer_views_round_trip() {
    let ctx = Context::new(TestBackend {
        counters: Arc::new(Counters::default()),
    });
    let buffer = Buffer::new(
        ctx,
        BufferCreateInfo {
            size: 16,
            array_elements: 1,
            buffer_usage: BufferUsage::UNIFORM_BUFFER,
            memory_usage: MemoryUsage::CpuToGpu,
            debug_name: None,
        },
    )
    .unwrap();

    {
        let mut view = buffer.write(0).unwrap();
        view.copy_from_slice(&[7u8; 16]);
    }
    let view = buffer.read(0).unwrap();
    assert_eq!(&view[..], &[7u8; 16]);
}

#[test]
fn output_channel_masks_ignore_foreign_bits() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let mut desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );
    desc.output_channels = ColorComponents::from_bits_retain(0xff);

    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();
    // Merge and composite both ran.
    assert_eq!(counters.draws(), 2);
}

#[test]
fn all_layers_disabled_is_a_noop() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(SIZE, [disabled(), disabled(), disabled()], &depth, &output);

    fx.render(&desc).unwrap();
    assert_eq!(counters.dispatches(), 0);
    assert_eq!(counters.draws(), 0);
}

#[test]
fn missing_inputs_are_errors() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);

    let mut desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );
    fx.resize(&desc).unwrap();

    desc.output = None;
    assert!(matches!(
        fx.render(&desc),
        Err(AoFxError::MissingOutputTarget)
    ));

    desc.output = Some(&output);
    desc.depth = None;
    assert!(matches!(fx.render(&desc), Err(AoFxError::MissingDepthInput)));

    assert_eq!(counters.dispatches(), 0);
    assert_eq!(counters.draws(), 0);
}

#[test]
fn render_before_resize_fails() {
    let (mut fx, ctx, counters) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );

    assert!(matches!(fx.render(&desc), Err(AoFxError::SurfacesNotReady)));
    assert_eq!(counters.dispatches(), 0);
}

#[test]
fn release_is_idempotent_and_recoverable() {
    let (mut fx, ctx, _) = fx();
    let depth = texture(&ctx, SIZE);
    let output = texture(&ctx, SIZE);
    let desc = descriptor(
        SIZE,
        [layer(LayerProcess::Native, 1.0, None), disabled(), disabled()],
        &depth,
        &output,
    );

    fx.resize(&desc).unwrap();
    let allocs = fx.stats().surface_reallocs;

    fx.release();
    fx.release();
    assert!(!fx.is_initialized());
    assert!(matches!(fx.render(&desc), Err(AoFxError::NotInitialized)));
    assert!(matches!(fx.resize(&desc), Err(AoFxError::NotInitialized)));
    // Counters survive the release.
    assert_eq!(fx.stats().surface_reallocs, allocs);

    fx.initialize().unwrap();
    fx.resize(&desc).unwrap();
    fx.render(&desc).unwrap();
    assert!(fx.stats().surface_reallocs > allocs);
}

use aofx_pal::prelude::*;
use ordered_float::NotNan;
use rustc_hash::FxHashMap;

use crate::{
    desc::{BlurRadius, LayerProcess, NormalOption, SampleCount, TapType},
    AoFxError,
};

pub(crate) const AO_GROUP_DIM: u32 = 32;
pub(crate) const DEINTERLEAVE_GROUP_DIM: u32 = 32;
pub(crate) const BLUR_GROUP_SIZE: u32 = 128;
pub(crate) const BLUR_GROUP_LINES: u32 = 2;

pub(crate) const POINT_CLAMP: Sampler = Sampler {
    min_filter: Filter::Nearest,
    mag_filter: Filter::Nearest,
    mipmap_filter: Filter::Nearest,
    address_u: SamplerAddressMode::ClampToEdge,
    address_v: SamplerAddressMode::ClampToEdge,
    address_w: SamplerAddressMode::ClampToEdge,
    anisotropy: None,
    compare: None,
    min_lod: unsafe { NotNan::new_unchecked(0.0) },
    max_lod: None,
    border_color: None,
    unnormalize_coords: false,
};

pub(crate) const LINEAR_CLAMP: Sampler = Sampler {
    min_filter: Filter::Linear,
    mag_filter: Filter::Linear,
    mipmap_filter: Filter::Linear,
    address_u: SamplerAddressMode::ClampToEdge,
    address_v: SamplerAddressMode::ClampToEdge,
    address_w: SamplerAddressMode::ClampToEdge,
    anisotropy: None,
    compare: None,
    min_lod: unsafe { NotNan::new_unchecked(0.0) },
    max_lod: None,
    border_color: None,
    unnormalize_coords: false,
};

const FULLSCREEN_VERT: &[u8] = include_bytes!("../shaders/fullscreen.vert");
const DEINTERLEAVE_COMP: &[u8] = include_bytes!("../shaders/deinterleave.comp");
const DEINTERLEAVE_FRAG: &[u8] = include_bytes!("../shaders/deinterleave.frag");
const AO_COMP: &[u8] = include_bytes!("../shaders/ao.comp");
const AO_FRAG: &[u8] = include_bytes!("../shaders/ao.frag");
const BLUR_COMP: &[u8] = include_bytes!("../shaders/blur.comp");
const UPSAMPLE_FRAG: &[u8] = include_bytes!("../shaders/upsample.frag");
const DILATE_FRAG: &[u8] = include_bytes!("../shaders/dilate.frag");
const OUTPUT_FRAG: &[u8] = include_bytes!("../shaders/output.frag");

const PROCESSES: [LayerProcess; 4] = [
    LayerProcess::Native,
    LayerProcess::Deinterleave2,
    LayerProcess::Deinterleave4,
    LayerProcess::Deinterleave8,
];
const NORMALS: [NormalOption; 2] = [NormalOption::None, NormalOption::FromTexture];
const TAPS: [TapType; 3] = [TapType::Fixed, TapType::RandomUniform, TapType::RandomBuffer];
const SAMPLES: [SampleCount; 4] = [
    SampleCount::Low,
    SampleCount::Medium,
    SampleCount::High,
    SampleCount::Ultra,
];
const RADII: [BlurRadius; 4] = [
    BlurRadius::R2,
    BlurRadius::R4,
    BlurRadius::R8,
    BlurRadius::R16,
];

/// Dense lookup of every precompiled kernel variant, populated once at
/// initialization. Flattened arrays with computed indices; the variant key
/// spaces never change at runtime.
pub(crate) struct ShaderTable<B: Backend> {
    ctx: Context<B>,

    /// AO estimation kernels, `[process][normal][tap][samples]`.
    ao_cs: Vec<ComputePipeline<B>>,
    ao_ps: Vec<GraphicsPipeline<B>>,
    /// Input preparation kernels, `[process][normal]`.
    input_cs: Vec<ComputePipeline<B>>,
    input_ps: Vec<GraphicsPipeline<B>>,
    /// Separable bilateral blur, `[radius]`.
    blur_h: Vec<ComputePipeline<B>>,
    blur_v: Vec<ComputePipeline<B>>,
    pub upsample: GraphicsPipeline<B>,
    /// Merge variants by the 3-bit active layer mask, `[mask - 1]`.
    dilate: Vec<GraphicsPipeline<B>>,
    /// Output composites by channel write mask, `[mask - 1]`.
    output: Vec<GraphicsPipeline<B>>,
    custom_output: FxHashMap<ColorBlendAttachment, GraphicsPipeline<B>>,

    fullscreen_vs: Shader<B>,
    output_fs: Shader<B>,
}

fn shader<B: Backend>(
    ctx: &Context<B>,
    code: &[u8],
    defines: Vec<(&'static str, String)>,
    debug_name: String,
) -> Result<Shader<B>, AoFxError> {
    Ok(Shader::new(
        ctx.clone(),
        ShaderCreateInfo {
            code,
            defines,
            debug_name: Some(debug_name),
        },
    )?)
}

fn compute<B: Backend>(
    ctx: &Context<B>,
    module: Shader<B>,
    work_group_size: (u32, u32, u32),
    debug_name: String,
) -> Result<ComputePipeline<B>, AoFxError> {
    Ok(ComputePipeline::new(
        ctx.clone(),
        ComputePipelineCreateInfo {
            module,
            work_group_size,
            debug_name: Some(debug_name),
        },
    )?)
}

fn fullscreen<B: Backend>(
    ctx: &Context<B>,
    vertex: &Shader<B>,
    fragment: Shader<B>,
    attachments: Vec<ColorBlendAttachment>,
    debug_name: String,
) -> Result<GraphicsPipeline<B>, AoFxError> {
    Ok(GraphicsPipeline::new(
        ctx.clone(),
        GraphicsPipelineCreateInfo {
            stages: ShaderStages {
                vertex: vertex.clone(),
                fragment: Some(fragment),
            },
            topology: PrimitiveTopology::TriangleList,
            rasterization: RasterizationState {
                cull_mode: CullMode::None,
                ..Default::default()
            },
            color_blend: ColorBlendState { attachments },
            debug_name: Some(debug_name),
        },
    )?)
}

#[inline(always)]
fn ao_index(process: LayerProcess, normals: NormalOption, tap: TapType, samples: SampleCount) -> usize {
    ((process.kernel_index() * NORMALS.len() + normals.index()) * TAPS.len() + tap.index())
        * SAMPLES.len()
        + samples.index()
}

#[inline(always)]
fn input_index(process: LayerProcess, normals: NormalOption) -> usize {
    process.kernel_index() * NORMALS.len() + normals.index()
}

impl<B: Backend> ShaderTable<B> {
    /// Creates every variant. Fails on the first creation error; everything
    /// created so far is freed when the partially built table drops.
    pub fn new(ctx: &Context<B>) -> Result<Self, AoFxError> {
        let fullscreen_vs = shader(ctx, FULLSCREEN_VERT, Vec::default(), "ao_fullscreen_vs".into())?;

        let mut ao_cs = Vec::with_capacity(PROCESSES.len() * NORMALS.len() * TAPS.len() * SAMPLES.len());
        let mut ao_ps = Vec::with_capacity(ao_cs.capacity());
        for process in PROCESSES {
            for normals in NORMALS {
                for tap in TAPS {
                    for samples in SAMPLES {
                        let defines = vec![
                            ("DEINTERLEAVE_FACTOR", process.deinterleave_factor().to_string()),
                            ("USE_NORMALS", normals.index().to_string()),
                            ("TAP_TYPE", tap.index().to_string()),
                            ("SAMPLE_COUNT", samples.taps().to_string()),
                        ];
                        let name = format!(
                            "ao_kernel_d{}_n{}_t{}_s{}",
                            process.deinterleave_factor(),
                            normals.index(),
                            tap.index(),
                            samples.taps()
                        );

                        let module = shader(ctx, AO_COMP, defines.clone(), format!("{name}_cs"))?;
                        ao_cs.push(compute(
                            ctx,
                            module,
                            (AO_GROUP_DIM, AO_GROUP_DIM, 1),
                            format!("{name}_cs"),
                        )?);

                        let module = shader(ctx, AO_FRAG, defines, format!("{name}_ps"))?;
                        ao_ps.push(fullscreen(
                            ctx,
                            &fullscreen_vs,
                            module,
                            Vec::default(),
                            format!("{name}_ps"),
                        )?);
                    }
                }
            }
        }

        let mut input_cs = Vec::with_capacity(PROCESSES.len() * NORMALS.len());
        let mut input_ps = Vec::with_capacity(input_cs.capacity());
        for process in PROCESSES {
            for normals in NORMALS {
                let defines = vec![
                    ("DEINTERLEAVE_FACTOR", process.deinterleave_factor().to_string()),
                    ("USE_NORMALS", normals.index().to_string()),
                ];
                let name = format!(
                    "ao_deinterleave_d{}_n{}",
                    process.deinterleave_factor(),
                    normals.index()
                );

                let module = shader(ctx, DEINTERLEAVE_COMP, defines.clone(), format!("{name}_cs"))?;
                input_cs.push(compute(
                    ctx,
                    module,
                    (DEINTERLEAVE_GROUP_DIM, DEINTERLEAVE_GROUP_DIM, 1),
                    format!("{name}_cs"),
                )?);

                let module = shader(ctx, DEINTERLEAVE_FRAG, defines, format!("{name}_ps"))?;
                input_ps.push(fullscreen(
                    ctx,
                    &fullscreen_vs,
                    module,
                    Vec::default(),
                    format!("{name}_ps"),
                )?);
            }
        }

        let mut blur_h = Vec::with_capacity(RADII.len());
        let mut blur_v = Vec::with_capacity(RADII.len());
        for radius in RADII {
            let mut defines = vec![
                ("BLUR_RADIUS", radius.pixels().to_string()),
                ("HORIZONTAL", "1".to_string()),
            ];
            let module = shader(
                ctx,
                BLUR_COMP,
                defines.clone(),
                format!("ao_blur_h_r{}", radius.pixels()),
            )?;
            blur_h.push(compute(
                ctx,
                module,
                (BLUR_GROUP_SIZE, BLUR_GROUP_LINES, 1),
                format!("ao_blur_h_r{}", radius.pixels()),
            )?);

            defines[1].1 = "0".to_string();
            let module = shader(
                ctx,
                BLUR_COMP,
                defines,
                format!("ao_blur_v_r{}", radius.pixels()),
            )?;
            blur_v.push(compute(
                ctx,
                module,
                (BLUR_GROUP_LINES, BLUR_GROUP_SIZE, 1),
                format!("ao_blur_v_r{}", radius.pixels()),
            )?);
        }

        let module = shader(ctx, UPSAMPLE_FRAG, Vec::default(), "ao_upsample".into())?;
        let upsample = fullscreen(
            ctx,
            &fullscreen_vs,
            module,
            vec![ColorBlendAttachment::default()],
            "ao_upsample".into(),
        )?;

        let mut dilate = Vec::with_capacity(7);
        for mask in 1usize..8 {
            let defines = vec![
                ("LAYER_0", (mask & 1).to_string()),
                ("LAYER_1", ((mask >> 1) & 1).to_string()),
                ("LAYER_2", ((mask >> 2) & 1).to_string()),
            ];
            let module = shader(ctx, DILATE_FRAG, defines, format!("ao_dilate_{mask:03b}"))?;
            dilate.push(fullscreen(
                ctx,
                &fullscreen_vs,
                module,
                vec![ColorBlendAttachment::default()],
                format!("ao_dilate_{mask:03b}"),
            )?);
        }

        let output_fs = shader(ctx, OUTPUT_FRAG, Vec::default(), "ao_output".into())?;
        let mut output = Vec::with_capacity(15);
        for mask in 1u32..16 {
            output.push(fullscreen(
                ctx,
                &fullscreen_vs,
                output_fs.clone(),
                vec![ColorBlendAttachment {
                    write_mask: ColorComponents::from_bits_truncate(mask),
                    ..Default::default()
                }],
                format!("ao_output_{mask:04b}"),
            )?);
        }

        Ok(Self {
            ctx: ctx.clone(),
            ao_cs,
            ao_ps,
            input_cs,
            input_ps,
            blur_h,
            blur_v,
            upsample,
            dilate,
            output,
            custom_output: FxHashMap::default(),
            fullscreen_vs,
            output_fs,
        })
    }

    #[inline(always)]
    pub fn ao_cs(
        &self,
        process: LayerProcess,
        normals: NormalOption,
        tap: TapType,
        samples: SampleCount,
    ) -> &ComputePipeline<B> {
        &self.ao_cs[ao_index(process, normals, tap, samples)]
    }

    #[inline(always)]
    pub fn ao_ps(
        &self,
        process: LayerProcess,
        normals: NormalOption,
        tap: TapType,
        samples: SampleCount,
    ) -> &GraphicsPipeline<B> {
        &self.ao_ps[ao_index(process, normals, tap, samples)]
    }

    #[inline(always)]
    pub fn input_cs(&self, process: LayerProcess, normals: NormalOption) -> &ComputePipeline<B> {
        &self.input_cs[input_index(process, normals)]
    }

    #[inline(always)]
    pub fn input_ps(&self, process: LayerProcess, normals: NormalOption) -> &GraphicsPipeline<B> {
        &self.input_ps[input_index(process, normals)]
    }

    #[inline(always)]
    pub fn blur_h(&self, radius: BlurRadius) -> &ComputePipeline<B> {
        &self.blur_h[radius.index()]
    }

    #[inline(always)]
    pub fn blur_v(&self, radius: BlurRadius) -> &ComputePipeline<B> {
        &self.blur_v[radius.index()]
    }

    /// Merge pipeline for a nonzero active layer mask.
    #[inline(always)]
    pub fn dilate(&self, active_mask: usize) -> &GraphicsPipeline<B> {
        &self.dilate[active_mask - 1]
    }

    /// Output composite pipeline. A caller supplied blend overrides the
    /// channel mask and is served from a lazily populated cache; an empty
    /// channel mask writes all channels.
    pub fn output_pipeline(
        &mut self,
        channels: ColorComponents,
        blend: Option<ColorBlendAttachment>,
    ) -> Result<GraphicsPipeline<B>, AoFxError> {
        let attachment = match blend {
            Some(attachment) => attachment,
            None => {
                // Callers may hand in masks with bits outside RGBA.
                let mask = ColorComponents::from_bits_truncate(channels.bits());
                let mask = if mask.is_empty() {
                    ColorComponents::ALL
                } else {
                    mask
                };
                return Ok(self.output[(mask.bits() as usize) - 1].clone());
            }
        };

        if let Some(pipeline) = self.custom_output.get(&attachment) {
            return Ok(pipeline.clone());
        }

        let pipeline = fullscreen(
            &self.ctx,
            &self.fullscreen_vs,
            self.output_fs.clone(),
            vec![attachment],
            "ao_output_custom".into(),
        )?;
        self.custom_output.insert(attachment, pipeline.clone());
        Ok(pipeline)
    }
}

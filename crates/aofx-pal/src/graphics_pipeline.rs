use std::sync::Arc;

use crate::{context::Context, shader::Shader, types::*, Backend};
use thiserror::Error;

/// The shader stages used by a graphics pipeline.
#[derive(Clone)]
pub struct ShaderStages<B: Backend> {
    pub vertex: Shader<B>,
    pub fragment: Option<Shader<B>>,
}

/// Describes how rasterization should be performed for the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterizationState {
    /// The kinds of primitives to form.
    pub polygon_mode: PolygonMode,
    /// Culling rule for primitives.
    pub cull_mode: CullMode,
    /// Which direction represents the front face of a primitive.
    pub front_face: FrontFace,
}

/// Describes blending operations for color attachments of a graphics pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorBlendAttachment {
    /// What components should be written to the color attachment.
    pub write_mask: ColorComponents,
    /// Should blending be performed.
    pub blend: bool,
    /// What blending operations should be used for color values.
    pub color_blend_op: BlendOp,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
}

/// Blending for color attachments.
#[derive(Default, Clone)]
pub struct ColorBlendState {
    /// Each color attachment to blend and how.
    pub attachments: Vec<ColorBlendAttachment>,
}

#[derive(Clone)]
pub struct GraphicsPipelineCreateInfo<B: Backend> {
    pub stages: ShaderStages<B>,
    /// How to connect the vertices to form primitives.
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    pub color_blend: ColorBlendState,
    /// The backend *should* use the provided debug name for easy identification.
    pub debug_name: Option<String>,
}

pub struct GraphicsPipeline<B: Backend>(pub(crate) Arc<GraphicsPipelineInner<B>>);

pub(crate) struct GraphicsPipelineInner<B: Backend> {
    ctx: Context<B>,
    pub(crate) id: B::GraphicsPipeline,
}

#[derive(Debug, Error)]
pub enum GraphicsPipelineCreateError {
    #[error("an error occured: {0}")]
    Other(String),
}

impl<B: Backend> GraphicsPipeline<B> {
    /// Create a new graphics pipeline.
    ///
    /// # Arguments
    /// - `ctx` - The [`Context`] to create the pipeline with.
    /// - `create_info` - Describes the graphics pipeline to create.
    pub fn new(
        ctx: Context<B>,
        create_info: GraphicsPipelineCreateInfo<B>,
    ) -> Result<Self, GraphicsPipelineCreateError> {
        let id = unsafe { ctx.0.create_graphics_pipeline(create_info)? };
        Ok(Self(Arc::new(GraphicsPipelineInner { ctx, id })))
    }

    #[inline(always)]
    pub fn internal(&self) -> &B::GraphicsPipeline {
        &self.0.id
    }
}

impl<B: Backend> Clone for GraphicsPipeline<B> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<B: Backend> Drop for GraphicsPipelineInner<B> {
    fn drop(&mut self) {
        unsafe {
            self.ctx.0.destroy_graphics_pipeline(&mut self.id);
        }
    }
}

impl Default for RasterizationState {
    #[inline(always)]
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
        }
    }
}

impl Default for ColorBlendAttachment {
    #[inline(always)]
    fn default() -> Self {
        Self {
            write_mask: ColorComponents::ALL,
            blend: false,
            color_blend_op: BlendOp::Add,
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
        }
    }
}

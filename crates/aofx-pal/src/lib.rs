//! Pal is a thin, backend-agnostic graphics and compute abstraction in the
//! style of Vulkan and D3D11.
//!
//! To start using pal, implement (or pick) a [`Backend`] and wrap it in a
//! [`Context`](struct@context::Context). All other objects are created from
//! the context and release their backend resources on drop.

pub mod buffer;
pub mod command_buffer;
pub mod compute_pass;
pub mod compute_pipeline;
pub mod context;
pub mod graphics_pipeline;
pub mod queue;
pub mod render_pass;
pub mod shader;
pub mod texture;
pub mod types;

use std::{ptr::NonNull, time::Duration};

use buffer::{BufferCreateError, BufferCreateInfo, BufferViewError};
use command_buffer::Command;
use compute_pipeline::{ComputePipelineCreateError, ComputePipelineCreateInfo};
use graphics_pipeline::{GraphicsPipelineCreateError, GraphicsPipelineCreateInfo};
use shader::{ShaderCreateError, ShaderCreateInfo};
use texture::{TextureCreateError, TextureCreateInfo};
use types::{JobStatus, QueueType};

/// The set of primitives a backend must provide.
///
/// Creation functions are fallible; destruction must be infallible and must
/// tolerate objects that were only partially initialized. Command submission
/// is in-order per queue, and the backend is responsible for resource hazard
/// tracking between consecutive passes of a submission.
#[allow(clippy::missing_safety_doc)]
pub trait Backend: Sized + 'static {
    type Buffer;
    type Texture;
    type Shader;
    type ComputePipeline;
    type GraphicsPipeline;
    type Job;

    unsafe fn create_buffer(
        &self,
        create_info: BufferCreateInfo,
    ) -> Result<Self::Buffer, BufferCreateError>;
    unsafe fn create_texture(
        &self,
        create_info: TextureCreateInfo,
    ) -> Result<Self::Texture, TextureCreateError>;
    unsafe fn create_shader(
        &self,
        create_info: ShaderCreateInfo,
    ) -> Result<Self::Shader, ShaderCreateError>;
    unsafe fn create_compute_pipeline(
        &self,
        create_info: ComputePipelineCreateInfo<Self>,
    ) -> Result<Self::ComputePipeline, ComputePipelineCreateError>;
    unsafe fn create_graphics_pipeline(
        &self,
        create_info: GraphicsPipelineCreateInfo<Self>,
    ) -> Result<Self::GraphicsPipeline, GraphicsPipelineCreateError>;

    unsafe fn destroy_buffer(&self, id: &mut Self::Buffer);
    unsafe fn destroy_texture(&self, id: &mut Self::Texture);
    unsafe fn destroy_shader(&self, id: &mut Self::Shader);
    unsafe fn destroy_compute_pipeline(&self, id: &mut Self::ComputePipeline);
    unsafe fn destroy_graphics_pipeline(&self, id: &mut Self::GraphicsPipeline);

    unsafe fn submit_commands(
        &self,
        queue: QueueType,
        debug_name: Option<&str>,
        commands: Vec<Command<'_, Self>>,
    ) -> Self::Job;
    unsafe fn wait_on(&self, job: &Self::Job, timeout: Option<Duration>) -> JobStatus;
    unsafe fn poll_status(&self, job: &Self::Job) -> JobStatus;

    unsafe fn map_memory(
        &self,
        id: &Self::Buffer,
        idx: usize,
    ) -> Result<(NonNull<u8>, u64), BufferViewError>;
    unsafe fn unmap_memory(&self, id: &Self::Buffer);
    unsafe fn flush_range(&self, id: &Self::Buffer, idx: usize);
    unsafe fn invalidate_range(&self, id: &Self::Buffer, idx: usize);
}

pub mod prelude {
    pub use crate::buffer::*;
    pub use crate::command_buffer::*;
    pub use crate::compute_pass::*;
    pub use crate::compute_pipeline::*;
    pub use crate::context::*;
    pub use crate::graphics_pipeline::*;
    pub use crate::queue::*;
    pub use crate::render_pass::*;
    pub use crate::shader::*;
    pub use crate::texture::*;
    pub use crate::types::*;
    pub use crate::Backend;
}

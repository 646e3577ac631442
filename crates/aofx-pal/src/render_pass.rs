use crate::{
    buffer::Buffer,
    command_buffer::Command,
    graphics_pipeline::GraphicsPipeline,
    texture::{Sampler, Texture},
    types::{LoadOp, StoreOp, Viewport},
    Backend,
};

/// Describes a render pass.
pub struct RenderPassDescriptor<'a, B: Backend> {
    /// The color attachments used by the render pass.
    pub color_attachments: Vec<ColorAttachment<'a, B>>,
    /// Viewport override. When `None`, the viewport covers the dimensions of
    /// the first color attachment.
    pub viewport: Option<Viewport>,
}

/// Describes a color attachment of a render pass.
pub struct ColorAttachment<'a, B: Backend> {
    /// The destination image of the attachment.
    pub texture: &'a Texture<B>,
    /// The array element of the destination image.
    pub array_element: usize,
    /// The mip level of the destination image.
    pub mip_level: usize,
    /// How the color attachment should be loaded.
    pub load_op: LoadOp,
    /// How the color attachment should be stored.
    pub store_op: StoreOp,
}

pub struct RenderPass<'a, B: Backend> {
    pub(crate) bound_pipeline: bool,
    pub(crate) commands: Vec<Command<'a, B>>,
}

impl<'a, B: Backend> RenderPass<'a, B> {
    /// Binds a graphics pipeline to the pass.
    ///
    /// # Arguments
    /// - `pipeline` - The graphics pipeline to bind.
    #[inline]
    pub fn bind_pipeline(&mut self, pipeline: GraphicsPipeline<B>) {
        self.bound_pipeline = true;
        self.commands.push(Command::BindGraphicsPipeline(pipeline));
    }

    /// Binds a uniform buffer to the given register slot.
    #[inline]
    pub fn bind_uniform_buffer(&mut self, slot: u32, buffer: &'a Buffer<B>, array_element: usize) {
        self.commands.push(Command::BindUniformBuffer {
            slot,
            buffer,
            array_element,
        });
    }

    /// Binds a read only storage buffer to the given register slot.
    #[inline]
    pub fn bind_storage_buffer(&mut self, slot: u32, buffer: &'a Buffer<B>, array_element: usize) {
        self.commands.push(Command::BindStorageBuffer {
            slot,
            buffer,
            array_element,
        });
    }

    /// Binds a texture for sampled reads to the given register slot.
    #[inline]
    pub fn bind_texture(
        &mut self,
        slot: u32,
        texture: &'a Texture<B>,
        array_element: usize,
        sampler: Sampler,
    ) {
        self.commands.push(Command::BindTexture {
            slot,
            texture,
            array_element,
            sampler,
        });
    }

    /// Binds a single mip of a texture for storage reads and writes to the
    /// given register slot. Fragment shaders *may* write to storage images in
    /// passes with no color attachments.
    ///
    /// # Panics
    /// - If `mip` is not a valid mip level of the texture.
    #[inline]
    pub fn bind_storage_image(
        &mut self,
        slot: u32,
        texture: &'a Texture<B>,
        array_element: usize,
        mip: usize,
    ) {
        assert!(mip < texture.mip_count(), "`mip` is out of bounds");
        self.commands.push(Command::BindStorageImage {
            slot,
            texture,
            array_element,
            mip,
        });
    }

    /// Draws unindexed geometry.
    ///
    /// # Panics
    /// - If there is no bound graphics pipeline.
    #[inline]
    pub fn draw(
        &mut self,
        vertex_count: usize,
        instance_count: usize,
        first_vertex: usize,
        first_instance: usize,
    ) {
        assert!(self.bound_pipeline, "no bound graphics pipeline");
        self.commands.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }
}

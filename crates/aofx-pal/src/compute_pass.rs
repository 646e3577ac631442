use crate::{
    buffer::Buffer,
    command_buffer::Command,
    texture::{Sampler, Texture},
    Backend,
};

pub struct ComputePass<'a, B: Backend> {
    pub(crate) commands: Vec<Command<'a, B>>,
}

impl<'a, B: Backend> ComputePass<'a, B> {
    /// Binds a uniform buffer to the given register slot.
    ///
    /// # Arguments
    /// - `slot` - The register slot to bind to.
    /// - `buffer` - The buffer to bind.
    /// - `array_element` - The array element of the buffer to bind.
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
    /// given register slot.
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
}

use crate::{
    context::Context,
    types::{
        AnisotropyLevel, BorderColor, CompareOp, Filter, Format, MemoryUsage, SamplerAddressMode,
        TextureType, TextureUsage,
    },
    Backend,
};
use ordered_float::NotNan;
use thiserror::Error;

pub struct TextureCreateInfo {
    pub format: Format,
    pub ty: TextureType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// How many array elements this texture supports.
    pub array_elements: usize,
    pub mip_levels: usize,
    pub texture_usage: TextureUsage,
    pub memory_usage: MemoryUsage,
    /// The backend *should* use the provided debug name for easy identification.
    pub debug_name: Option<String>,
}

/// Samplers are value types. The backend is responsible for deduplicating
/// identical sampler descriptions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sampler {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_filter: Filter,
    pub address_u: SamplerAddressMode,
    pub address_v: SamplerAddressMode,
    pub address_w: SamplerAddressMode,
    pub anisotropy: Option<AnisotropyLevel>,
    pub compare: Option<CompareOp>,
    pub min_lod: NotNan<f32>,
    pub max_lod: Option<NotNan<f32>>,
    pub border_color: Option<BorderColor>,
    pub unnormalize_coords: bool,
}

#[derive(Debug, Error)]
pub enum TextureCreateError {
    #[error("an error has occured: {0}")]
    Other(String),
}

/// A GPU image. For the purposes of synchronization, this is considered a
/// resource.
pub struct Texture<B: Backend> {
    ctx: Context<B>,
    dims: (u32, u32, u32),
    format: Format,
    array_elements: usize,
    mip_count: usize,
    pub(crate) id: B::Texture,
}

impl<B: Backend> Texture<B> {
    /// Creates a new texture.
    ///
    /// # Arguments
    /// - `ctx` - The [`Context`] to create the texture with.
    /// - `create_info` - Describes the texture to create.
    ///
    /// # Panics
    /// - If any dimension of the texture is `0`.
    /// - If `create_info.array_elements` is `0`.
    /// - If `create_info.mip_levels` is `0`.
    pub fn new(
        ctx: Context<B>,
        create_info: TextureCreateInfo,
    ) -> Result<Self, TextureCreateError> {
        assert!(
            create_info.width != 0 && create_info.height != 0 && create_info.depth != 0,
            "texture dimensions cannot be zero"
        );
        assert_ne!(
            create_info.array_elements, 0,
            "texture array elements cannot be zero"
        );
        assert_ne!(create_info.mip_levels, 0, "texture mip levels cannot be zero");

        let dims = (create_info.width, create_info.height, create_info.depth);
        let array_elements = create_info.array_elements;
        let mip_count = create_info.mip_levels;
        let format = create_info.format;
        let id = unsafe { ctx.0.create_texture(create_info)? };

        Ok(Self {
            ctx,
            dims,
            id,
            format,
            array_elements,
            mip_count,
        })
    }

    #[inline(always)]
    pub fn internal(&self) -> &B::Texture {
        &self.id
    }

    #[inline(always)]
    pub fn dims(&self) -> (u32, u32, u32) {
        self.dims
    }

    #[inline(always)]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline(always)]
    pub fn array_elements(&self) -> usize {
        self.array_elements
    }

    #[inline(always)]
    pub fn mip_count(&self) -> usize {
        self.mip_count
    }
}

impl<B: Backend> Drop for Texture<B> {
    #[inline(always)]
    fn drop(&mut self) {
        unsafe {
            self.ctx.0.destroy_texture(&mut self.id);
        }
    }
}

impl Default for TextureCreateInfo {
    #[inline(always)]
    fn default() -> Self {
        Self {
            format: Format::Rgba8Unorm,
            ty: TextureType::Type2D,
            width: 128,
            height: 128,
            depth: 1,
            array_elements: 1,
            mip_levels: 1,
            texture_usage: TextureUsage::empty(),
            memory_usage: MemoryUsage::GpuOnly,
            debug_name: None,
        }
    }
}

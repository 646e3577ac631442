use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    // R8
    R8Unorm,
    R8Snorm,
    R8UInt,
    R8SInt,

    // R16
    R16Unorm,
    R16UInt,
    R16SFloat,

    // R32
    R32UInt,
    R32SFloat,

    // RG8
    Rg8Unorm,
    Rg8SInt,

    // RG16
    Rg16Unorm,
    Rg16SFloat,

    // RGBA8
    Rgba8Unorm,
    Rgba8Srgb,

    // RGBA16
    Rgba16Unorm,
    Rgba16SFloat,

    // RGBA32
    Rgba32SInt,
    Rgba32SFloat,

    // Depth
    D16Unorm,
    D24UnormS8Uint,
    D32Sfloat,
}

impl Format {
    #[inline(always)]
    pub fn is_depth(&self) -> bool {
        matches!(
            *self,
            Format::D16Unorm | Format::D24UnormS8Uint | Format::D32Sfloat
        )
    }

    #[inline(always)]
    pub fn is_color(&self) -> bool {
        !self.is_depth()
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureType {
    Type1D,
    Type2D,
    Type3D,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryUsage {
    GpuOnly,
    CpuToGpu,
    GpuToCpu,
}

bitflags! {
    #[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(transparent)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC   = 0b00001;
        const TRANSFER_DST   = 0b00010;
        const UNIFORM_BUFFER = 0b00100;
        const STORAGE_BUFFER = 0b01000;
    }
}

bitflags! {
    #[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(transparent)]
    pub struct TextureUsage: u32 {
        const TRANSFER_SRC     = 0b00001;
        const TRANSFER_DST     = 0b00010;
        const SAMPLED          = 0b00100;
        const STORAGE          = 0b01000;
        const COLOR_ATTACHMENT = 0b10000;
    }
}

bitflags! {
    #[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(transparent)]
    pub struct ColorComponents: u32 {
        const R = 0b0001;
        const G = 0b0010;
        const B = 0b0100;
        const A = 0b1000;
        const ALL = 0b1111;
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueType {
    /// The main queue is guaranteed to support graphics, transfer, and compute operations.
    Main,
    /// The transfer queue is guaranteed to support transfer operations.
    Transfer,
    /// The compute queue is guaranteed to support compute operations.
    Compute,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobStatus {
    /// The job is still running.
    Running,
    /// The job is complete.
    Complete,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    AllGraphics,
    Vertex,
    Fragment,
    Compute,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SamplerAddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnisotropyLevel {
    X1,
    X2,
    X4,
    X8,
    X16,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BorderColor {
    FloatTransparentBlack,
    IntTransparentBlack,
    FloatOpaqueBlack,
    IntOpaqueBlack,
    FloatOpaqueWhite,
    IntOpaqueWhite,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreOp {
    /// We don't care what happens to the contents of the image after the pass.
    DontCare,
    /// The contents of the image should be stored after the pass.
    Store,
}

#[derive(Debug, Copy, Clone)]
pub enum LoadOp {
    /// We don't care about the contents of the image.
    DontCare,
    /// The contents of the image should be loaded.
    Load,
    /// The contents of the image should be cleared with the specified color.
    Clear(ClearColor),
}

#[derive(Debug, Copy, Clone)]
pub enum ClearColor {
    RgbaF32(f32, f32, f32, f32),
    RU32(u32),
}

/// A viewport in framebuffer coordinates. When a render pass has color
/// attachments the viewport defaults to the attachment dimensions; passes
/// without attachments (storage-image output) must provide one explicitly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

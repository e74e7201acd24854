//! Error types for pointfx.
//!
//! Configuration problems are rejected when descriptors, emitters or scenes are
//! built. Resource failures are reported once, at construction time; a missing
//! texture is the only one the renderer tolerates.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid emitter or descriptor parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A range with `min > max`.
    #[error("inverted range for `{field}`: {min} > {max}")]
    InvertedRange {
        /// Name of the attribute the range belongs to.
        field: &'static str,
        /// Lower bound as given.
        min: f32,
        /// Upper bound as given.
        max: f32,
    },
    /// A range whose width `max - min` does not fit in an `f32`.
    #[error("range for `{field}` is too wide: {min}..={max}")]
    RangeTooWide {
        /// Name of the attribute the range belongs to.
        field: &'static str,
        /// Lower bound as given.
        min: f32,
        /// Upper bound as given.
        max: f32,
    },
    /// A NaN or infinite value where a finite one is required.
    #[error("`{field}` must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter.
        field: &'static str,
        /// The value as given.
        value: f32,
    },
    /// A parameter that must not be negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Name of the offending parameter.
        field: &'static str,
        /// The value as given.
        value: f32,
    },
    /// A parameter that must be strictly positive.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive {
        /// Name of the offending parameter.
        field: &'static str,
        /// The value as given.
        value: f32,
    },
    /// Scene file could not be read.
    #[error("failed to read config `{path}`: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Scene JSON is malformed or has out-of-domain values.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur while resolving a sprite texture.
#[derive(Debug, Error)]
pub enum TextureError {
    /// No file or built-in sprite matches the logical name.
    #[error("texture `{name}` not found (looked for {path})")]
    NotFound {
        /// Logical image name.
        name: String,
        /// Where the loader looked.
        path: PathBuf,
    },
    /// Unknown `builtin/` sprite.
    #[error("unknown built-in sprite `{0}`")]
    UnknownBuiltin(String),
    /// Failed to decode image file.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// The decoded image is larger than the loader or device accepts.
    #[error("texture `{name}` is {width}x{height}, larger than the {limit}px limit")]
    TooLarge {
        /// Logical image name.
        name: String,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Largest accepted side length.
        limit: u32,
    },
    /// The device rejected the texture upload.
    #[error("failed to upload texture `{name}`: {message}")]
    Upload {
        /// Logical image name.
        name: String,
        /// Message reported by the device.
        message: String,
    },
}

/// Errors that can occur during GPU initialization and resource creation.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable GPU is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable format for this adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// A particle pool could not be allocated.
    #[error("failed to allocate particle buffer of {bytes} bytes: {message}")]
    BufferAllocation {
        /// Requested size.
        bytes: u64,
        /// Message reported by the device.
        message: String,
    },
    /// A shader module or pipeline was rejected by the device.
    #[error("failed to create {label}: {message}")]
    Pipeline {
        /// Which object failed.
        label: &'static str,
        /// Message reported by the device.
        message: String,
    },
}

/// Errors raised while submitting one frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The swapchain surface was lost and must be reconfigured.
    #[error("surface lost")]
    SurfaceLost,
    /// The swapchain no longer matches the window and must be reconfigured.
    #[error("surface outdated")]
    SurfaceOutdated,
    /// Acquiring the next frame timed out; the frame is dropped.
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    /// The device ran out of memory.
    #[error("out of memory")]
    OutOfMemory,
    /// Any other backend failure.
    #[error("frame submission failed: {0}")]
    Other(String),
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost => FrameError::SurfaceLost,
            wgpu::SurfaceError::Outdated => FrameError::SurfaceOutdated,
            wgpu::SurfaceError::Timeout => FrameError::Timeout,
            wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
            other => FrameError::Other(other.to_string()),
        }
    }
}

/// Errors surfaced by the frame orchestrator.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An emitter in the scene is misconfigured.
    #[error("invalid emitter `{emitter}`: {source}")]
    Config {
        /// Name of the emitter in the scene.
        emitter: String,
        /// What was wrong with it.
        #[source]
        source: ConfigError,
    },
    /// A pool or pipeline could not be created.
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// A frame could not be submitted.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Errors that can occur when running the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// GPU initialization failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// The renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_message() {
        let err = ConfigError::InvertedRange {
            field: "life_range",
            min: 2.0,
            max: -2.0,
        };
        assert_eq!(err.to_string(), "inverted range for `life_range`: 2 > -2");
    }

    #[test]
    fn test_surface_error_mapping() {
        assert!(matches!(
            FrameError::from(wgpu::SurfaceError::Lost),
            FrameError::SurfaceLost
        ));
        assert!(matches!(
            FrameError::from(wgpu::SurfaceError::Outdated),
            FrameError::SurfaceOutdated
        ));
    }

    #[test]
    fn test_render_error_wraps_config() {
        let err = RenderError::Config {
            emitter: "fire".into(),
            source: ConfigError::Negative {
                field: "birth_delay",
                value: -1.0,
            },
        };
        assert!(err.to_string().starts_with("invalid emitter `fire`"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

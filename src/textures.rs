//! Sprite images and logical-name resolution.
//!
//! Emitters refer to their sprite by a logical name. [`TextureLoader`]
//! resolves that name to RGBA pixels:
//!
//! - `builtin/<sprite>` selects a procedurally generated sprite
//!   (`builtin/soft`, `builtin/snowflake`, `builtin/spark`)
//! - any other name is a path under the loader's asset root; `.png` is
//!   appended when the name has no extension
//!
//! ```ignore
//! let loader = TextureLoader::new("assets");
//! let fire = loader.load("fire")?;            // assets/fire.png
//! let soft = loader.load("builtin/soft")?;    // generated
//! ```
//!
//! Backends upload the returned [`SpriteImage`]; a failed lookup is reported
//! as a [`TextureError`] and the emitter simply goes undrawn.

use std::path::{Path, PathBuf};

use crate::error::TextureError;

/// Prefix selecting a generated sprite.
pub const BUILTIN_PREFIX: &str = "builtin/";

/// Largest sprite side accepted by default, wgpu's default 2D texture limit.
pub const MAX_DIMENSION: u32 = 8192;

/// Byte length of `width * height` RGBA8 pixels, `None` if it overflows.
fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

/// Filter mode for sprite sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering.
    Nearest,
}

/// Decoded RGBA8 sprite pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    /// Raw RGBA pixel data (width * height * 4 bytes), top row first.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
}

impl SpriteImage {
    /// Wrap raw RGBA data.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not exactly `width * height * 4` bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            Some(data.len()),
            rgba_len(width, height),
            "RGBA data size mismatch"
        );
        Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
        }
    }

    /// Decode an image file (PNG or JPEG).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height))
    }

    /// Reject sprites with a side longer than `limit` pixels.
    pub fn ensure_fits(&self, name: &str, limit: u32) -> Result<(), TextureError> {
        if self.width > limit || self.height > limit {
            return Err(TextureError::TooLarge {
                name: name.to_string(),
                width: self.width,
                height: self.height,
                limit,
            });
        }
        Ok(())
    }

    /// A 1x1 sprite of a single color.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            filter: FilterMode::Nearest,
        }
    }

    /// White disc whose alpha falls off smoothly towards the rim.
    pub fn soft_disc(size: u32) -> Self {
        Self::radial(size, |r, _angle| {
            let falloff = (1.0 - r).clamp(0.0, 1.0);
            falloff * falloff
        })
    }

    /// Six-armed flake with a bright core.
    pub fn snowflake(size: u32) -> Self {
        Self::radial(size, |r, angle| {
            if r > 1.0 {
                return 0.0;
            }
            let arm = (angle * 3.0).cos().abs().powf(24.0);
            let core = (1.0 - r * 4.0).clamp(0.0, 1.0);
            let arms = arm * (1.0 - r);
            (arms + core).min(1.0)
        })
    }

    /// Small hard-edged dot with a thin glow.
    pub fn spark(size: u32) -> Self {
        Self::radial(size, |r, _angle| {
            if r < 0.35 {
                1.0
            } else {
                ((1.0 - r) / 0.65).clamp(0.0, 1.0).powi(3)
            }
        })
    }

    /// White sprite with alpha from `alpha(radius, angle)`, radius 1 at the edge.
    fn radial(size: u32, alpha: impl Fn(f32, f32) -> f32) -> Self {
        let size = size.max(1);
        let half = size as f32 * 0.5;
        let mut data = Vec::with_capacity(rgba_len(size, size).unwrap_or_default());
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5 - half) / half;
                let dy = (y as f32 + 0.5 - half) / half;
                let r = (dx * dx + dy * dy).sqrt();
                let a = alpha(r, dy.atan2(dx));
                data.extend_from_slice(&[255, 255, 255, unit_to_u8(a)]);
            }
        }
        Self {
            data,
            width: size,
            height: size,
            filter: FilterMode::Linear,
        }
    }

    /// Generated sprite for a `builtin/` name (prefix already stripped).
    pub fn builtin(name: &str) -> Result<Self, TextureError> {
        match name {
            "soft" => Ok(Self::soft_disc(64)),
            "snowflake" => Ok(Self::snowflake(64)),
            "spark" => Ok(Self::spark(32)),
            "white" => Ok(Self::solid(255, 255, 255, 255)),
            other => Err(TextureError::UnknownBuiltin(other.to_string())),
        }
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Resolves logical sprite names against an asset directory.
#[derive(Debug, Clone)]
pub struct TextureLoader {
    root: PathBuf,
    max_dimension: u32,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Cap the side length of loaded sprites.
    pub fn with_max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = limit;
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path a non-builtin name maps to.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let mut path = self.root.join(name);
        if path.extension().is_none() {
            path.set_extension("png");
        }
        path
    }

    /// Load the sprite for `name`.
    pub fn load(&self, name: &str) -> Result<SpriteImage, TextureError> {
        let image = match name.strip_prefix(BUILTIN_PREFIX) {
            Some(builtin) => SpriteImage::builtin(builtin)?,
            None => {
                let path = self.resolve(name);
                if !path.is_file() {
                    return Err(TextureError::NotFound {
                        name: name.to_string(),
                        path,
                    });
                }
                SpriteImage::from_file(&path)?
            }
        };
        image.ensure_fits(name, self.max_dimension)?;
        Ok(image)
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new("assets")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_appends_png() {
        let loader = TextureLoader::new("assets");
        assert_eq!(loader.resolve("fire"), PathBuf::from("assets/fire.png"));
        assert_eq!(loader.resolve("fire.jpg"), PathBuf::from("assets/fire.jpg"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = TextureLoader::new(dir.path());
        let err = loader.load("snowflake").unwrap_err();
        assert!(matches!(err, TextureError::NotFound { .. }));
    }

    #[test]
    fn test_loads_png_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 40]));
        img.save(dir.path().join("dot.png")).unwrap();

        let sprite = TextureLoader::new(dir.path()).load("dot").unwrap();
        assert_eq!((sprite.width, sprite.height), (4, 2));
        assert_eq!(&sprite.data[..4], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_oversized_png_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(16, 2, image::Rgba([255, 255, 255, 255]));
        img.save(dir.path().join("wide.png")).unwrap();

        let loader = TextureLoader::new(dir.path()).with_max_dimension(8);
        match loader.load("wide").unwrap_err() {
            TextureError::TooLarge { width, height, limit, .. } => {
                assert_eq!((width, height, limit), (16, 2, 8));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(loader.load("builtin/white").is_ok());
        assert!(TextureLoader::new(dir.path()).load("wide").is_ok());
    }

    #[test]
    fn test_rgba_len_does_not_wrap() {
        assert_eq!(rgba_len(4, 2), Some(32));
        assert_eq!(rgba_len(70_000, 70_000), Some(70_000 * 70_000 * 4));
        assert_eq!(rgba_len(0, 100), Some(0));
    }

    #[test]
    #[should_panic(expected = "RGBA data size mismatch")]
    fn test_from_rgba_rejects_wrapped_size() {
        // 65536 * 16384 * 4 wraps to 0 in u32 arithmetic.
        SpriteImage::from_rgba(Vec::new(), 65_536, 16_384);
    }

    #[test]
    fn test_builtins() {
        let loader = TextureLoader::default();
        for name in ["builtin/soft", "builtin/snowflake", "builtin/spark", "builtin/white"] {
            let sprite = loader.load(name).unwrap();
            assert_eq!(Some(sprite.data.len()), rgba_len(sprite.width, sprite.height));
        }
        assert!(matches!(
            loader.load("builtin/nope"),
            Err(TextureError::UnknownBuiltin(_))
        ));
    }

    #[test]
    fn test_soft_disc_fades_to_edge() {
        let sprite = SpriteImage::soft_disc(32);
        let alpha = |x: u32, y: u32| sprite.data[((y * 32 + x) * 4 + 3) as usize];
        assert!(alpha(16, 16) > 200);
        assert_eq!(alpha(0, 0), 0);
    }
}

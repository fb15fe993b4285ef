use std::path::Path;
use crate::error::{ParticlesError, Result};
use crate::renderer::wgpu_context::WgpuContext;

/// Decoded sprite pixels, always 4 channels of 8 bits.
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let texture_error = |reason: String| ParticlesError::TextureLoad {
            path: path.to_path_buf(),
            reason,
        };

        let file_data = std::fs::read(path).map_err(|e| texture_error(e.to_string()))?;
        let image = image::load_from_memory(&file_data).map_err(|e| texture_error(e.to_string()))?;

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(texture_error("image has no pixels".to_string()));
        }

        log::debug!("Decoded sprite {} ({}x{})", path.display(), width, height);
        Ok(Self { width, height, rgba: rgba.into_raw() })
    }
}

pub struct SpriteTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl SpriteTexture {
    pub fn from_file(wgpu_context: &WgpuContext, path: impl AsRef<Path>) -> Result<Self> {
        let image = SpriteImage::load(path)?;
        Ok(Self::from_image(wgpu_context, &image))
    }

    pub fn from_image(wgpu_context: &WgpuContext, image: &SpriteImage) -> Self {
        let device = wgpu_context.get_device();
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        wgpu_context.get_queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sprite_is_a_texture_error() {
        let err = SpriteImage::load("/no/such/sprite.png").err().unwrap();
        assert_eq!(err.stage_tag(), "texture");
    }

    #[test]
    fn undecodable_sprite_is_a_texture_error() {
        let path = std::env::temp_dir().join(format!("tbo_particles_bad_{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png").unwrap();
        let result = SpriteImage::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ParticlesError::TextureLoad { .. })));
    }

    #[test]
    fn png_is_converted_to_rgba8() {
        let path = std::env::temp_dir().join(format!("tbo_particles_ok_{}.png", std::process::id()));
        image::GrayImage::from_pixel(3, 2, image::Luma([200u8])).save(&path).unwrap();
        let sprite = SpriteImage::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!((sprite.width, sprite.height), (3, 2));
        assert_eq!(sprite.rgba.len(), 3 * 2 * 4);
        assert_eq!(&sprite.rgba[0..4], &[200, 200, 200, 255]);
    }

    #[test]
    fn bundled_sprite_decodes() {
        let sprite = SpriteImage::load(concat!(env!("CARGO_MANIFEST_DIR"), "/particle.png")).unwrap();
        assert_eq!((sprite.width, sprite.height), (32, 32));
        assert_eq!(sprite.rgba.len(), 32 * 32 * 4);
    }
}

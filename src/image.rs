//! Simple image structs, used for window icons and custom cursors.
//!
//! This doesn't use the `image` crate, however converting an `ImageBuffer`
//! into an `Image` from this module should be easy.

use std::ops::{Index, IndexMut};
use crate::error::{self, Result};
use crate::{Extent2, Rgba, Vec2};

/// Row-major pixels with a top-left origin.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Image<T> {
    #[allow(missing_docs)]
    pub pixels: Vec<T>,
    #[allow(missing_docs)]
    pub size: Extent2<u32>,
}

/// 32-bit RGBA image, non-premultiplied, as accepted by icons and cursors.
pub type RgbaImage = Image<Rgba<u8>>;

impl<T> Image<T> {
    /// Creates an image, checking that it is not empty and that `pixels` fills it exactly.
    pub fn new(size: Extent2<u32>, pixels: Vec<T>) -> Result<Self> {
        let img = Self { pixels, size };
        img.validate()?;
        Ok(img)
    }
    pub(crate) fn validate(&self) -> Result<()> {
        if self.size.w == 0 || self.size.h == 0 {
            return error::invalid_value(format!("Invalid image dimensions {}x{}", self.size.w, self.size.h));
        }
        if self.pixels.len() != self.size.w as usize * self.size.h as usize {
            return error::invalid_value(format!("Image of {}x{} has {} pixels", self.size.w, self.size.h, self.pixels.len()));
        }
        Ok(())
    }
    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(x < self.size.w && y < self.size.h, "pixel ({}, {}) is out of bounds", x, y);
        (self.size.w * y + x) as usize
    }
}

macro_rules! image_impl_index {
    ($($idx:ident)+) => { $(
        impl<T> Index<Vec2<$idx>> for Image<T> {
            type Output = T;
            fn index(&self, v: Vec2<$idx>) -> &T {
                &self.pixels[self.offset(v.x as u32, v.y as u32)]
            }
        }
        impl<T> IndexMut<Vec2<$idx>> for Image<T> {
            fn index_mut(&mut self, v: Vec2<$idx>) -> &mut T {
                let i = self.offset(v.x as u32, v.y as u32);
                &mut self.pixels[i]
            }
        }
    )+ };
}

image_impl_index!{u32 usize}

impl Image<Rgba<u8>> {
    /// B, G, R, A bytes per pixel, as a top-down 32-bit DIB section wants them.
    pub(crate) fn to_bgra_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            out.extend_from_slice(&[p.b, p.g, p.r, p.a]);
        }
        out
    }
    /// One `0xAARRGGBB` value per pixel, optionally with premultiplied alpha.
    pub(crate) fn to_argb(&self, premultiply: bool) -> Vec<u32> {
        self.pixels.iter().map(|p| {
            let a = p.a as u32;
            let (r, g, b) = if premultiply {
                (p.r as u32 * a / 255, p.g as u32 * a / 255, p.b as u32 * a / 255)
            } else {
                (p.r as u32, p.g as u32, p.b as u32)
            };
            a << 24 | r << 16 | g << 8 | b
        }).collect()
    }
}

/// Picks the image whose area is closest to `w * h`; the first one wins ties.
pub(crate) fn choose_image<T>(images: &[Image<T>], w: u32, h: u32) -> Option<&Image<T>> {
    let target = w as i64 * h as i64;
    images.iter().min_by_key(|img| (img.size.w as i64 * img.size.h as i64 - target).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, c: Rgba<u8>) -> RgbaImage {
        Image::new(Extent2::new(w, h), vec![c; (w * h) as usize]).unwrap()
    }

    #[test]
    fn empty_or_short_images_are_invalid() {
        assert!(Image::<u8>::new(Extent2::new(0, 4), vec![]).is_err());
        assert!(Image::new(Extent2::new(2, 2), vec![0u8; 3]).is_err());
    }

    #[test]
    fn argb_premultiplies_on_request() {
        let img = solid(1, 1, Rgba::new(255, 128, 0, 128));
        assert_eq!(img.to_argb(false)[0], 0x80FF8000);
        assert_eq!(img.to_argb(true)[0], 0x80804000);
        assert_eq!(img.to_bgra_bytes(), vec![0, 128, 255, 128]);
    }

    #[test]
    fn closest_area_wins() {
        let imgs = vec![solid(16, 16, Rgba::zero()), solid(32, 32, Rgba::zero()), solid(64, 64, Rgba::zero())];
        assert_eq!(choose_image(&imgs, 30, 30).unwrap().size.w, 32);
        assert_eq!(choose_image(&imgs, 256, 256).unwrap().size.w, 64);
    }

    #[test]
    fn indexing_is_row_major() {
        let mut img = solid(3, 2, Rgba::zero());
        img[Vec2::new(2u32, 1)] = Rgba::new(1, 2, 3, 4);
        assert_eq!(img.pixels[5], Rgba::new(1, 2, 3, 4));
    }
}

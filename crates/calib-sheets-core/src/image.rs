/// Errors from raster construction and composition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("buffer holds {got} bytes, {width}x{height} needs {expected}")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
    #[error(
        "rect {w}x{h} at ({x}, {y}) does not fit into {width}x{height} image"
    )]
    OutOfBounds {
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        width: usize,
        height: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned 8-bit grayscale raster, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image of the given size with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(ImageError::BufferSize {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Fill the `w x h` rectangle at `(x, y)` with `value`.
    pub fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        value: u8,
    ) -> Result<(), ImageError> {
        self.check_rect(x, y, w, h)?;
        for row in y..y + h {
            let start = row * self.width + x;
            self.data[start..start + w].fill(value);
        }
        Ok(())
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Pixels are overwritten, not blended. The whole source must fit.
    pub fn blit(&mut self, src: &GrayImage, x: usize, y: usize) -> Result<(), ImageError> {
        self.check_rect(x, y, src.width, src.height)?;
        for row in 0..src.height {
            let dst = (y + row) * self.width + x;
            let from = row * src.width;
            self.data[dst..dst + src.width].copy_from_slice(&src.data[from..from + src.width]);
        }
        Ok(())
    }

    fn check_rect(&self, x: usize, y: usize, w: usize, h: usize) -> Result<(), ImageError> {
        let fits_x = x.checked_add(w).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(h).is_some_and(|end| end <= self.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(ImageError::OutOfBounds {
                x,
                y,
                w,
                h,
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl<'a> GrayImageView<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy the view into an owned image.
    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

//! 8-bit grayscale PNG encoding and decoding with optional DPI metadata.

use calib_sheets_core::GrayImage;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

use crate::page::{dpi_to_ppm, ppm_to_dpi};
use crate::PrintError;

/// A decoded grayscale PNG.
#[derive(Clone, Debug)]
pub struct DecodedPng {
    pub image: GrayImage,
    /// `(x, y)` resolution from `pHYs`, when stored in meters.
    pub dpi: Option<(u32, u32)>,
}

/// Encode `image` as 8-bit grayscale. With `dpi`, a `pHYs` chunk is written
/// with the same resolution on both axes.
pub fn encode_gray_png<W: Write>(
    image: &GrayImage,
    dpi: Option<u32>,
    out: W,
) -> Result<(), PrintError> {
    let (width, height) = png_dims(image)?;
    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(dpi) = dpi {
        let ppm = dpi_to_ppm(dpi);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    writer.finish()?;
    Ok(())
}

/// Write `image` to `path` as a grayscale PNG.
pub fn write_gray_png(
    path: impl AsRef<Path>,
    image: &GrayImage,
    dpi: Option<u32>,
) -> Result<(), PrintError> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    encode_gray_png(image, dpi, &mut out)?;
    out.flush()?;
    log::debug!(
        "wrote {}x{} PNG to {}",
        image.width,
        image.height,
        path.display()
    );
    Ok(())
}

/// Decode an 8-bit grayscale PNG.
pub fn decode_gray_png<R: BufRead + Seek>(input: R) -> Result<DecodedPng, PrintError> {
    let mut reader = png::Decoder::new(input).read_info()?;

    let (color, depth) = reader.output_color_type();
    if color != png::ColorType::Grayscale || depth != png::BitDepth::Eight {
        return Err(PrintError::UnsupportedPng { color, depth });
    }

    let info = reader.info();
    let (width, height) = (info.width as usize, info.height as usize);
    let dpi = info
        .pixel_dims
        .filter(|dims| dims.unit == png::Unit::Meter)
        .map(|dims| (ppm_to_dpi(dims.xppu), ppm_to_dpi(dims.yppu)));

    let mut data = vec![0u8; width * height];
    reader.next_frame(&mut data)?;

    Ok(DecodedPng {
        image: GrayImage::from_raw(width, height, data)?,
        dpi,
    })
}

/// Read a grayscale PNG from disk.
pub fn read_gray_png(path: impl AsRef<Path>) -> Result<DecodedPng, PrintError> {
    decode_gray_png(BufReader::new(File::open(path)?))
}

fn png_dims(image: &GrayImage) -> Result<(u32, u32), PrintError> {
    let too_large = || {
        PrintError::InvalidConfig(format!(
            "image {}x{} does not fit a PNG header",
            image.width, image.height
        ))
    };
    let width = u32::try_from(image.width).map_err(|_| too_large())?;
    let height = u32::try_from(image.height).map_err(|_| too_large())?;
    if width == 0 || height == 0 {
        return Err(PrintError::InvalidConfig("cannot encode an empty image".to_string()));
    }
    Ok((width, height))
}

use dicom::object::DefaultDicomObject;
use dicom::pixeldata::{DecodedPixelData, PixelDecoder, PlanarConfiguration};

use crate::error::{Error, Result};
use crate::model::PixelArray;

/// Turns the PixelData of an instance into a channel-first `f32` grid.
///
/// The resulting shape is `(frames, samples_per_pixel, rows, columns)`. Sample values go through
/// the modality LUT (rescale slope and intercept) when the instance declares one.
pub struct PixelPipeline;

impl PixelPipeline {
    pub fn decode(object: &DefaultDicomObject) -> Result<PixelArray> {
        let decoded = object
            .decode_pixel_data()
            .map_err(|err| Error::malformed(format!("failed to decode pixel data: {err}")))?;

        Self::to_pixel_array(&decoded)
    }

    pub fn to_pixel_array(decoded: &DecodedPixelData<'_>) -> Result<PixelArray> {
        let frames = decoded.number_of_frames() as usize;
        let samples = usize::from(decoded.samples_per_pixel());
        let rows = decoded.rows() as usize;
        let columns = decoded.columns() as usize;

        if samples == 0 {
            return Err(Error::malformed("SamplesPerPixel must be at least 1"));
        }

        let values = decoded
            .to_vec::<f32>()
            .map_err(|err| Error::malformed(format!("failed to materialize pixel data: {err}")))?;

        let pixel_count = rows * columns;
        let frame_len = pixel_count * samples;
        if values.len() < frames * frame_len {
            return Err(Error::malformed(format!(
                "pixel buffer holds {} samples, expected {} for {frames} frame(s) of {rows} x {columns} x {samples}",
                values.len(),
                frames * frame_len
            )));
        }

        let mut planar = Vec::with_capacity(frames * frame_len);
        for frame in values.chunks_exact(frame_len).take(frames) {
            match decoded.planar_configuration() {
                PlanarConfiguration::PixelFirst => planar.extend_from_slice(frame),
                PlanarConfiguration::Standard => {
                    interleaved_to_planar(frame, samples, pixel_count, &mut planar)
                }
            }
        }

        PixelArray::new(vec![frames, samples, rows, columns], planar)
            .ok_or_else(|| Error::malformed("pixel buffer does not match the declared geometry"))
    }
}

/// `R1 G1 B1 R2 G2 B2 ...` into `R1 R2 ... G1 G2 ... B1 B2 ...`.
fn interleaved_to_planar(frame: &[f32], samples: usize, pixel_count: usize, out: &mut Vec<f32>) {
    if samples == 1 {
        out.extend_from_slice(frame);
        return;
    }

    for channel in 0..samples {
        out.extend((0..pixel_count).map(|idx| frame[idx * samples + channel]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_split_of_rgb_frame() {
        let frame = [1.0, 10.0, 100.0, 2.0, 20.0, 200.0];
        let mut out = Vec::new();
        interleaved_to_planar(&frame, 3, 2, &mut out);
        assert_eq!(out, vec![1.0, 2.0, 10.0, 20.0, 100.0, 200.0]);
    }

    #[test]
    fn single_sample_is_copied() {
        let frame = [3.0, 4.0, 5.0];
        let mut out = vec![0.5];
        interleaved_to_planar(&frame, 1, 3, &mut out);
        assert_eq!(out, vec![0.5, 3.0, 4.0, 5.0]);
    }
}

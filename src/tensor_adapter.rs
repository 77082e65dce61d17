use crate::error::{Error, Result};
use crate::model::{InferenceTensor, PixelArray};

/// Explicit transforms allowed when the decoded image does not already have the model's input
/// shape. With both disabled only an exact match is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptOptions {
    /// Copy a single-channel image into every model channel.
    pub replicate_channels: bool,
    /// Place a smaller image at the top-left of a zero-filled plane.
    pub zero_pad: bool,
}

impl AdaptOptions {
    pub fn strict() -> Self {
        Self::default()
    }
}

/// Builds the model input from decoded pixels.
///
/// `target_shape` is `(batch, channels, height, width)`; batch corresponds to the number of
/// frames. The result always has exactly `target_shape`.
pub fn build_input_tensor(
    pixels: &PixelArray,
    target_shape: &[usize],
    options: AdaptOptions,
) -> Result<InferenceTensor> {
    let mismatch = || Error::ShapeMismatch {
        expected: target_shape.to_vec(),
        actual: pixels.shape().to_vec(),
    };

    if pixels.shape() == target_shape {
        return Ok(pixels.clone());
    }

    let (&[frames, channels, rows, columns], &[batch, target_channels, height, width]) =
        (pixels.shape(), target_shape)
    else {
        return Err(mismatch());
    };

    if frames != batch || rows == 0 || columns == 0 {
        return Err(mismatch());
    }

    let mut current = pixels.clone();

    if channels != target_channels {
        if !(options.replicate_channels && channels == 1) {
            return Err(mismatch());
        }
        log::info!("Replicating single-channel image into {target_channels} channels");
        current = replicate_channels(&current, target_channels);
    }

    if (rows, columns) != (height, width) {
        if !(options.zero_pad && rows <= height && columns <= width) {
            return Err(mismatch());
        }
        log::info!("Zero-padding {rows} x {columns} image to {height} x {width}");
        current = zero_pad(&current, height, width);
    }

    debug_assert_eq!(current.shape(), target_shape);
    Ok(current)
}

fn replicate_channels(pixels: &PixelArray, channels: usize) -> PixelArray {
    let &[frames, _, rows, columns] = pixels.shape() else {
        unreachable!("replicate_channels expects a rank-4 array");
    };
    let plane = rows * columns;

    let mut data = Vec::with_capacity(frames * channels * plane);
    for frame in pixels.data().chunks_exact(plane) {
        for _ in 0..channels {
            data.extend_from_slice(frame);
        }
    }

    PixelArray::new(vec![frames, channels, rows, columns], data)
        .unwrap_or_else(|| unreachable!("replicated buffer has the computed length"))
}

fn zero_pad(pixels: &PixelArray, height: usize, width: usize) -> PixelArray {
    let &[frames, channels, rows, columns] = pixels.shape() else {
        unreachable!("zero_pad expects a rank-4 array");
    };

    let mut padded = PixelArray::zeros(vec![frames, channels, height, width]);
    let source_planes = pixels.data().chunks_exact(rows * columns);
    let target_planes = padded.data_mut().chunks_exact_mut(height * width);
    for (source, target) in source_planes.zip(target_planes) {
        for (row, line) in source.chunks_exact(columns).enumerate() {
            target[row * width..row * width + columns].copy_from_slice(line);
        }
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shape: Vec<usize>) -> PixelArray {
        let len = shape.iter().product();
        PixelArray::new(shape, (0..len).map(|value| value as f32).collect()).unwrap()
    }

    #[test]
    fn identity_when_shapes_match() {
        let pixels = ramp(vec![1, 1, 4, 3]);
        let tensor = build_input_tensor(&pixels, &[1, 1, 4, 3], AdaptOptions::strict()).unwrap();
        assert_eq!(tensor, pixels);
    }

    #[test]
    fn strict_rejects_channel_mismatch() {
        let pixels = ramp(vec![1, 1, 160, 160]);
        let err = build_input_tensor(&pixels, &[1, 4, 160, 160], AdaptOptions::strict())
            .unwrap_err();
        match err {
            Error::ShapeMismatch { expected, actual } => {
                assert_eq!(expected, vec![1, 4, 160, 160]);
                assert_eq!(actual, vec![1, 1, 160, 160]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_other_ranks_and_batch_mismatch() {
        let pixels = ramp(vec![2, 1, 2, 2]);
        let options = AdaptOptions {
            replicate_channels: true,
            zero_pad: true,
        };
        assert!(build_input_tensor(&pixels, &[2, 2, 2], options).is_err());
        assert!(build_input_tensor(&pixels, &[1, 1, 2, 2], options).is_err());
    }

    #[test]
    fn replicates_single_channel() {
        let pixels = ramp(vec![1, 1, 2, 2]);
        let options = AdaptOptions {
            replicate_channels: true,
            ..AdaptOptions::default()
        };
        let tensor = build_input_tensor(&pixels, &[1, 3, 2, 2], options).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
        assert_eq!(
            tensor.data(),
            &[0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn replication_does_not_apply_to_multi_channel_images() {
        let pixels = ramp(vec![1, 3, 2, 2]);
        let options = AdaptOptions {
            replicate_channels: true,
            ..AdaptOptions::default()
        };
        assert!(build_input_tensor(&pixels, &[1, 4, 2, 2], options).is_err());
    }

    #[test]
    fn pads_to_the_top_left() {
        let pixels = ramp(vec![1, 1, 2, 2]);
        let options = AdaptOptions {
            zero_pad: true,
            ..AdaptOptions::default()
        };
        let tensor = build_input_tensor(&pixels, &[1, 1, 3, 3], options).unwrap();
        assert_eq!(
            tensor.data(),
            &[0.0, 1.0, 0.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]
        );

        assert!(build_input_tensor(&pixels, &[1, 1, 1, 3], options).is_err());
    }

    #[test]
    fn replicate_then_pad() {
        let pixels = ramp(vec![1, 1, 1, 1]);
        let options = AdaptOptions {
            replicate_channels: true,
            zero_pad: true,
        };
        let tensor = build_input_tensor(&pixels, &[1, 2, 1, 2], options).unwrap();
        assert_eq!(tensor.data(), &[0.0, 0.0, 0.0, 0.0]);

        let pixels = PixelArray::new(vec![1, 1, 1, 1], vec![9.0]).unwrap();
        let tensor = build_input_tensor(&pixels, &[1, 2, 1, 2], options).unwrap();
        assert_eq!(tensor.data(), &[9.0, 0.0, 9.0, 0.0]);
    }
}

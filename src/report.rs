//! Console output of a run.

use std::io::{self, Write};

use crate::inference::InferenceResult;
use crate::model::{ElementRow, ImageMetadata};
use crate::utils::{format_display_name, format_image_size, format_pixel_spacing, format_shape};

pub fn write_metadata<W: Write>(
    out: &mut W,
    uri: &str,
    metadata: &ImageMetadata,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Filename.........: {uri}")?;
    writeln!(out, "Storage type.....: {}", metadata.sop_class_uid)?;
    writeln!(out)?;

    writeln!(
        out,
        "Patient's name...: {}",
        format_display_name(&metadata.patient_family_name, &metadata.patient_given_name)
    )?;
    writeln!(out, "Patient id.......: {}", metadata.patient_id)?;
    writeln!(out, "Modality.........: {}", metadata.modality)?;
    writeln!(out, "Study Date.......: {}", metadata.study_date)?;

    if let (Some(rows), Some(columns), Some(byte_len)) = (
        metadata.rows,
        metadata.columns,
        metadata.pixel_data_byte_length,
    ) {
        writeln!(
            out,
            "Image size.......: {}",
            format_image_size(rows, columns, byte_len)
        )?;
        if let Some(spacing) = &metadata.pixel_spacing {
            writeln!(out, "Pixel spacing....: {}", format_pixel_spacing(spacing))?;
        }
    }

    Ok(())
}

pub fn write_elements<W: Write>(out: &mut W, elements: &[ElementRow]) -> io::Result<()> {
    writeln!(out)?;
    let alias_width = elements
        .iter()
        .map(|row| row.alias.len())
        .max()
        .unwrap_or(0);
    for row in elements {
        writeln!(
            out,
            "{}  {}  {:alias_width$}  {}",
            row.tag, row.vr, row.alias, row.value
        )?;
    }
    Ok(())
}

pub fn write_inference<W: Write>(
    out: &mut W,
    request_url: &str,
    input_shape: &[usize],
    result: &InferenceResult,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Request URL: {request_url}")?;
    writeln!(out, "Input shape: {}", format_shape(input_shape))?;
    writeln!(out, "Output shape: {}", format_shape(result.outputs.shape()))?;
    writeln!(
        out,
        "Completed Inference with one sample in {:.3} sec",
        result.elapsed_seconds()
    )
}

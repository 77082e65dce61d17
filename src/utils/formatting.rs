use dicom::core::value::{PrimitiveValue, Value};
use dicom::core::{Tag, VR};

use crate::model::PixelSpacing;

const MAX_VALUE_LEN: usize = 120;

pub fn value_to_string<I, P>(value: &Value<I, P>, vr: VR) -> String {
    let rendered = match value {
        Value::Primitive(primitive) => format_primitive_value(primitive, vr),
        Value::Sequence(sequence) => {
            let count = sequence.multiplicity() as usize;
            let suffix = if count == 1 { "" } else { "s" };
            format!("Sequence ({count} item{suffix})")
        }
        Value::PixelSequence(sequence) => {
            let fragments = sequence.fragments().len();
            let fragment_suffix = if fragments == 1 { "" } else { "s" };
            let offset_entries = sequence.offset_table().len();
            if offset_entries > 0 {
                let offset_suffix = if offset_entries == 1 { "" } else { "s" };
                format!(
                    "Pixel data ({fragments} fragment{fragment_suffix}, offset table {offset_entries} entry{offset_suffix})"
                )
            } else {
                format!("Pixel data ({fragments} fragment{fragment_suffix})")
            }
        }
    };

    truncate(rendered, MAX_VALUE_LEN)
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut truncated = text.chars().take(max_chars).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        text
    }
}

pub fn format_tag(tag: Tag) -> String {
    format!("{:04X},{:04X}", tag.group(), tag.element())
}

fn format_primitive_value(value: &PrimitiveValue, vr: VR) -> String {
    let mut rendered = match value {
        PrimitiveValue::Empty => String::new(),
        PrimitiveValue::Str(_)
        | PrimitiveValue::Strs(_)
        | PrimitiveValue::Date(_)
        | PrimitiveValue::Time(_)
        | PrimitiveValue::DateTime(_)
        | PrimitiveValue::I16(_)
        | PrimitiveValue::I32(_)
        | PrimitiveValue::I64(_)
        | PrimitiveValue::F32(_)
        | PrimitiveValue::F64(_) => value.to_str().into_owned(),
        PrimitiveValue::U16(_) | PrimitiveValue::U32(_) | PrimitiveValue::U64(_) => {
            if is_binary_vr(vr) {
                binary_summary(value)
            } else {
                value.to_str().into_owned()
            }
        }
        PrimitiveValue::Tags(values) => values
            .iter()
            .map(|tag| format_tag(*tag))
            .collect::<Vec<_>>()
            .join("\\"),
        PrimitiveValue::U8(_) => {
            if is_binary_vr(vr) {
                binary_summary(value)
            } else {
                value.to_str().into_owned()
            }
        }
    };

    if rendered.is_empty() && matches!(value, PrimitiveValue::Empty) {
        rendered.push_str("(empty)");
    }

    rendered
}

fn binary_summary(value: &PrimitiveValue) -> String {
    format!("Binary data ({} bytes)", value.calculate_byte_len())
}

fn is_binary_vr(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN
    )
}

/// `(1, 4, 160, 160)`; an empty shape renders as `()`.
pub fn format_shape(shape: &[usize]) -> String {
    let dims = shape
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("({dims})")
}

pub fn format_display_name(family: &str, given: &str) -> String {
    format!("{family}, {given}")
}

pub fn format_image_size(rows: u32, columns: u32, byte_len: usize) -> String {
    format!("{rows} x {columns}, {byte_len} bytes")
}

pub fn format_pixel_spacing(spacing: &PixelSpacing) -> String {
    let (row, column) = &spacing.stored;
    format!("[{row}, {column}]")
}

use std::cell::Cell;
use std::io::{self, Read};

use dicom::core::dictionary::DataDictionary;
use dicom::core::header::Header;
use dicom::core::value::Value;
use dicom::core::Tag;
use dicom::dictionary_std::{tags, StandardDataDictionary};
use dicom::encoding::TransferSyntaxIndex;
use dicom::object::{from_reader, DefaultDicomObject};
use dicom::parser::dataset::DataToken;
use dicom::parser::DataSetReader;
use dicom::transfer_syntax::TransferSyntaxRegistry;

use crate::error::{Error, Result};
use crate::image_pipeline::PixelPipeline;
use crate::model::{ElementRow, ImageMetadata, PixelArray, PixelSpacing};
use crate::utils::{format_tag, value_to_string};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
/// (0002,0000) UL in explicit VR little endian: tag, VR, length and a 4 byte value.
const GROUP_LENGTH_ELEMENT_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub metadata: ImageMetadata,
    pub pixels: Option<PixelArray>,
    /// Every top-level element of the data set, in file order.
    pub elements: Vec<ElementRow>,
}

/// Reads a complete DICOM file from `stream`.
///
/// The stream is consumed and dropped before this returns, whether decoding succeeds or not.
pub fn decode<R: Read>(mut stream: R) -> Result<DecodedImage> {
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|err| Error::malformed(format!("failed to read image stream ({err})")))?;
    drop(stream);

    log::debug!("Decoding {} bytes of DICOM data", bytes.len());
    let object = parse_object(&bytes)?;
    decode_object(&object)
}

fn parse_object(bytes: &[u8]) -> Result<DefaultDicomObject> {
    let body = if bytes.starts_with(MAGIC) {
        bytes
    } else if bytes.len() >= PREAMBLE_LEN + MAGIC.len()
        && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
    {
        &bytes[PREAMBLE_LEN..]
    } else {
        return Err(Error::malformed("missing DICM magic code"));
    };

    let object = from_reader(body).map_err(|err| {
        let message = format!("failed to parse DICOM data set ({err})");
        log::error!("{message}");
        Error::MalformedImage(message)
    })?;
    ensure_complete(body, &object)?;
    Ok(object)
}

/// Counts the bytes handed out by the inner reader.
struct CountingReader<'a, R> {
    inner: R,
    count: &'a Cell<usize>,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.count.set(self.count.get() + read);
        Ok(read)
    }
}

/// The data set reader treats end of input inside an element tag as the end of the data set.
/// Walks the tokens again and requires the last complete one to end exactly at the end of
/// `body`, with every sequence and item closed.
fn ensure_complete(body: &[u8], object: &DefaultDicomObject) -> Result<()> {
    let meta = object.meta();
    let start = MAGIC.len() + GROUP_LENGTH_ELEMENT_LEN + meta.information_group_length as usize;
    let data_set = body
        .get(start..)
        .ok_or_else(|| Error::malformed("file meta group is truncated"))?;
    let ts = TransferSyntaxRegistry
        .get(meta.transfer_syntax())
        .ok_or_else(|| {
            Error::malformed(format!("unsupported transfer syntax {}", meta.transfer_syntax()))
        })?;

    let consumed = Cell::new(0);
    let source = CountingReader {
        inner: data_set,
        count: &consumed,
    };
    let reader = DataSetReader::new_with_ts(source, ts)
        .map_err(|err| Error::malformed(format!("failed to read data set ({err})")))?;

    let mut depth = 0_usize;
    let mut boundary = 0;
    for token in reader {
        let token =
            token.map_err(|err| Error::malformed(format!("failed to read data set ({err})")))?;
        match token {
            DataToken::SequenceStart { .. }
            | DataToken::PixelSequenceStart
            | DataToken::ItemStart { .. } => depth += 1,
            DataToken::SequenceEnd | DataToken::ItemEnd => depth = depth.saturating_sub(1),
            _ => {}
        }
        boundary = consumed.get();
    }

    if depth != 0 || boundary != data_set.len() {
        let message = format!(
            "data set is truncated after byte {} of {}",
            start + boundary,
            body.len()
        );
        log::error!("{message}");
        return Err(Error::MalformedImage(message));
    }
    Ok(())
}

pub fn decode_object(object: &DefaultDicomObject) -> Result<DecodedImage> {
    let sop_class_uid = attribute_text(object, "SOPClassUID")
        .or_else(|| {
            let uid = trim_padding(&object.meta().media_storage_sop_class_uid).to_string();
            (!uid.is_empty()).then_some(uid)
        })
        .ok_or_else(|| Error::malformed("SOP Class UID is missing"))?;

    let (patient_family_name, patient_given_name) = attribute_text(object, "PatientName")
        .map(|name| split_person_name(&name))
        .unwrap_or_default();

    let mut metadata = ImageMetadata {
        sop_class_uid,
        patient_family_name,
        patient_given_name,
        patient_id: attribute_text(object, "PatientID").unwrap_or_default(),
        modality: attribute_text(object, "Modality").unwrap_or_default(),
        study_date: attribute_text(object, "StudyDate").unwrap_or_default(),
        ..ImageMetadata::default()
    };

    let mut pixels = None;
    if let Some(pixel_data) = object.get(tags::PIXEL_DATA) {
        metadata.rows = Some(required_dimension(object, tags::ROWS, "Rows")?);
        metadata.columns = Some(required_dimension(object, tags::COLUMNS, "Columns")?);
        metadata.pixel_spacing = pixel_spacing(object);
        metadata.pixel_data_byte_length = Some(byte_length(pixel_data.value()));

        pixels = Some(PixelPipeline::decode(object)?);
    }

    Ok(DecodedImage {
        metadata,
        pixels,
        elements: element_rows(object),
    })
}

fn element_rows(object: &DefaultDicomObject) -> Vec<ElementRow> {
    object
        .iter()
        .map(|element| {
            let tag = element.tag();
            let alias = StandardDataDictionary
                .by_tag(tag)
                .map(|entry| entry.alias)
                .unwrap_or("Unknown")
                .to_string();
            let vr = element.vr();

            ElementRow {
                tag: format_tag(tag),
                vr: vr.to_string().to_owned(),
                alias,
                value: value_to_string(element.value(), vr),
            }
        })
        .collect()
}

fn required_dimension(object: &DefaultDicomObject, tag: Tag, name: &str) -> Result<u32> {
    let element = object
        .get(tag)
        .ok_or_else(|| Error::malformed(format!("PixelData present but {name} is missing")))?;
    element
        .to_int::<u32>()
        .map_err(|err| Error::malformed(format!("{name} is not an integer ({err})")))
}

fn pixel_spacing(object: &DefaultDicomObject) -> Option<PixelSpacing> {
    let element = object.get(tags::PIXEL_SPACING)?;
    let values = element.to_multi_float64().ok()?;
    let stored = element.to_multi_str().ok()?;
    match (values.as_slice(), stored.as_ref()) {
        ([row, column], [stored_row, stored_column]) => Some(PixelSpacing {
            row: *row,
            column: *column,
            stored: (
                trim_padding(stored_row).to_string(),
                trim_padding(stored_column).to_string(),
            ),
        }),
        (other, _) => {
            log::warn!(
                "Ignoring PixelSpacing with {} value(s), expected 2",
                other.len()
            );
            None
        }
    }
}

fn byte_length<I, P: AsRef<[u8]>>(value: &Value<I, P>) -> usize {
    match value {
        Value::Primitive(primitive) => primitive.calculate_byte_len(),
        Value::PixelSequence(sequence) => sequence
            .fragments()
            .iter()
            .map(|fragment| fragment.as_ref().len())
            .sum(),
        Value::Sequence(_) => 0,
    }
}

/// `Family^Given^Middle^Prefix^Suffix`, ignoring ideographic and phonetic groups after `=`.
fn split_person_name(value: &str) -> (String, String) {
    let alphabetic = value.split('=').next().unwrap_or_default();
    let mut components = alphabetic.split('^').map(str::trim);
    let family = components.next().unwrap_or_default().to_string();
    let given = components.next().unwrap_or_default().to_string();
    (family, given)
}

fn trim_padding(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

fn attribute_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| trim_padding(&value).to_string())
        .filter(|value| !value.is_empty())
}

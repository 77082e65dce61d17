#![allow(dead_code)]

use dicom::core::value::C;
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CT_IMAGE_STORAGE: &str = uids::CT_IMAGE_STORAGE;

/// Builder for small synthetic DICOM files.
pub struct Fixture {
    object: InMemDicomObject,
}

impl Fixture {
    pub fn new() -> Self {
        let object = InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::SOP_CLASS_UID,
                VR::UI,
                PrimitiveValue::from(CT_IMAGE_STORAGE),
            ),
            DataElement::new(
                tags::SOP_INSTANCE_UID,
                VR::UI,
                PrimitiveValue::from("1.2.826.0.1.3680043.2.1125.1"),
            ),
            DataElement::new(tags::STUDY_DATE, VR::DA, PrimitiveValue::from("20240102")),
            DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")),
            DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane")),
            DataElement::new(tags::PATIENT_ID, VR::LO, PrimitiveValue::from("P-001")),
        ]);
        Self { object }
    }

    pub fn without(mut self, tag: dicom::core::Tag) -> Self {
        self.object.remove_element(tag);
        self
    }

    /// Single-channel 16-bit unsigned image.
    pub fn monochrome(mut self, rows: u16, columns: u16, pixels: &[u16]) -> Self {
        assert_eq!(pixels.len(), usize::from(rows) * usize::from(columns));
        for element in [
            DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
            DataElement::new(
                tags::PHOTOMETRIC_INTERPRETATION,
                VR::CS,
                PrimitiveValue::from("MONOCHROME2"),
            ),
            DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
            DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
            DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
            DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
            DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
            DataElement::new(
                tags::PIXEL_DATA,
                VR::OW,
                PrimitiveValue::U16(C::from_vec(pixels.to_vec())),
            ),
        ] {
            self.object.put(element);
        }
        self
    }

    pub fn pixel_spacing(mut self, row: &str, column: &str) -> Self {
        self.object.put(DataElement::new(
            tags::PIXEL_SPACING,
            VR::DS,
            PrimitiveValue::Strs(C::from_vec(vec![row.to_string(), column.to_string()])),
        ));
        self
    }

    /// Complete Part 10 file: preamble, `DICM`, file meta group, data set.
    pub fn to_bytes(self) -> Vec<u8> {
        let file = self
            .object
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1"),
            )
            .unwrap();
        let mut bytes = Vec::new();
        file.write_all(&mut bytes).unwrap();
        bytes
    }
}

/// `(row * columns + column) % 4096`, so every pixel is distinct within a row.
pub fn ramp(rows: u16, columns: u16) -> Vec<u16> {
    (0..usize::from(rows) * usize::from(columns))
        .map(|idx| (idx % 4096) as u16)
        .collect()
}

/// A `wiremock` server driven from synchronous tests.
///
/// Requests are served off the test thread. The runtime is only entered to start the server and
/// to mount mocks, so blocking clients can be used between those calls.
pub struct MockHttp {
    server: MockServer,
    runtime: Runtime,
}

impl MockHttp {
    pub fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) -> &Self {
        self.runtime.block_on(mock.mount(&self.server));
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }
}

pub fn json(body: impl AsRef<str>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.as_ref().as_bytes().to_vec(), "application/json")
}

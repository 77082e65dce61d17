/// Patient and study attributes extracted from one DICOM instance.
///
/// `rows`, `columns`, `pixel_spacing` and `pixel_data_byte_length` are only populated when the
/// instance carries a PixelData element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub sop_class_uid: String,
    pub patient_family_name: String,
    pub patient_given_name: String,
    pub patient_id: String,
    pub modality: String,
    pub study_date: String,
    pub rows: Option<u32>,
    pub columns: Option<u32>,
    pub pixel_spacing: Option<PixelSpacing>,
    pub pixel_data_byte_length: Option<usize>,
}

/// Row and column spacing in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSpacing {
    pub row: f64,
    pub column: f64,
    /// The two DS values as stored, used for display.
    pub stored: (String, String),
}

impl PixelSpacing {
    pub fn values(&self) -> (f64, f64) {
        (self.row, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRow {
    pub tag: String,
    pub vr: String,
    pub alias: String,
    pub value: String,
}

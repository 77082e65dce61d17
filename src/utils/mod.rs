pub mod formatting;

pub use formatting::{
    format_display_name, format_image_size, format_pixel_spacing, format_shape, format_tag,
    truncate, value_to_string,
};

use std::io::{self, Write};

use crate::archive::{self, ArchiveConnection, DirectoryArchive, XnatConnection};
use crate::config::Config;
use crate::decoder;
use crate::error::{Error, Result};
use crate::inference::{InferenceClient, InferenceResult};
use crate::report;
use crate::tensor_adapter::build_input_tensor;

/// Runs the whole chain once, writing the console report to stdout.
pub fn run(config: &Config) -> Result<InferenceResult> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(config, &mut out)
}

pub fn run_with_output<W: Write>(config: &Config, out: &mut W) -> Result<InferenceResult> {
    let connection = connect(config)?;
    let handle = archive::locate(&*connection, &config.image_path())?;
    let uri = handle.uri().to_string();

    log::info!("Loading DICOM file: {uri}");
    let image = decoder::decode(handle.open()?)?;

    report::write_metadata(out, &uri, &image.metadata).map_err(console_error)?;
    if config.dump_elements {
        report::write_elements(out, &image.elements).map_err(console_error)?;
    }

    let target_shape = &config.input_shape.0;
    let pixels = image.pixels.as_ref().ok_or_else(|| Error::ShapeMismatch {
        expected: target_shape.clone(),
        actual: Vec::new(),
    })?;
    let tensor = build_input_tensor(pixels, target_shape, config.adapt_options())?;

    log::info!("Sending inference request to {}", config.endpoint);
    let result = InferenceClient::new(config.timeout)?.predict(&config.endpoint, &tensor)?;

    report::write_inference(out, &config.endpoint, tensor.shape(), &result)
        .map_err(console_error)?;
    Ok(result)
}

fn connect(config: &Config) -> Result<Box<dyn ArchiveConnection>> {
    if let Some(dir) = &config.archive_dir {
        log::info!("Using local archive mirror at {}", dir.display());
        return Ok(Box::new(DirectoryArchive::new(dir)));
    }

    log::info!("Connecting to {}", config.archive_url);
    let mut connection = XnatConnection::new(&config.archive_url, config.archive_timeout)?;
    if let Some(user) = &config.user {
        connection = connection.with_credentials(user, config.password.clone());
    }
    Ok(Box::new(connection))
}

fn console_error(err: io::Error) -> Error {
    Error::io("stdout", err)
}

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::archive::{ImagePath, Selector};
use crate::tensor_adapter::AdaptOptions;

/// Fetch one DICOM instance from an XNAT archive and send it to a model server.
#[derive(Debug, Clone, Parser)]
#[command(name = "dicomferry", author, version, about, long_about = None)]
pub struct Config {
    /// Base URL of the XNAT archive
    #[arg(long, env = "XNAT_URL", default_value = "https://central.xnat.org")]
    pub archive_url: String,

    /// Read from a local mirror of the archive hierarchy instead of XNAT
    #[arg(long, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    #[arg(long, env = "XNAT_USER")]
    pub user: Option<String>,

    #[arg(long, env = "XNAT_PASSWORD", hide_env_values = true, requires = "user")]
    pub password: Option<String>,

    /// Timeout for each archive request, in seconds
    #[arg(long, value_name = "SECS", default_value = "60", value_parser = parse_seconds)]
    pub archive_timeout: Duration,

    #[arg(long, default_value = "Sample_DICOM")]
    pub project: String,

    #[arg(long, default_value = "dcmtest1")]
    pub subject: String,

    /// Experiment: ordinal position or `id:<ID or label>`
    #[arg(long, default_value = "0")]
    pub session: Selector,

    /// Scan: ordinal position or `id:<scan ID>`
    #[arg(long, default_value = "0")]
    pub scan: Selector,

    /// Resource label
    #[arg(long, default_value = "DICOM")]
    pub resource: String,

    /// File: ordinal position or `id:<file name>`
    #[arg(long, default_value = "0")]
    pub file: Selector,

    /// Model server predict endpoint
    #[arg(
        long,
        env = "INFERENCE_URL",
        default_value = "http://localhost:8001/v1/models/unet:predict"
    )]
    pub endpoint: String,

    /// Model input shape as batch,channels,height,width
    #[arg(long, default_value = "1,4,160,160", value_parser = parse_shape)]
    pub input_shape: InputShape,

    /// Timeout for the inference request, in seconds
    #[arg(long, value_name = "SECS", default_value = "30", value_parser = parse_seconds)]
    pub timeout: Duration,

    /// Copy a single-channel image into every model channel
    #[arg(long)]
    pub replicate_channels: bool,

    /// Zero-pad images smaller than the model input
    #[arg(long)]
    pub zero_pad: bool,

    /// Print every data element of the instance after the summary
    #[arg(long)]
    pub dump_elements: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputShape(pub Vec<usize>);

impl Config {
    pub fn image_path(&self) -> ImagePath {
        ImagePath {
            project: self.project.clone(),
            subject: self.subject.clone(),
            session: self.session.clone(),
            scan: self.scan.clone(),
            resource: self.resource.clone(),
            file: self.file.clone(),
        }
    }

    pub fn adapt_options(&self) -> AdaptOptions {
        AdaptOptions {
            replicate_channels: self.replicate_channels,
            zero_pad: self.zero_pad,
        }
    }
}

fn parse_shape(value: &str) -> Result<InputShape, String> {
    let dims = value
        .split(',')
        .map(|dim| {
            dim.trim()
                .parse::<usize>()
                .ok()
                .filter(|&dim| dim > 0)
                .ok_or_else(|| format!("`{dim}` is not a positive dimension"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if dims.len() != 4 {
        return Err(format!(
            "expected 4 dimensions (batch,channels,height,width), got {}",
            dims.len()
        ));
    }
    Ok(InputShape(dims))
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("timeout must be positive, got `{value}`"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

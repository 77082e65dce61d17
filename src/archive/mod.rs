//! Locating a single file inside a
//! project → subject → experiment → scan → resource → file hierarchy.

mod directory;
mod xnat;

use std::fmt;
use std::io::Read;
use std::str::FromStr;

pub use directory::DirectoryArchive;
pub use xnat::XnatConnection;

use crate::error::{Error, Result};

/// One entry of an ordered archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub label: Option<String>,
}

impl Entry {
    fn matches(&self, key: &str) -> bool {
        self.id == key || self.label.as_deref() == Some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    /// Full URI of the file, suitable for display and for `ArchiveConnection::open`.
    pub uri: String,
}

/// Read access to an archive. Implementations return listings in server order.
pub trait ArchiveConnection {
    fn experiments(&self, project: &str, subject: &str) -> Result<Vec<Entry>>;

    fn scans(&self, project: &str, subject: &str, experiment: &str) -> Result<Vec<Entry>>;

    fn files(
        &self,
        project: &str,
        subject: &str,
        experiment: &str,
        scan: &str,
        resource: &str,
    ) -> Result<Vec<ArchiveFile>>;

    fn open(&self, file: &ArchiveFile) -> Result<Box<dyn Read + '_>>;
}

/// Addresses one level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Position in the listing as returned by the archive.
    Index(usize),
    /// Stable ID or label.
    Id(String),
}

impl Selector {
    fn pick<'a, T>(
        &self,
        what: &'static str,
        items: &'a [T],
        matches: impl Fn(&T, &str) -> bool,
    ) -> Result<&'a T> {
        match self {
            Selector::Index(index) => items.get(*index).ok_or_else(|| {
                Error::not_found(
                    what,
                    format!("ordinal {index} out of range ({} available)", items.len()),
                )
            }),
            Selector::Id(key) => items
                .iter()
                .find(|item| matches(item, key))
                .ok_or_else(|| {
                    Error::not_found(what, format!("no entry with ID or label `{key}`"))
                }),
        }
    }
}

impl FromStr for Selector {
    type Err = String;

    /// A bare non-negative integer is an ordinal; `id:<value>` is a stable identifier.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(id) = value.strip_prefix("id:") {
            if id.is_empty() {
                return Err("empty identifier after `id:`".to_string());
            }
            return Ok(Selector::Id(id.to_string()));
        }

        value.parse::<usize>().map(Selector::Index).map_err(|_| {
            format!("`{value}` is neither an ordinal nor an `id:<identifier>` selector")
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(index) => write!(f, "{index}"),
            Selector::Id(id) => write!(f, "id:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    pub project: String,
    pub subject: String,
    pub session: Selector,
    pub scan: Selector,
    pub resource: String,
    pub file: Selector,
}

/// A resolved file, not yet read.
pub struct ImageHandle<'a> {
    pub project: String,
    pub subject: String,
    pub experiment: String,
    pub scan: String,
    pub resource: String,
    pub file: ArchiveFile,
    connection: &'a dyn ArchiveConnection,
}

impl<'a> ImageHandle<'a> {
    pub fn uri(&self) -> &str {
        &self.file.uri
    }

    /// Opens the byte stream. The handle is consumed so the file is only read once.
    pub fn open(self) -> Result<Box<dyn Read + 'a>> {
        log::info!("Opening {}", self.file.uri);
        self.connection.open(&self.file)
    }
}

pub fn locate<'a>(
    connection: &'a dyn ArchiveConnection,
    path: &ImagePath,
) -> Result<ImageHandle<'a>> {
    log::info!(
        "Locating {}/{} session {} scan {} resource {} file {}",
        path.project,
        path.subject,
        path.session,
        path.scan,
        path.resource,
        path.file
    );

    let experiments = connection.experiments(&path.project, &path.subject)?;
    let experiment = path
        .session
        .pick("experiment", &experiments, Entry::matches)?
        .id
        .clone();
    log::debug!("Resolved session {} to experiment {experiment}", path.session);

    let scans = connection.scans(&path.project, &path.subject, &experiment)?;
    let scan = path.scan.pick("scan", &scans, Entry::matches)?.id.clone();
    log::debug!("Resolved scan {} to {scan}", path.scan);

    let files = connection.files(
        &path.project,
        &path.subject,
        &experiment,
        &scan,
        &path.resource,
    )?;
    let file = path
        .file
        .pick("file", &files, |file: &ArchiveFile, key| file.name == key)?
        .clone();
    log::debug!("Resolved file {} to {}", path.file, file.uri);

    Ok(ImageHandle {
        project: path.project.clone(),
        subject: path.subject.clone(),
        experiment,
        scan,
        resource: path.resource.clone(),
        file,
        connection,
    })
}

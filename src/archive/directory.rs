use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::{ArchiveConnection, ArchiveFile, Entry};
use crate::error::{Error, Result};

/// Archive mirrored on disk as `root/project/subject/experiment/scan/resource/file`.
///
/// Listings are directory entries sorted by name, hidden entries excluded.
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn list(&self, what: &'static str, dir: &Path, want_dirs: bool) -> Result<Vec<String>> {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::not_found(what, dir.display().to_string()));
            }
            Err(err) => return Err(Error::io(dir.display().to_string(), err)),
        };

        let mut names = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|err| Error::io(dir.display().to_string(), err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| Error::io(entry.path().display().to_string(), err))?;
            if file_type.is_dir() != want_dirs {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn entries(&self, what: &'static str, dir: &Path) -> Result<Vec<Entry>> {
        Ok(self
            .list(what, dir, true)?
            .into_iter()
            .map(|id| Entry { id, label: None })
            .collect())
    }
}

impl ArchiveConnection for DirectoryArchive {
    fn experiments(&self, project: &str, subject: &str) -> Result<Vec<Entry>> {
        let dir = self.root.join(project).join(subject);
        self.entries("experiment", &dir)
    }

    fn scans(&self, project: &str, subject: &str, experiment: &str) -> Result<Vec<Entry>> {
        let dir = self.root.join(project).join(subject).join(experiment);
        self.entries("scan", &dir)
    }

    fn files(
        &self,
        project: &str,
        subject: &str,
        experiment: &str,
        scan: &str,
        resource: &str,
    ) -> Result<Vec<ArchiveFile>> {
        let dir = self
            .root
            .join(project)
            .join(subject)
            .join(experiment)
            .join(scan)
            .join(resource);

        Ok(self
            .list("resource", &dir, false)?
            .into_iter()
            .map(|name| ArchiveFile {
                uri: dir.join(&name).display().to_string(),
                name,
            })
            .collect())
    }

    fn open(&self, file: &ArchiveFile) -> Result<Box<dyn Read + '_>> {
        let handle = File::open(&file.uri).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::not_found("file", file.uri.clone()),
            _ => Error::io(file.uri.clone(), err),
        })?;
        Ok(Box::new(BufReader::new(handle)))
    }
}

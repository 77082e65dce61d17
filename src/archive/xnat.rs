use std::io::{Cursor, Read};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ArchiveConnection, ArchiveFile, Entry};
use crate::error::{Error, Result};
use crate::utils::truncate;

const MAX_BODY_EXCERPT: usize = 200;

/// XNAT REST client (`/data/projects/...`).
pub struct XnatConnection {
    base: Url,
    client: Client,
    credentials: Option<(String, Option<String>)>,
}

#[derive(Deserialize)]
struct Listing<T> {
    #[serde(rename = "ResultSet")]
    result_set: ResultSet<T>,
}

#[derive(Deserialize)]
struct ResultSet<T> {
    #[serde(rename = "Result", default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Deserialize)]
struct EntryRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
struct FileRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "URI")]
    uri: String,
}

impl XnatConnection {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|err| Error::Config(format!("archive URL `{base_url}`: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "archive URL `{base_url}` cannot be used as a base"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::transport(base_url, err))?;

        Ok(Self {
            base,
            client,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((user.into(), password));
        self
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("data").extend(segments);
        }
        url.set_query(Some("format=json"));
        url
    }

    fn get(&self, url: Url, what: &'static str) -> Result<Response> {
        log::debug!("GET {url}");
        let mut request = self.client.get(url.clone());
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request
            .send()
            .map_err(|err| Error::transport(url.as_str(), err))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(Error::not_found(what, url.path().to_string())),
            status => {
                let body = response.text().unwrap_or_default();
                Err(Error::invalid_response(
                    url.as_str(),
                    format!("HTTP {status}: {}", truncate(body, MAX_BODY_EXCERPT)),
                ))
            }
        }
    }

    fn list<T: DeserializeOwned>(&self, segments: &[&str], what: &'static str) -> Result<Vec<T>> {
        let url = self.url(segments);
        let body = self
            .get(url.clone(), what)?
            .text()
            .map_err(|err| Error::transport(url.as_str(), err))?;

        let listing: Listing<T> = serde_json::from_str(&body).map_err(|err| {
            Error::invalid_response(url.as_str(), format!("unexpected {what} listing ({err})"))
        })?;
        Ok(listing.result_set.result)
    }

    fn file_url(&self, uri: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(uri) {
            return Ok(absolute);
        }
        let joined = format!("{}{uri}", self.base.as_str().trim_end_matches('/'));
        Url::parse(&joined).map_err(|err| {
            Error::invalid_response(self.base.as_str(), format!("file URI `{uri}`: {err}"))
        })
    }
}

impl ArchiveConnection for XnatConnection {
    fn experiments(&self, project: &str, subject: &str) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = self.list(
            &["projects", project, "subjects", subject, "experiments"],
            "experiment",
        )?;
        Ok(rows.into_iter().map(EntryRow::into_entry).collect())
    }

    fn scans(&self, project: &str, subject: &str, experiment: &str) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = self.list(
            &[
                "projects",
                project,
                "subjects",
                subject,
                "experiments",
                experiment,
                "scans",
            ],
            "scan",
        )?;
        Ok(rows.into_iter().map(EntryRow::into_entry).collect())
    }

    fn files(
        &self,
        project: &str,
        subject: &str,
        experiment: &str,
        scan: &str,
        resource: &str,
    ) -> Result<Vec<ArchiveFile>> {
        let rows: Vec<FileRow> = self.list(
            &[
                "projects",
                project,
                "subjects",
                subject,
                "experiments",
                experiment,
                "scans",
                scan,
                "resources",
                resource,
                "files",
            ],
            "resource",
        )?;

        rows.into_iter()
            .map(|row| {
                let url = self.file_url(&row.uri)?;
                Ok(ArchiveFile {
                    name: row.name,
                    uri: url.into(),
                })
            })
            .collect()
    }

    fn open(&self, file: &ArchiveFile) -> Result<Box<dyn Read + '_>> {
        let url = Url::parse(&file.uri)
            .map_err(|err| Error::Config(format!("file URI `{}`: {err}", file.uri)))?;
        let response = self.get(url.clone(), "file")?;
        // Read in full here: failures while streaming the body are transport errors.
        let bytes = response
            .bytes()
            .map_err(|err| Error::transport(url.as_str(), err))?;
        log::debug!("Downloaded {} bytes from {url}", bytes.len());
        Ok(Box::new(Cursor::new(bytes)))
    }
}

impl EntryRow {
    fn into_entry(self) -> Entry {
        Entry {
            id: self.id,
            label: self.label.filter(|label| !label.is_empty()),
        }
    }
}

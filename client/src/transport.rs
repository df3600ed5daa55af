//! Executes the plain-data requests built by `ApiClient`.
//!
//! # Design
//! `Transport` is the single I/O seam. `UreqTransport` is the blocking
//! implementation used in production; tests substitute recorders. Multipart
//! bodies name their upload by path. The transport opens that file for the
//! length of one request and streams it between the form's head and tail, so
//! the archive is never held in memory and the handle is closed on every exit
//! path.

use std::fs::File;
use std::io::{self, Cursor, Read};

use kerbalstuff_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, MultipartForm, Result};
use tracing::debug;

use crate::config::ClientConfig;

/// Performs one HTTP round-trip.
///
/// Non-2xx statuses are returned as data; only failures to obtain a response
/// at all are errors.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.path).header("User-Agent", self.user_agent.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let empty = MultipartForm::default();
                let (content_type, mut body) = encode_form(request.body.as_ref().unwrap_or(&empty))?;
                let mut builder = self.agent.post(&request.path).header("User-Agent", self.user_agent.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder
                    .content_type(content_type.as_str())
                    .send(ureq::SendBody::from_reader(&mut body))
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, headers, body })
    }
}

/// Open the upload (if any) and return the content type plus a reader that
/// yields the encoded form.
///
/// Only the form's text fields and part headers are buffered; the file is
/// read as the body is consumed and closed when the reader is dropped.
pub(crate) fn encode_form(form: &MultipartForm) -> Result<(String, Box<dyn Read>)> {
    let boundary = MultipartForm::new_boundary();
    let file: Box<dyn Read> = match &form.file {
        Some(part) => {
            let file = File::open(&part.path)?;
            debug!(path = %part.path.display(), bytes = file.metadata()?.len(), "streaming upload");
            Box::new(file)
        }
        None => Box::new(io::empty()),
    };
    let body: Box<dyn Read> = Box::new(
        Cursor::new(form.head(&boundary))
            .chain(file)
            .chain(Cursor::new(form.tail(&boundary))),
    );
    Ok((MultipartForm::content_type(&boundary), body))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use super::*;

    fn read_all(mut body: Box<dyn Read>) -> String {
        let mut out = String::new();
        body.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn encode_form_frames_upload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK-archive").unwrap();
        let form = MultipartForm::new()
            .text("version", "1.0")
            .file("zipball", file.path(), "application/zip");

        let (content_type, body) = encode_form(&form).unwrap();
        let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap().to_string();
        let body = read_all(body);
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("\r\n\r\nPK-archive\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn encode_form_reads_the_file_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK-before").unwrap();
        let form = MultipartForm::new().file("zipball", file.path(), "application/zip");

        let (_, body) = encode_form(&form).unwrap();
        std::fs::write(file.path(), b"PK-after!").unwrap();

        let body = read_all(body);
        assert!(body.contains("PK-after!"), "{body}");
        assert!(!body.contains("PK-before"));
    }

    #[test]
    fn encode_form_streams_large_archives() {
        const SIZE: u64 = 16 * 1024 * 1024;
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(SIZE).unwrap();
        let form = MultipartForm::new().text("version", "1.0").file("zipball", file.path(), "application/zip");

        let (content_type, mut body) = encode_form(&form).unwrap();
        let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap();
        let framing = (form.head(boundary).len() + form.tail(boundary).len()) as u64;

        let streamed = io::copy(&mut body, &mut io::sink()).unwrap();
        assert_eq!(streamed, SIZE + framing);
    }

    #[test]
    fn encode_form_missing_upload_is_io_error() {
        let form = MultipartForm::new().file("zipball", Path::new("/definitely/not/here.zip"), "application/zip");
        assert!(matches!(encode_form(&form), Err(ApiError::Io(_))));
    }
}

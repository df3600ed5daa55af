//! `multipart/form-data` bodies for the login and publish endpoints.
//!
//! A form carries named text fields plus at most one file part. The file part
//! only records the path. The transport writes [`MultipartForm::head`], then
//! streams the file, then [`MultipartForm::tail`].

use std::path::{Path, PathBuf};

/// Content type declared for uploaded mod archives.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// A file field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub path: PathBuf,
    pub content_type: String,
}

impl FilePart {
    /// File name sent in the part's `Content-Disposition`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.zip".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn file(mut self, name: &str, path: &Path, content_type: &str) -> Self {
        self.file = Some(FilePart {
            name: name.to_string(),
            path: path.to_path_buf(),
            content_type: content_type.to_string(),
        });
        self
    }

    /// Value of text field `name`, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A fresh boundary that cannot collide with typical archive contents.
    pub fn new_boundary() -> String {
        format!("----kerbalstuff-{}", uuid::Uuid::new_v4().simple())
    }

    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }

    /// Everything before the file contents: the text fields and, when the
    /// form declares a file, that part's headers.
    pub fn head(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in &self.fields {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            out.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape(name)).as_bytes(),
            );
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        if let Some(part) = &self.file {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            out.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape(&part.name),
                    escape(&part.file_name())
                )
                .as_bytes(),
            );
            out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        }
        out
    }

    /// Everything after the file contents, including the closing boundary.
    pub fn tail(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        if self.file.is_some() {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }

    /// The whole body with `file_contents` in place. Transports stream the
    /// file between [`head`](Self::head) and [`tail`](Self::tail) instead.
    pub fn encode(&self, boundary: &str, file_contents: &[u8]) -> Vec<u8> {
        let mut out = self.head(boundary);
        if self.file.is_some() {
            out.extend_from_slice(file_contents);
        }
        out.extend(self.tail(boundary));
        out
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_text_fields_only() {
        let form = MultipartForm::new().text("username", "jeb").text("password", "hunter2");
        let body = String::from_utf8(form.encode("XYZ", b"ignored")).unwrap();
        assert_eq!(
            body,
            "--XYZ\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\njeb\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\nhunter2\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn encode_includes_file_part_with_content_type() {
        let form = MultipartForm::new()
            .text("version", "1.0")
            .file("zipball", Path::new("/tmp/builds/MechJeb.zip"), ZIP_CONTENT_TYPE);
        let body = String::from_utf8(form.encode("B", b"PK\x03\x04")).unwrap();
        assert!(body.contains(
            "Content-Disposition: form-data; name=\"zipball\"; filename=\"MechJeb.zip\"\r\n\
             Content-Type: application/zip\r\n\r\nPK\x03\x04\r\n"
        ));
        assert!(body.ends_with("--B--\r\n"));
    }

    #[test]
    fn head_and_tail_frame_the_file() {
        let form = MultipartForm::new().file("zipball", Path::new("a.zip"), ZIP_CONTENT_TYPE);
        let head = String::from_utf8(form.head("B")).unwrap();
        assert!(head.ends_with("Content-Type: application/zip\r\n\r\n"));
        assert_eq!(form.tail("B"), b"\r\n--B--\r\n");
    }

    #[test]
    fn tail_without_file_is_only_the_closing_boundary() {
        let form = MultipartForm::new().text("username", "jeb");
        assert_eq!(form.tail("B"), b"--B--\r\n");
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let form = MultipartForm::new().file("zipball", Path::new("we\"ird.zip"), ZIP_CONTENT_TYPE);
        let body = String::from_utf8(form.encode("B", b"")).unwrap();
        assert!(body.contains("filename=\"we\\\"ird.zip\""));
    }

    #[test]
    fn boundaries_are_unique() {
        assert_ne!(MultipartForm::new_boundary(), MultipartForm::new_boundary());
    }
}

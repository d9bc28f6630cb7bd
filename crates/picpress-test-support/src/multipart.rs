//! Minimal `multipart/form-data` body builder for router tests.

const BOUNDARY: &str = "picpress-test-boundary-7f3a";

/// Accumulates form parts and renders the request body.
#[derive(Debug, Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    /// Start an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file part.
    #[must_use]
    pub fn file(mut self, field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Append a plain text part.
    #[must_use]
    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    /// Close the form; returns the `Content-Type` header value and the body.
    #[must_use]
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_framed_by_the_boundary() {
        let (content_type, body) = MultipartBody::new()
            .text("note", "hi")
            .file("image", "a.png", "image/png", b"PNG")
            .finish();
        let body = String::from_utf8_lossy(&body);
        assert!(content_type.ends_with(BOUNDARY));
        assert_eq!(body.matches(&format!("--{BOUNDARY}\r\n")).count(), 2);
        assert!(body.contains("filename=\"a.png\""));
        assert!(body.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }
}

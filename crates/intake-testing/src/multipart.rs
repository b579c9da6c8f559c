//! `multipart/form-data` body builder for upload endpoints.

use bytes::{BufMut, Bytes, BytesMut};

const BOUNDARY: &str = "intake-test-boundary-7MA4YWxkTrZu0gW";

/// Accumulates text fields and file parts into a single request body.
#[derive(Default)]
pub struct MultipartBody {
    buf: BytesMut,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for the request's `content-type` header.
    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.put_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        self.buf.put_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.buf.put_slice(value.as_bytes());
        self.buf.put_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.put_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        self.buf.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        self.buf
            .put_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.buf.put_slice(data);
        self.buf.put_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Bytes {
        self.buf.put_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf.freeze()
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::trace;
use serde::Serialize;

use super::{HttpHeader, HttpResponse, HttpStatusCode};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub struct HttpResponseBuilder {
    response: HttpResponse,
}

impl Default for HttpResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponseBuilder {
    pub fn new() -> Self {
        HttpResponseBuilder {
            response: HttpResponse::new(),
        }
        .set_date(Utc::now())
        .set_header("Connection", "close")
    }

    pub fn build(self) -> HttpResponse {
        trace!("{:?}", self.response);
        self.response
    }

    pub fn set_status(mut self, status: HttpStatusCode) -> Self {
        self.response.status = status;
        self
    }

    pub fn set_header(mut self, key: &str, value: &str) -> Self {
        self.response
            .headers
            .insert(key.to_owned(), HttpHeader::new(key, value));
        self
    }

    pub fn set_date(self, date: DateTime<Utc>) -> Self {
        let date = date.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        self.set_header("Date", &date)
    }

    pub fn set_content_type(self, content_type: &str) -> Self {
        self.set_header("Content-Type", content_type)
    }

    pub fn set_json_body<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let body = serde_json::to_string_pretty(body)?;
        let length = body.len().to_string();

        self.response.body = body.into_bytes();
        Ok(self
            .set_content_type(JSON_CONTENT_TYPE)
            .set_header("Content-Length", &length))
    }

    /// Plain message body. The content type stays whatever was set before.
    pub fn set_text_body(mut self, body: &str) -> Self {
        let length = body.len().to_string();

        self.response.body = body.as_bytes().to_vec();
        self.set_header("Content-Length", &length)
    }
}

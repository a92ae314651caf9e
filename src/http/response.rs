use std::collections::BTreeMap;

use anyhow::Result;
use log::trace;

use super::{HttpHeader, HttpStatusCode, HttpVersion};

#[derive(Debug)]
pub struct HttpResponse {
    pub version: HttpVersion,
    pub status: HttpStatusCode,
    pub headers: BTreeMap<String, HttpHeader>,
    pub body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponse {
    pub fn new() -> Self {
        HttpResponse {
            version: HttpVersion::HTTP1_1,
            status: HttpStatusCode::OK,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn start_line(&self) -> String {
        format!("{} {}", self.version, self.status)
    }

    pub fn header(&self, name: &str) -> Option<&HttpHeader> {
        self.headers.get(name)
    }

    pub fn get_str_body(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut response = format!("{}\r\n", self.start_line());
        trace!("{:?}", response);

        let allows_body = self.status.allows_body();
        for header in self.headers.values() {
            if !allows_body && header.name == "Content-Length" {
                continue;
            }
            response.push_str(&format!("{}: {}\r\n", header.name, header.value));
        }

        response.push_str("\r\n");

        let mut bytes = response.into_bytes();
        if allows_body {
            bytes.extend_from_slice(&self.body);
        }

        Ok(bytes)
    }
}

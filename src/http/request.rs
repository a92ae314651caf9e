use anyhow::{bail, Context, Result};
use std::{
    collections::HashMap,
    net::{IpAddr, TcpStream},
    str::FromStr,
};

use super::{HttpHeader, HttpMethod, HttpRequestRaw, HttpVersion};

#[derive(Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub resource_path: String,
    pub version: HttpVersion,

    /// Path part of the resource, without the query string.
    pub url: String,
    /// Raw query string. `Some("")` for a bare trailing `?`.
    pub query: Option<String>,

    pub headers: HashMap<String, HttpHeader>,
    pub body: Vec<u8>,

    pub peer_ip: IpAddr,
}

impl HttpRequest {
    pub fn from_raw_request(raw_request: HttpRequestRaw) -> Result<HttpRequest> {
        let (verb, resource_path, version) = Self::parse_request_line(&raw_request.request_line)?;

        let (url, query) = match resource_path.split_once('?') {
            Some((url, query)) => (url.to_owned(), Some(query.to_owned())),
            None => (resource_path.clone(), None),
        };

        let headers: HashMap<String, HttpHeader> = raw_request
            .headers
            .into_iter()
            .map(|header| (HttpHeader::key(&header.name), header))
            .collect();

        Ok(HttpRequest {
            method: verb,
            resource_path,
            version,
            url,
            query,
            headers,
            body: raw_request.body,
            peer_ip: raw_request.peer_ip,
        })
    }

    pub fn from_tcp(stream: &TcpStream) -> Result<HttpRequest> {
        let raw_request = HttpRequestRaw::from_tcp(stream)?;
        Self::from_raw_request(raw_request)
    }

    pub fn header(&self, name: &str) -> Option<&HttpHeader> {
        self.headers.get(&HttpHeader::key(name))
    }

    pub fn get_str_body(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    pub fn parse_request_line(start_line: &str) -> Result<(HttpMethod, String, HttpVersion)> {
        let mut parts = start_line.split(' ');

        let verb = parts
            .next()
            .context("start line should have HTTP verb")?
            .trim();

        let verb = HttpMethod::from_str(verb)?;

        let resource_path = parts
            .next()
            .context("start line should have resource path")?
            .trim()
            .to_owned();

        if !resource_path.starts_with('/') {
            bail!("only origin-form request targets are supported: {resource_path}");
        }

        let version = if let Some(version) = parts.next() {
            HttpVersion::from_str(version.trim())?
        } else {
            bail!("HTTP/0.9 requests are not supported");
        };

        Ok((verb, resource_path, version))
    }
}

use anyhow::{bail, Context, Result};
use std::{
    io::{BufRead, BufReader, Read},
    net::{IpAddr, Ipv4Addr, TcpStream},
};

use super::HttpHeader;

/// Requests larger than this are refused before the body is allocated.
const MAX_BODY_LEN: usize = 1024 * 1024;
/// Upper bound on the request line plus all header lines.
const MAX_HEAD_LEN: usize = 8 * 1024;

pub struct HttpRequestRaw {
    pub request_line: String,
    pub headers: Vec<HttpHeader>,
    pub body: Vec<u8>,
    pub peer_ip: IpAddr,
}

impl HttpRequestRaw {
    pub fn new(request_line: &str, headers: Vec<HttpHeader>, body: &[u8]) -> Self {
        HttpRequestRaw {
            request_line: request_line.to_owned(),
            headers,
            body: body.to_vec(),
            peer_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    pub fn from_tcp(stream: &TcpStream) -> Result<HttpRequestRaw> {
        let peer_ip = stream.peer_addr()?.ip();
        let mut raw_request = Self::from_reader(stream)?;
        raw_request.peer_ip = peer_ip;
        Ok(raw_request)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<HttpRequestRaw> {
        let mut buf_reader = BufReader::new(reader);

        let mut request_line = String::new();
        let mut headers = Vec::new();
        let mut body = Vec::new();

        let mut head_budget = MAX_HEAD_LEN;

        read_head_line(&mut buf_reader, &mut request_line, &mut head_budget)?;
        if request_line.trim().is_empty() {
            bail!("connection closed before a request line was received");
        }

        let mut line = String::new();
        while read_head_line(&mut buf_reader, &mut line, &mut head_budget)? > 0 {
            if line.trim().is_empty() {
                break;
            }

            if let Some(header) = HttpHeader::from_line(&line) {
                headers.push(header);
            }

            line.clear();
        }

        if let Some(content_len) = headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case("Content-Length"))
        {
            let content_len: usize = content_len
                .value
                .parse()
                .context("Content-Length should be a non-negative integer")?;
            if content_len > MAX_BODY_LEN {
                bail!("request body of {content_len} bytes exceeds the {MAX_BODY_LEN} byte limit");
            }
            if content_len > 0 {
                body = vec![0; content_len];
                buf_reader.read_exact(&mut body)?;
            }
        }

        Ok(HttpRequestRaw {
            request_line: request_line.trim_end().to_owned(),
            headers,
            body,
            peer_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        })
    }
}

/// Reads one line of the request head, charging it against `budget`.
fn read_head_line<R: BufRead>(
    reader: &mut R,
    line: &mut String,
    budget: &mut usize,
) -> Result<usize> {
    if *budget == 0 {
        bail!("request head exceeds {MAX_HEAD_LEN} bytes");
    }

    let read = reader.by_ref().take(*budget as u64).read_line(line)?;
    if read == *budget && !line.ends_with('\n') {
        bail!("request head exceeds {MAX_HEAD_LEN} bytes");
    }

    *budget -= read;
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_body_by_content_length() {
        let wire = "POST /movies HTTP/1.1\r\n\
content-length: 4\r\n\
Content-Type: application/json\r\n\r\n{}\r\ntrailing";

        let raw = HttpRequestRaw::from_reader(wire.as_bytes()).unwrap();
        assert_eq!("POST /movies HTTP/1.1", raw.request_line);
        assert_eq!(2, raw.headers.len());
        assert_eq!(b"{}\r\n".to_vec(), raw.body);
    }

    #[test]
    fn test_missing_content_length_means_no_body() {
        let wire = "GET /movies HTTP/1.1\r\nHost: localhost\r\n\r\n";

        let raw = HttpRequestRaw::from_reader(wire.as_bytes()).unwrap();
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_bad_content_length() {
        let wire = "POST /movies HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
        assert!(HttpRequestRaw::from_reader(wire.as_bytes()).is_err());
    }

    #[test]
    fn test_endless_request_line() {
        let wire = "GET /".to_owned() + &"a".repeat(MAX_HEAD_LEN * 4);

        let error = HttpRequestRaw::from_reader(wire.as_bytes()).err().unwrap();
        assert!(error.to_string().contains("request head exceeds"), "{error}");
    }

    #[test]
    fn test_too_many_header_bytes() {
        let header = format!("X-Filler: {}\r\n", "b".repeat(100));
        let wire = format!("GET /movies HTTP/1.1\r\n{}\r\n", header.repeat(100));

        assert!(HttpRequestRaw::from_reader(wire.as_bytes()).is_err());
    }

    #[test]
    fn test_head_just_under_limit() {
        let request_line = "GET /movies HTTP/1.1\r\n";
        let filler_len = MAX_HEAD_LEN - request_line.len() - "X: \r\n".len() - "\r\n".len();
        let wire = format!("{request_line}X: {}\r\n\r\n", "c".repeat(filler_len));

        let raw = HttpRequestRaw::from_reader(wire.as_bytes()).unwrap();
        assert_eq!(1, raw.headers.len());
    }

    #[test]
    fn test_empty_connection() {
        assert!(HttpRequestRaw::from_reader("".as_bytes()).is_err());
    }
}

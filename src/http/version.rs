use anyhow::anyhow;
use std::{fmt::Display, str::FromStr};

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum HttpVersion {
    HTTP1_0,
    HTTP1_1,
}

impl FromStr for HttpVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "HTTP/1.0" => HttpVersion::HTTP1_0,
            "HTTP/1.1" => HttpVersion::HTTP1_1,
            value => return Err(anyhow!("unsupported HTTP version: {}", value)),
        })
    }
}

impl Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpVersion::HTTP1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::HTTP1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: &str, value: &str) -> Self {
        HttpHeader {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }

    /// Parses a `Name: value` header line. Returns `None` when there is no colon.
    pub fn from_line(line: &str) -> Option<Self> {
        let (name, value) = line.trim_end().split_once(':')?;
        Some(HttpHeader::new(name.trim(), value.trim()))
    }

    /// Header names are case-insensitive, so lookups go through this key.
    pub fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }
}

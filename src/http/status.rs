use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HttpStatusCode {
    OK,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    UnsupportedMediaType,
    UnprocessableEntity,
    InternalServerError,
}

impl HttpStatusCode {
    pub fn code(&self) -> u16 {
        match self {
            HttpStatusCode::OK => 200,
            HttpStatusCode::Created => 201,
            HttpStatusCode::NoContent => 204,
            HttpStatusCode::BadRequest => 400,
            HttpStatusCode::NotFound => 404,
            HttpStatusCode::MethodNotAllowed => 405,
            HttpStatusCode::UnsupportedMediaType => 415,
            HttpStatusCode::UnprocessableEntity => 422,
            HttpStatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatusCode::OK => "OK",
            HttpStatusCode::Created => "Created",
            HttpStatusCode::NoContent => "No Content",
            HttpStatusCode::BadRequest => "Bad Request",
            HttpStatusCode::NotFound => "Not Found",
            HttpStatusCode::MethodNotAllowed => "Method Not Allowed",
            HttpStatusCode::UnsupportedMediaType => "Unsupported Media Type",
            HttpStatusCode::UnprocessableEntity => "Unprocessable Entity",
            HttpStatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// RFC 9110: a 204 response is terminated by the end of its header section.
    pub fn allows_body(&self) -> bool {
        *self != HttpStatusCode::NoContent
    }
}

impl Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

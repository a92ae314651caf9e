pub mod header;
pub mod method;
pub mod request;
pub mod request_raw;
pub mod response;
pub mod response_builder;
pub mod status;
pub mod version;

pub use self::header::HttpHeader;
pub use self::method::HttpMethod;
pub use self::request::HttpRequest;
pub use self::request_raw::HttpRequestRaw;
pub use self::response::HttpResponse;
pub use self::response_builder::{HttpResponseBuilder, JSON_CONTENT_TYPE};
pub use self::status::HttpStatusCode;
pub use self::version::HttpVersion;

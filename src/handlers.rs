use chrono::{Datelike, Local};
use log::{debug, info};
use serde_json::Value;

use crate::{
    error::ApiError,
    http::{HttpRequest, HttpResponse, HttpResponseBuilder, HttpStatusCode, JSON_CONTENT_TYPE},
    movie::{self, MovieId, Rejection},
    store::MovieStore,
};

pub type HandlerResult = Result<HttpResponse, ApiError>;

pub fn list_movies(store: &MovieStore) -> HandlerResult {
    json_response(HttpStatusCode::OK, &store.list_all())
}

pub fn create_movie(store: &MovieStore, request: &HttpRequest) -> HandlerResult {
    create_movie_in_year(store, request, Local::now().year() as i64)
}

pub fn create_movie_in_year(
    store: &MovieStore,
    request: &HttpRequest,
    current_year: i64,
) -> HandlerResult {
    let payload: Value = request
        .get_str_body()
        .ok()
        .and_then(|body| serde_json::from_str(&body).ok())
        .ok_or_else(|| {
            ApiError::UnsupportedMediaType("Failed to parse request body as JSON".to_owned())
        })?;

    let is_json = request
        .header("Content-Type")
        .is_some_and(|header| header.value.contains("application/json"));

    let mut payload = match payload {
        Value::Object(map) if is_json => map,
        _ => {
            return Err(ApiError::UnsupportedMediaType(
                "Send the request body as a JSON object with Content-Type: application/json"
                    .to_owned(),
            ))
        }
    };

    let new_movie = movie::validate(&payload, current_year).map_err(|rejection| {
        let (message, details) = match rejection {
            Rejection::MissingFields(details) => ("Movie fields are missing", details),
            Rejection::InvalidFields(details) => ("Movie fields are invalid", details),
        };
        debug!("rejected movie payload: {details:?}");
        ApiError::Validation {
            message: message.to_owned(),
            details,
        }
    })?;

    let id = store.add(new_movie);
    info!("created movie {id}");

    payload.insert("id".to_owned(), Value::from(id));
    json_response(HttpStatusCode::Created, &payload)
}

pub fn get_movie_by_id(store: &MovieStore, id_segment: &str) -> HandlerResult {
    let id = parse_id(id_segment)?;
    let movie = store
        .get_by_id(id)
        .ok_or_else(|| ApiError::NotFound("Movie not found".to_owned()))?;

    json_response(HttpStatusCode::OK, &movie)
}

pub fn delete_movie_by_id(store: &MovieStore, id_segment: &str) -> HandlerResult {
    let id = parse_id(id_segment)?;
    if !store.delete_by_id(id) {
        return Err(ApiError::NotFound("Movie not found".to_owned()));
    }
    info!("deleted movie {id}");

    Ok(HttpResponseBuilder::new()
        .set_status(HttpStatusCode::NoContent)
        .set_content_type(JSON_CONTENT_TYPE)
        .set_text_body("Movie deleted successfully")
        .build())
}

/// Expects the whole query string to be `year=<int>`. Only the token after
/// the first `=` is looked at.
pub fn list_movies_by_year(store: &MovieStore, query: &str) -> HandlerResult {
    let year = query
        .split('=')
        .nth(1)
        .and_then(|year| year.parse::<i64>().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid query parameter 'year'".to_owned()))?;

    json_response(HttpStatusCode::OK, &store.list_by_year(year))
}

fn parse_id(id_segment: &str) -> Result<MovieId, ApiError> {
    id_segment
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid movie id".to_owned()))
}

fn json_response<T: serde::Serialize>(status: HttpStatusCode, body: &T) -> HandlerResult {
    Ok(HttpResponseBuilder::new()
        .set_status(status)
        .set_json_body(body)?
        .build())
}

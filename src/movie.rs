use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type MovieId = i64;

/// Oldest year a film can have, the year of the Roundhay Garden Scene.
pub const EARLIEST_YEAR: i64 = 1888;
pub const MAX_TITLE_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year: i64,
}

/// A movie that passed validation and has not been given an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub year: i64,
}

impl NewMovie {
    pub fn new(title: &str, year: i64) -> Self {
        NewMovie {
            title: title.to_owned(),
            year,
        }
    }

    pub fn with_id(self, id: MovieId) -> Movie {
        Movie {
            id,
            title: self.title,
            year: self.year,
        }
    }
}

/// Why a creation payload was turned down. Both variants carry one
/// human-readable line per problem.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingFields(Vec<String>),
    InvalidFields(Vec<String>),
}

/// Checks a submitted JSON object against the movie rules.
///
/// Missing keys are reported on their own, before any value is looked at.
/// Otherwise every broken rule adds one line, so a payload with a bad year
/// and an empty title yields two details.
pub fn validate(payload: &Map<String, Value>, current_year: i64) -> Result<NewMovie, Rejection> {
    let missing: Vec<String> = ["title", "year"]
        .iter()
        .filter(|field| !payload.contains_key(**field))
        .map(|field| format!("missing field: {field}"))
        .collect();

    if !missing.is_empty() {
        return Err(Rejection::MissingFields(missing));
    }

    let mut details = Vec::new();
    let latest_year = current_year + 1;

    let year = payload["year"].as_i64();
    match year {
        Some(year) if (EARLIEST_YEAR..=latest_year).contains(&year) => {}
        Some(_) => details.push(format!(
            "year must be between {EARLIEST_YEAR} and {latest_year}"
        )),
        None => details.push("year must be an integer".to_owned()),
    }

    let title = payload["title"].as_str();
    match title {
        Some("") => details.push("title must not be empty".to_owned()),
        Some(title) if title.chars().count() > MAX_TITLE_LEN => details.push(format!(
            "title is too long (at most {MAX_TITLE_LEN} characters)"
        )),
        Some(_) => {}
        None => details.push("title must be a string".to_owned()),
    }

    match (title, year) {
        (Some(title), Some(year)) if details.is_empty() => Ok(NewMovie::new(title, year)),
        _ => Err(Rejection::InvalidFields(details)),
    }
}

/// Catalog loaded at startup.
pub fn seed_catalog() -> Vec<NewMovie> {
    vec![
        NewMovie::new("Avatar", 2009),
        NewMovie::new("Watchmen", 2009),
        NewMovie::new("The Gentlemen", 2019),
        NewMovie::new("Gladiator", 2000),
        NewMovie::new("2012", 2009),
    ]
}

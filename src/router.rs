use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use std::{str::FromStr, sync::Arc};

use crate::{
    error::ApiError,
    handlers::{self, HandlerResult},
    http::{HttpMethod, HttpRequest, HttpResponse},
    store::MovieStore,
};

pub const MOVIES_PATH: &str = "/movies";

/// Operations a request under [`MOVIES_PATH`] can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListMovies,
    CreateMovie,
    GetMovieById,
    DeleteMovieById,
    ListMoviesByYear,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape {
    /// `/movies`
    Collection,
    /// `/movies/{id}`
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRule {
    Absent,
    Present,
    Any,
}

/// One row of the routing table, written as `VERB /movies[/{id}][?query]`.
///
/// The query suffix is `?*` when the query string does not matter and
/// `?{query}` when one must be present. No suffix means there must be none.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub shape: PathShape,
    pub query: QueryRule,
}

impl Route {
    pub fn matches(&self, method: HttpMethod, shape: PathShape, has_query: bool) -> bool {
        let query_ok = match self.query {
            QueryRule::Absent => !has_query,
            QueryRule::Present => has_query,
            QueryRule::Any => true,
        };
        self.method == method && self.shape == shape && query_ok
    }
}

impl FromStr for Route {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (verb, target) = s.split_once(' ').context("route should have: VERB PATH")?;
        let method = HttpMethod::from_str(verb)?;

        let (path, query) = match target.split_once('?') {
            None => (target, QueryRule::Absent),
            Some((path, "*")) => (path, QueryRule::Any),
            Some((path, "{query}")) => (path, QueryRule::Present),
            Some((_, other)) => bail!("unsupported query pattern in route: {other}"),
        };

        let item_path = format!("{MOVIES_PATH}/{{id}}");
        let shape = if path == MOVIES_PATH {
            PathShape::Collection
        } else if path == item_path {
            PathShape::Item
        } else {
            bail!("route path must be {MOVIES_PATH} or {item_path}, got {path}");
        };

        Ok(Route {
            method,
            shape,
            query,
        })
    }
}

/// Where a request path points relative to the movie resource.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Collection,
    Item(&'a str),
    /// Below `/movies` but not a shape any route knows.
    Unrouted,
    Outside,
}

impl<'a> Target<'a> {
    fn parse(url: &'a str) -> Self {
        let mut segments: Vec<&str> = url.split('/').collect();
        while segments.last() == Some(&"") {
            segments.pop();
        }

        let base = MOVIES_PATH.trim_start_matches('/');
        match segments.as_slice() {
            ["", name] if *name == base => Target::Collection,
            ["", name, id] if *name == base => Target::Item(*id),
            ["", name, ..] if *name == base => Target::Unrouted,
            _ => Target::Outside,
        }
    }

    fn shape(&self) -> Option<PathShape> {
        match self {
            Target::Collection => Some(PathShape::Collection),
            Target::Item(_) => Some(PathShape::Item),
            Target::Unrouted | Target::Outside => None,
        }
    }
}

/// Ordered routing table over a shared [`MovieStore`]. The first route that
/// matches wins.
#[derive(Debug)]
pub struct Router {
    store: Arc<MovieStore>,
    routes: Vec<(Route, Endpoint)>,
}

impl Router {
    pub fn new(store: Arc<MovieStore>) -> Self {
        Router {
            store,
            routes: Vec::new(),
        }
    }

    /// The movie API. Order matters: a POST with a query string is still a
    /// create, and a GET with one is only a year filter.
    pub fn movies(store: Arc<MovieStore>) -> Result<Self> {
        Router::new(store)
            .route("GET /movies", Endpoint::ListMovies)?
            .route("POST /movies?*", Endpoint::CreateMovie)?
            .route("GET /movies/{id}?*", Endpoint::GetMovieById)?
            .route("DELETE /movies/{id}?*", Endpoint::DeleteMovieById)?
            .route("GET /movies?{query}", Endpoint::ListMoviesByYear)
    }

    pub fn route(mut self, definition: &str, endpoint: Endpoint) -> Result<Self> {
        let route = Route::from_str(definition)?;

        if self.routes.iter().any(|(existing, _)| *existing == route) {
            return Err(anyhow!(
                "cannot register route {:?} because a similar route already exists",
                route
            ));
        }

        self.routes.push((route, endpoint));
        Ok(self)
    }

    pub fn store(&self) -> &MovieStore {
        &self.store
    }

    /// Resolves a request to an endpoint. `None` when the path is not under
    /// the movie resource at all.
    pub fn classify(&self, request: &HttpRequest) -> Option<Endpoint> {
        self.resolve(request).map(|(endpoint, _)| endpoint)
    }

    fn resolve<'r>(&self, request: &'r HttpRequest) -> Option<(Endpoint, Target<'r>)> {
        let target = Target::parse(&request.url);
        if target == Target::Outside {
            return None;
        }

        let endpoint = target
            .shape()
            .and_then(|shape| {
                self.routes
                    .iter()
                    .find(|(route, _)| route.matches(request.method, shape, request.query.is_some()))
                    .map(|(_, endpoint)| *endpoint)
            })
            .unwrap_or(Endpoint::Unknown);

        Some((endpoint, target))
    }

    pub fn handle_request(&self, request: &HttpRequest) -> HttpResponse {
        let mut response = match self.dispatch(request) {
            Ok(response) => response,
            Err(error) => {
                debug!("{} {} failed: {error}", request.method, request.resource_path);
                error.into_response()
            }
        };
        response.version = request.version;
        response
    }

    fn dispatch(&self, request: &HttpRequest) -> HandlerResult {
        let Some((endpoint, target)) = self.resolve(request) else {
            debug!("route: {} {} -> outside {MOVIES_PATH}", request.method, request.url);
            return Err(ApiError::NotFound("Resource not found".to_owned()));
        };
        debug!("route: {} {} -> {endpoint:?}", request.method, request.resource_path);

        let store = self.store();
        match (endpoint, target, request.query.as_deref()) {
            (Endpoint::Unknown, _, _) => Err(ApiError::MethodNotAllowed),
            (Endpoint::ListMovies, _, _) => handlers::list_movies(store),
            (Endpoint::CreateMovie, _, _) => handlers::create_movie(store, request),
            (Endpoint::GetMovieById, Target::Item(id), _) => handlers::get_movie_by_id(store, id),
            (Endpoint::DeleteMovieById, Target::Item(id), _) => {
                handlers::delete_movie_by_id(store, id)
            }
            (Endpoint::ListMoviesByYear, _, Some(query)) => {
                handlers::list_movies_by_year(store, query)
            }
            (endpoint, target, _) => Err(ApiError::Internal(anyhow!(
                "route table sent {target:?} to {endpoint:?}"
            ))),
        }
    }
}

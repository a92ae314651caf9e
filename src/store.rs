use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::debug;

use crate::movie::{seed_catalog, Movie, MovieId, NewMovie};

/// In-memory movie store shared by every request handler.
///
/// All mutations run under a single write lock, so id assignment and insert
/// are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MovieStore {
    movies: RwLock<BTreeMap<MovieId, Movie>>,
}

impl MovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with the startup catalog.
    pub fn seeded() -> Self {
        let store = Self::new();
        for movie in seed_catalog() {
            store.add(movie);
        }
        store
    }

    /// Inserts `movie` under id `len + 1` and returns that id.
    ///
    /// Ids are derived from the current size, not from the highest id, so
    /// after a deletion the next id can land on an existing entry and
    /// replace it.
    pub fn add(&self, movie: NewMovie) -> MovieId {
        let mut movies = self.write();
        let id = movies.len() as MovieId + 1;
        if movies.contains_key(&id) {
            debug!("id {id} is already taken, replacing the stored movie");
        }
        movies.insert(id, movie.with_id(id));
        id
    }

    pub fn get_by_id(&self, id: MovieId) -> Option<Movie> {
        self.read().get(&id).cloned()
    }

    /// Removes the movie if present. Returns whether something was removed.
    pub fn delete_by_id(&self, id: MovieId) -> bool {
        self.write().remove(&id).is_some()
    }

    /// Snapshot of every movie, in ascending id order.
    pub fn list_all(&self) -> Vec<Movie> {
        self.read().values().cloned().collect()
    }

    pub fn list_by_year(&self, year: i64) -> Vec<Movie> {
        self.read()
            .values()
            .filter(|movie| movie.year == year)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Every operation leaves the map consistent, so a panic in another
    // holder does not invalidate the data.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<MovieId, Movie>> {
        self.movies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<MovieId, Movie>> {
        self.movies.write().unwrap_or_else(PoisonError::into_inner)
    }
}

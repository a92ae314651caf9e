use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    sync::Arc,
    thread::{self, JoinHandle},
};

use moviehub::{
    movie::NewMovie, MovieStore, Router, ServerConfig, ShutdownHandle, WebServer,
};
use serde_json::{json, Value};

struct TestServer {
    address: SocketAddr,
    store: Arc<MovieStore>,
    handle: ShutdownHandle,
    running: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    fn start() -> TestServer {
        let store = Arc::new(MovieStore::new());
        let config = ServerConfig::default()
            .with_address("127.0.0.1:0")
            .with_workers(2)
            .with_seed_catalog(false);

        let router = Router::movies(Arc::clone(&store)).unwrap();
        let server = WebServer::bind(&config, router).unwrap();
        let address = server.address;
        let handle = server.shutdown_handle();
        let running = thread::spawn(move || server.run());

        TestServer {
            address,
            store,
            handle,
            running: Some(running),
        }
    }

    fn send(&self, method: &str, target: &str, headers: &[(&str, &str)], body: &str) -> Response {
        let mut wire = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\n");
        for (name, value) in headers {
            wire.push_str(&format!("{name}: {value}\r\n"));
        }
        wire.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));

        let mut stream = TcpStream::connect(self.address).unwrap();
        stream.write_all(wire.as_bytes()).unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        Response::parse(&raw)
    }

    fn get(&self, target: &str) -> Response {
        self.send("GET", target, &[], "")
    }

    fn post_json(&self, body: &Value) -> Response {
        self.send(
            "POST",
            "/movies",
            &[("Content-Type", "application/json")],
            &body.to_string(),
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown().unwrap();
        if let Some(running) = self.running.take() {
            running.join().unwrap().unwrap();
        }
    }
}

struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    fn parse(raw: &str) -> Response {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let mut lines = head.split("\r\n");
        let status = lines.next().unwrap().split(' ').nth(1).unwrap().parse().unwrap();
        let headers = lines
            .map(|line| {
                let (name, value) = line.split_once(':').unwrap();
                (name.trim().to_owned(), value.trim().to_owned())
            })
            .collect();

        Response {
            status,
            headers,
            body: body.to_owned(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

fn seed_five(store: &MovieStore) {
    for (title, year) in [
        ("Avatar", 2009),
        ("Watchmen", 2009),
        ("The Gentlemen", 2019),
        ("Gladiator", 2000),
        ("2012", 2009),
    ] {
        store.add(NewMovie::new(title, year));
    }
}

#[test]
fn get_movies_when_empty() {
    let server = TestServer::start();

    let response = server.get("/movies");
    assert_eq!(200, response.status);
    assert_eq!(Some("application/json; charset=utf-8"), response.header("Content-Type"));
    assert_eq!(json!([]), response.json());
}

#[test]
fn get_movies_when_not_empty() {
    let server = TestServer::start();
    server.store.add(NewMovie::new("Avatar", 2009));

    let response = server.get("/movies");
    assert_eq!(200, response.status);
    assert_eq!(json!([{ "id": 1, "title": "Avatar", "year": 2009 }]), response.json());
}

#[test]
fn post_movie_then_get_it_back() {
    let server = TestServer::start();

    let created = server.post_json(&json!({ "title": "Avatar", "year": 2009 }));
    assert_eq!(201, created.status);
    assert_eq!(Some("application/json; charset=utf-8"), created.header("Content-Type"));
    assert_eq!(json!({ "id": 1, "title": "Avatar", "year": 2009 }), created.json());

    let id = created.json()["id"].as_i64().unwrap();
    let fetched = server.get(&format!("/movies/{id}"));
    assert_eq!(200, fetched.status);
    assert_eq!("Avatar", fetched.json()["title"]);
    assert_eq!(2009, fetched.json()["year"]);
}

#[test]
fn post_movies_ids_strictly_increase() {
    let server = TestServer::start();

    let ids: Vec<i64> = ["Avatar", "Watchmen", "Gladiator"]
        .iter()
        .map(|title| {
            let response = server.post_json(&json!({ "title": title, "year": 2009 }));
            assert_eq!(201, response.status);
            response.json()["id"].as_i64().unwrap()
        })
        .collect();

    assert_eq!(vec![1, 2, 3], ids);
}

#[test]
fn post_movie_round_trips_extra_fields() {
    let server = TestServer::start();
    let payload = json!({ "title": "Gladiator", "year": 2000, "tags": ["epic"], "rating": 8.5 });

    let response = server.post_json(&payload);
    assert_eq!(201, response.status);

    let mut expected = payload.clone();
    expected["id"] = json!(1);
    assert_eq!(expected, response.json());
}

#[test]
fn post_movie_with_too_long_title() {
    let server = TestServer::start();

    let response = server.post_json(&json!({ "title": "x".repeat(101), "year": 2009 }));
    assert_eq!(422, response.status);
    assert_eq!(
        json!(["title is too long (at most 100 characters)"]),
        response.json()["details"]
    );
    assert!(server.store.is_empty());
}

#[test]
fn post_movie_with_empty_title() {
    let server = TestServer::start();

    let response = server.post_json(&json!({ "title": "", "year": 2009 }));
    assert_eq!(422, response.status);
}

#[test]
fn post_movie_with_year_in_future() {
    let server = TestServer::start();

    let response = server.post_json(&json!({ "title": "Avatar", "year": 2099 }));
    assert_eq!(422, response.status);
}

#[test]
fn post_movie_without_content_type() {
    let server = TestServer::start();
    let body = json!({ "title": "Avatar", "year": 2009 }).to_string();

    let response = server.send("POST", "/movies", &[], &body);
    assert_eq!(415, response.status);
    assert_eq!(json!([]), response.json()["details"]);
}

#[test]
fn post_movie_with_malformed_json() {
    let server = TestServer::start();

    let response = server.send(
        "POST",
        "/movies",
        &[("Content-Type", "application/json")],
        "{\"title\": ",
    );
    assert_eq!(415, response.status);
}

#[test]
fn post_movie_with_misspelled_field() {
    let server = TestServer::start();

    let response = server.post_json(&json!({ "tittle": "Avatar", "year": 2009 }));
    assert_eq!(422, response.status);
    assert_eq!(
        json!({ "error": "Movie fields are missing", "details": ["missing field: title"] }),
        response.json()
    );
}

#[test]
fn get_movie_by_id() {
    let server = TestServer::start();
    server.store.add(NewMovie::new("Avatar", 2009));

    assert_eq!(200, server.get("/movies/1").status);
    assert_eq!(404, server.get("/movies/2").status);
    assert_eq!(400, server.get("/movies/avatar").status);
    assert_eq!(404, server.get("/movies/999").status);
}

#[test]
fn delete_movie_by_id() {
    let server = TestServer::start();
    server.store.add(NewMovie::new("Avatar", 2009));

    assert_eq!(400, server.send("DELETE", "/movies/avatar", &[], "").status);
    assert_eq!(404, server.send("DELETE", "/movies/2", &[], "").status);

    let response = server.send("DELETE", "/movies/1", &[], "");
    assert_eq!(204, response.status);
    assert!(response.body.is_empty());

    assert_eq!(404, server.get("/movies/1").status);
}

#[test]
fn get_movies_by_year() {
    let server = TestServer::start();
    seed_five(&server.store);

    let response = server.get("/movies?year=2009");
    assert_eq!(200, response.status);
    assert_eq!(Some("application/json; charset=utf-8"), response.header("Content-Type"));

    let movies = response.json();
    let movies = movies.as_array().unwrap();
    assert_eq!(3, movies.len());
    assert!(movies.iter().all(|movie| movie["year"] == 2009));
}

#[test]
fn get_movies_by_year_when_none_match() {
    let server = TestServer::start();
    seed_five(&server.store);

    let response = server.get("/movies?year=2008");
    assert_eq!(200, response.status);
    assert_eq!(json!([]), response.json());
}

#[test]
fn get_movies_by_year_when_not_a_number() {
    let server = TestServer::start();
    seed_five(&server.store);

    assert_eq!(400, server.get("/movies?year=abc").status);
}

#[test]
fn unsupported_method() {
    let server = TestServer::start();

    let response = server.send("PUT", "/movies", &[], "");
    assert_eq!(405, response.status);
    assert_eq!("Method not supported", response.body);
}

#[test]
fn path_outside_movies() {
    let server = TestServer::start();

    assert_eq!(404, server.get("/films").status);
}

#[test]
fn id_is_reused_after_delete() {
    let server = TestServer::start();
    server.store.add(NewMovie::new("Avatar", 2009));
    server.store.add(NewMovie::new("Gladiator", 2000));

    assert_eq!(204, server.send("DELETE", "/movies/1", &[], "").status);

    // Ids follow the store size, so the new movie takes id 2 from Gladiator.
    let created = server.post_json(&json!({ "title": "Watchmen", "year": 2009 }));
    assert_eq!(json!(2), created.json()["id"]);
    assert_eq!(json!([{ "id": 2, "title": "Watchmen", "year": 2009 }]), server.get("/movies").json());
}

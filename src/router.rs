//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler, and every handler receives the router's shared state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use matchit::{Match, Router as MatchitRouter};
use tracing::{debug, warn};

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Owns the immutable state `S` that handlers read from. Build it once at
/// startup; pass it to [`Server::serve`](crate::Server::serve). Each
/// [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
    state: Arc<S>,
}

enum Lookup<S> {
    Found(BoxedHandler<S>, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new(state: S) -> Self {
        Self { routes: HashMap::new(), state: Arc::new(state) }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are read, percent-decoded, with
    /// `req.param("name")`. A `GET` route also answers `HEAD` unless a `HEAD`
    /// route is registered for the same path.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or collides with an existing one.
    /// Routes are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: Method, path: &str) -> Lookup<S> {
        let matched = match method {
            Method::Head => self.find(Method::Head, path).or_else(|| self.find(Method::Get, path)),
            _ => self.find(method, path),
        };

        if let Some(matched) = matched {
            let handler = Arc::clone(matched.value);
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), decode_param(v)))
                .collect();
            return Lookup::Found(handler, params);
        }

        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed(allowed)
        }
    }

    fn find<'a, 'p>(&'a self, method: Method, path: &'p str) -> Option<Match<'a, 'p, &'a BoxedHandler<S>>> {
        self.routes.get(&method).and_then(|tree| tree.at(path).ok())
    }

    /// Every method with a route matching `path`, in a stable order.
    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| *method)
            .collect();
        if allowed.contains(&Method::Get) && !allowed.contains(&Method::Head) {
            allowed.push(Method::Head);
        }
        allowed.sort();
        allowed
    }

    /// Routes one request and produces one response.
    ///
    /// All failures are turned into responses (400, 404, 405) so the caller
    /// never sees an error. This is what the server runs per request; tests
    /// call it directly with in-memory bodies.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let path = normalize_path(parts.uri.path());

        let response = match Method::try_from(&parts.method) {
            Err(_) => match self.allowed_methods(path).as_slice() {
                [] => Response::error(Status::NotFound),
                allowed => method_not_allowed(allowed),
            },
            Ok(method) => match self.lookup(method, path) {
                Lookup::NotFound => Response::error(Status::NotFound),
                Lookup::MethodNotAllowed(allowed) => method_not_allowed(&allowed),
                Lookup::Found(handler, params) => match body.collect().await {
                    Ok(collected) => {
                        let req = Request::new(collected.to_bytes(), params);
                        let res = handler.call(req, Arc::clone(&self.state)).await;
                        if method == Method::Head { res.without_body() } else { res }
                    }
                    Err(e) => {
                        warn!(%path, "failed to read request body: {e}");
                        Response::error(Status::BadRequest)
                    }
                },
            },
        };

        debug!(
            method = %parts.method,
            %path,
            status = u16::from(response.status_code()),
            latency_us = started.elapsed().as_micros() as u64,
            "request handled"
        );
        response.into_inner()
    }
}

/// Drops one trailing slash, so `/users/` routes like `/users`. The root path
/// is left alone.
fn normalize_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

/// Percent-decodes a path parameter. Values that do not decode to UTF-8 are
/// kept as sent.
fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    let body = serde_json::json!({ "detail": Status::MethodNotAllowed.reason() });
    Response::builder()
        .status(Status::MethodNotAllowed)
        .header("allow", &allow)
        .json(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Empty;

    async fn echo_id(req: Request, prefix: Arc<String>) -> String {
        format!("{prefix}{}", req.param("id").unwrap_or("none"))
    }

    async fn delete_user(_req: Request, _prefix: Arc<String>) -> Status {
        Status::NoContent
    }

    fn router() -> Router<String> {
        Router::new("user-".to_owned())
            .on(Method::Get, "/users/{id}", echo_id)
            .on(Method::Delete, "/users/{id}", delete_user)
    }

    fn request(method: http::Method, uri: &str) -> http::Request<Empty<Bytes>> {
        http::Request::builder().method(method).uri(uri).body(Empty::new()).unwrap()
    }

    #[tokio::test]
    async fn passes_params_and_state() {
        let res = router().handle(request(http::Method::GET, "/users/42")).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"user-42");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let res = router().handle(request(http::Method::GET, "/accounts")).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_lists_allowed() {
        let res = router().handle(request(http::Method::POST, "/users/1")).await;
        assert_eq!(res.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()["allow"], "DELETE, GET, HEAD");
    }

    #[tokio::test]
    async fn extension_method_is_405_on_known_path() {
        let brew = http::Method::from_bytes(b"BREW").unwrap();
        let res = router().handle(request(brew, "/users/1")).await;
        assert_eq!(res.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()["allow"], "DELETE, GET, HEAD");
    }

    #[tokio::test]
    async fn extension_method_on_unknown_path_is_404() {
        let brew = http::Method::from_bytes(b"BREW").unwrap();
        let res = router().handle(request(brew, "/nope")).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn params_are_percent_decoded() {
        let res = router().handle(request(http::Method::GET, "/users/a%20b%C3%A9")).await;
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(std::str::from_utf8(&body).unwrap(), "user-a bé");
    }

    #[tokio::test]
    async fn undecodable_params_are_kept_raw() {
        let res = router().handle(request(http::Method::GET, "/users/%FF")).await;
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"user-%FF");
    }

    #[tokio::test]
    async fn trailing_slash_is_ignored() {
        let res = router().handle(request(http::Method::GET, "/users/42/")).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"user-42");
    }

    #[tokio::test]
    async fn head_falls_back_to_get_without_body() {
        let res = router().handle(request(http::Method::HEAD, "/users/42")).await;
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn normalizes_one_trailing_slash() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users"), "/users");
        assert_eq!(normalize_path("/users//"), "/users/");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = router().on(Method::Get, "/users/{name}", echo_id);
    }
}

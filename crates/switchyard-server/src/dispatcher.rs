//! The request dispatcher.
//!
//! A [`Dispatcher`] owns the per-method route trees, the middleware chain and
//! the single entry point every request passes through. It is configured
//! during startup through `&mut self` and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use switchyard_core::{Context, Exchange};
//! use switchyard_server::Dispatcher;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.get("/items/:id", |ex: &mut Exchange, ctx: &mut Context| {
//!     ex.write(format!("item {}", ctx.param("id")));
//! });
//!
//! let response = dispatcher.dispatch(Request::get("/items/7").body(Bytes::new()).unwrap());
//! assert_eq!(response.status(), StatusCode::OK);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use switchyard_core::{context_free, BoxedHandler, Context, Exchange, Handler};
use switchyard_middleware::{Middleware, MiddlewareChain};
use switchyard_router::{RouteError, Router};
use switchyard_telemetry::record_request;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::Server;

/// The terminal state one request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A middleware failed; the response carries its message.
    Aborted,
    /// The matched handler ran.
    Handled,
    /// No route matched.
    NotFound,
}

impl DispatchOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::Handled => "handled",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes requests to handlers through a middleware chain.
#[derive(Default)]
pub struct Dispatcher {
    router: Router<BoxedHandler>,
    middleware: MiddlewareChain,
    not_found: Option<BoxedHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher with no routes and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Re-registering a pattern replaces the earlier handler.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteError`] describing a malformed or conflicting
    /// pattern. The route table is unchanged on error.
    pub fn try_handle<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        let replaced = self.router.add(method.clone(), pattern, Arc::new(handler))?;
        log_registration(method.as_str(), pattern, replaced.is_some());
        Ok(self)
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or conflicts with an existing
    /// route. Routes are fixed at startup, so this surfaces immediately.
    pub fn handle<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self {
        if let Err(e) = self.try_handle(method, pattern, handler) {
            panic!("{e}");
        }
        self
    }

    /// Registers a handler that does not need the request context.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Dispatcher::handle`].
    pub fn handle_service<F>(&mut self, method: Method, pattern: &str, service: F) -> &mut Self
    where
        F: Fn(&mut Exchange) + Send + Sync + 'static,
    {
        self.handle(method, pattern, context_free(service))
    }

    /// Registers `handler` for every method.
    ///
    /// A method's own routes are tried first; these match only when they
    /// do not.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteError`] for a malformed or conflicting pattern.
    pub fn try_handle_any<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        let replaced = self.router.add_any(pattern, Arc::new(handler))?;
        log_registration("*", pattern, replaced.is_some());
        Ok(self)
    }

    /// Registers `handler` for every method.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or conflicts with an existing
    /// route.
    pub fn handle_any<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        if let Err(e) = self.try_handle_any(pattern, handler) {
            panic!("{e}");
        }
        self
    }

    /// Registers a `GET` route. Panics like [`Dispatcher::handle`].
    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::GET, pattern, handler)
    }

    /// Registers a `HEAD` route. Panics like [`Dispatcher::handle`].
    pub fn head<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::HEAD, pattern, handler)
    }

    /// Registers a `POST` route. Panics like [`Dispatcher::handle`].
    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::POST, pattern, handler)
    }

    /// Registers a `PUT` route. Panics like [`Dispatcher::handle`].
    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::PUT, pattern, handler)
    }

    /// Registers a `DELETE` route. Panics like [`Dispatcher::handle`].
    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Registers a `CONNECT` route. Panics like [`Dispatcher::handle`].
    pub fn connect<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::CONNECT, pattern, handler)
    }

    /// Registers an `OPTIONS` route. Panics like [`Dispatcher::handle`].
    pub fn options<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::OPTIONS, pattern, handler)
    }

    /// Registers a `PATCH` route. Panics like [`Dispatcher::handle`].
    pub fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::PATCH, pattern, handler)
    }

    /// Registers a `TRACE` route. Panics like [`Dispatcher::handle`].
    pub fn trace<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::TRACE, pattern, handler)
    }

    /// Appends a middleware. Middleware runs in registration order on every
    /// request, matched or not.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        tracing::debug!(middleware = middleware.name(), "Middleware registered");
        self.middleware.push(middleware);
        self
    }

    /// Replaces the default empty 404 for unmatched requests.
    pub fn not_found<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// The route table.
    #[must_use]
    pub fn router(&self) -> &Router<BoxedHandler> {
        &self.router
    }

    /// The middleware chain.
    #[must_use]
    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Runs one request through middleware and routing.
    ///
    /// Exactly one outcome is reached. The request body is marked closed
    /// before returning, whatever the outcome.
    pub fn serve(&self, exchange: &mut Exchange) -> DispatchOutcome {
        let mut ctx = Context::new();

        let handler = match self.router.lookup(exchange.method(), exchange.path()) {
            Some(found) => {
                ctx.set_params(found.params);
                Some(Arc::clone(found.handler))
            }
            None => None,
        };

        let outcome = if let Err(abort) = self.middleware.run(exchange, &mut ctx) {
            tracing::warn!(
                request_id = %ctx.request_id(),
                middleware = abort.stage,
                error = %abort,
                "Middleware aborted request"
            );
            exchange.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            exchange.write(abort.to_string());
            DispatchOutcome::Aborted
        } else if let Some(handler) = handler {
            handler.call(exchange, &mut ctx);
            DispatchOutcome::Handled
        } else {
            match &self.not_found {
                Some(fallback) => fallback.call(exchange, &mut ctx),
                None => exchange.write_header(StatusCode::NOT_FOUND),
            }
            DispatchOutcome::NotFound
        };

        exchange.close_body();

        let elapsed = ctx.elapsed();
        record_request(exchange.method().as_str(), outcome.as_str(), elapsed);
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %exchange.method(),
            path = exchange.path(),
            status = exchange.status().as_u16(),
            outcome = outcome.as_str(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "Request dispatched"
        );

        outcome
    }

    /// Dispatches a collected request and returns its response.
    #[must_use]
    pub fn dispatch(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
        let mut exchange = Exchange::new(request);
        self.serve(&mut exchange);
        exchange.into_response()
    }

    /// Binds a server on every interface at `port` with default timeouts.
    ///
    /// The returned [`Server`] is bound but not yet serving; call
    /// [`Server::run`] on it.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the port cannot be bound.
    pub async fn listen(self, port: u16) -> Result<Server, ServerError> {
        Server::bind(ServerConfig::for_port(port), self).await
    }
}

fn log_registration(method: &str, pattern: &str, replaced: bool) {
    if replaced {
        tracing::warn!(method, pattern, "Route re-registered, previous handler replaced");
    } else {
        tracing::debug!(method, pattern, "Route registered");
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("middleware", &self.middleware)
            .field("custom_not_found", &self.not_found.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use switchyard_middleware::FnMiddleware;

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn body(response: &Response<Full<Bytes>>) -> String {
        use http_body_util::BodyExt;
        let collected = tokio_test::block_on(response.body().clone().collect()).unwrap();
        String::from_utf8(collected.to_bytes().to_vec()).unwrap()
    }

    fn echo_id(ex: &mut Exchange, ctx: &mut Context) {
        ex.write(format!("id={}", ctx.param("id")));
    }

    #[test]
    fn test_matched_route_gets_params() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("/items/:id", echo_id);

        let response = dispatcher.dispatch(request(Method::GET, "/items/7"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), "id=7");
    }

    #[test]
    fn test_unmatched_is_empty_404() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("/items/:id", echo_id);

        for (method, uri) in [
            (Method::GET, "/items/7/extra"),
            (Method::GET, "/items"),
            (Method::POST, "/items/7"),
        ] {
            let response = dispatcher.dispatch(request(method, uri));
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body(&response), "");
        }
    }

    #[test]
    fn test_intermediate_node_is_not_a_match() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("/a/b/c", |ex: &mut Exchange, _: &mut Context| {
            ex.write("deep");
        });

        let response = dispatcher.dispatch(request(Method::GET, "/a/b"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_middleware_abort_writes_500_with_message() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();

        let seen = Arc::clone(&calls);
        dispatcher.get("/items/:id", move |_: &mut Exchange, _: &mut Context| {
            seen.lock().unwrap().push("handler");
        });

        let seen = Arc::clone(&calls);
        dispatcher.use_middleware(FnMiddleware::new("deny", move |_, _| {
            seen.lock().unwrap().push("deny");
            Err(anyhow::anyhow!("access denied"))
        }));

        let seen = Arc::clone(&calls);
        dispatcher.use_middleware(FnMiddleware::new("after", move |_, _| {
            seen.lock().unwrap().push("after");
            Ok(())
        }));

        let mut exchange = Exchange::new(request(Method::GET, "/items/7"));
        let outcome = dispatcher.serve(&mut exchange);
        assert_eq!(outcome, DispatchOutcome::Aborted);
        assert!(exchange.is_body_closed());

        let response = exchange.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), "access denied");
        assert_eq!(*calls.lock().unwrap(), vec!["deny"]);
    }

    #[test]
    fn test_middleware_runs_in_order_before_handler() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();

        for name in ["first", "second"] {
            let seen = Arc::clone(&calls);
            dispatcher.use_middleware(FnMiddleware::new(name, move |_, _| {
                seen.lock().unwrap().push(name);
                Ok(())
            }));
        }

        let seen = Arc::clone(&calls);
        dispatcher.get("/", move |_: &mut Exchange, _: &mut Context| {
            seen.lock().unwrap().push("handler");
        });

        let mut exchange = Exchange::new(request(Method::GET, "/"));
        assert_eq!(dispatcher.serve(&mut exchange), DispatchOutcome::Handled);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "handler"]);
    }

    #[test]
    fn test_middleware_sees_params_and_runs_on_miss() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.use_middleware(FnMiddleware::new("peek", |ex: &mut Exchange, ctx: &mut Context| {
            let id = ctx.param("id").to_string();
            ex.response_headers_mut()
                .insert("x-seen-id", http::HeaderValue::from_str(&id)?);
            Ok(())
        }));
        dispatcher.get("/items/:id", echo_id);

        let hit = dispatcher.dispatch(request(Method::GET, "/items/42"));
        assert_eq!(hit.headers()["x-seen-id"], "42");

        let miss = dispatcher.dispatch(request(Method::GET, "/nowhere"));
        assert_eq!(miss.status(), StatusCode::NOT_FOUND);
        assert_eq!(miss.headers()["x-seen-id"], "");
    }

    #[test]
    fn test_overwrite_last_registration_wins() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("/v", |ex: &mut Exchange, _: &mut Context| {
            ex.write("one");
        });
        dispatcher.get("/v", |ex: &mut Exchange, _: &mut Context| {
            ex.write("two");
        });

        let response = dispatcher.dispatch(request(Method::GET, "/v"));
        assert_eq!(body(&response), "two");
        assert_eq!(dispatcher.router().len(), 1);
    }

    #[test]
    fn test_try_handle_rejects_bad_pattern() {
        let mut dispatcher = Dispatcher::new();
        let err = dispatcher
            .try_handle(Method::GET, "items", echo_id)
            .unwrap_err();
        assert!(matches!(err, RouteError::MissingLeadingSlash { .. }));
        assert!(dispatcher.router().is_empty());
    }

    #[test]
    #[should_panic(expected = "items")]
    fn test_handle_panics_on_bad_pattern() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("items", echo_id);
    }

    #[test]
    fn test_verb_helpers_register_their_method() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .get("/r", echo_id)
            .head("/r", echo_id)
            .post("/r", echo_id)
            .put("/r", echo_id)
            .delete("/r", echo_id)
            .connect("/r", echo_id)
            .options("/r", echo_id)
            .patch("/r", echo_id)
            .trace("/r", echo_id);

        for method in [
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::CONNECT,
            Method::OPTIONS,
            Method::PATCH,
            Method::TRACE,
        ] {
            assert!(dispatcher.router().tree(&method).is_some(), "{method}");
        }
        assert_eq!(dispatcher.router().methods().len(), 9);
    }

    #[test]
    fn test_extension_method() {
        let mut dispatcher = Dispatcher::new();
        let purge = Method::from_bytes(b"PURGE").unwrap();
        dispatcher.handle(purge.clone(), "/cache/*key", |ex: &mut Exchange, ctx: &mut Context| {
            ex.write(ctx.param("key").to_string());
        });

        let response = dispatcher.dispatch(request(purge, "/cache/a/b"));
        assert_eq!(body(&response), "a/b");
    }

    #[test]
    fn test_handle_service_ignores_context() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.handle_service(Method::GET, "/health", |ex: &mut Exchange| {
            ex.write("ok");
        });

        let response = dispatcher.dispatch(request(Method::GET, "/health"));
        assert_eq!(body(&response), "ok");
    }

    #[test]
    fn test_any_method_fallback() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.handle_any("/ping", |ex: &mut Exchange, _: &mut Context| {
            ex.write("any");
        });
        dispatcher.get("/ping", |ex: &mut Exchange, _: &mut Context| {
            ex.write("get");
        });

        assert_eq!(body(&dispatcher.dispatch(request(Method::GET, "/ping"))), "get");
        assert_eq!(body(&dispatcher.dispatch(request(Method::DELETE, "/ping"))), "any");
    }

    #[test]
    fn test_custom_not_found() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.not_found(|ex: &mut Exchange, _: &mut Context| {
            ex.write_header(StatusCode::NOT_FOUND);
            ex.write(format!("no route for {}", ex.path()));
        });

        let mut exchange = Exchange::new(request(Method::GET, "/missing"));
        assert_eq!(dispatcher.serve(&mut exchange), DispatchOutcome::NotFound);

        let response = exchange.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), "no route for /missing");
    }

    #[test]
    fn test_contexts_are_not_shared() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.get("/count", |ex: &mut Exchange, ctx: &mut Context| {
            let seen = ctx.get::<u32>("hits").copied().unwrap_or(0);
            ctx.set("hits", seen + 1);
            ex.write(ctx.get::<u32>("hits").copied().unwrap_or(0).to_string());
        });

        for _ in 0..3 {
            let response = dispatcher.dispatch(request(Method::GET, "/count"));
            assert_eq!(body(&response), "1");
        }
    }

    #[test]
    fn test_separate_dispatchers_have_separate_middleware() {
        let mut guarded = Dispatcher::new();
        guarded.use_middleware(FnMiddleware::new("deny", |_, _| Err(anyhow::anyhow!("no"))));
        guarded.get("/", echo_id);

        let mut open = Dispatcher::new();
        open.get("/", echo_id);

        assert_eq!(
            guarded.dispatch(request(Method::GET, "/")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(open.dispatch(request(Method::GET, "/")).status(), StatusCode::OK);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::Aborted.as_str(), "aborted");
        assert_eq!(DispatchOutcome::Handled.to_string(), "handled");
        assert_eq!(DispatchOutcome::NotFound.as_str(), "not_found");
    }
}

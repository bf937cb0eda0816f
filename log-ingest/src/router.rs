use crate::drain::{Drain, DrainContext};
use crate::firehose::FirehoseDrain;
use crate::json_drain::JsonDrain;
use hyper::{Method, Request};
use std::sync::Arc;

pub const JSON_PATH: &str = "/v1/logs/json";
pub const FIREHOSE_PATH: &str = "/v1/logs/firehose";

struct Route {
    path: &'static str,
    drain: Arc<dyn Drain>,
}

/// Outcome of matching a request against the registered drains
pub enum RouteMatch {
    Drain(Arc<dyn Drain>),
    MethodNotAllowed,
    NotFound,
}

/// Router that maps request paths to drains. Drains only accept POST.
#[derive(Clone)]
pub struct Router {
    routes: Arc<Vec<Route>>,
}

impl Router {
    pub fn new(routes: Vec<(&'static str, Arc<dyn Drain>)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(path, drain)| Route { path, drain })
            .collect();
        Self {
            routes: Arc::new(routes),
        }
    }

    /// Router serving the JSON and firehose drains
    pub fn with_drains(ctx: DrainContext) -> Self {
        let json: Arc<dyn Drain> = Arc::new(JsonDrain::new(ctx.clone()));
        let firehose: Arc<dyn Drain> = Arc::new(FirehoseDrain::new(ctx));
        Self::new(vec![(JSON_PATH, json), (FIREHOSE_PATH, firehose)])
    }

    pub fn route<B>(&self, req: &Request<B>) -> RouteMatch {
        let path = req.uri().path();
        match self.routes.iter().find(|route| route.path == path) {
            Some(route) if req.method() == Method::POST => RouteMatch::Drain(route.drain.clone()),
            Some(_) => {
                tracing::warn!(method = %req.method(), path, "Method not allowed");
                RouteMatch::MethodNotAllowed
            }
            None => {
                tracing::warn!(method = %req.method(), path, "No route matched");
                RouteMatch::NotFound
            }
        }
    }
}

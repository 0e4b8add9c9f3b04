//! Request dispatch: route matching, throttling and the JSON envelope around
//! the group service.
//!
//! Page routes only name a template and its context; turning that into HTML is
//! left to whichever renderer the transport plugs in.
use super::error::GroupError;
use super::group::Group;
use super::rate_limit::RateLimiter;
use super::service::GroupService;
use super::view::{ErrorEnvelope, GroupView};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::error;

static KEYED_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(build|join|tweak|review|done)/([a-zA-Z0-9_-]{11})/$")
        .expect("route pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    CreatePage,
    OpenPage,
    BuildPage(String),
    JoinPage(String),
    TweakPage(String),
    ReviewPage(String),
    DonePage(String),
    CreateGroup,
    GetGroup,
    UpdateGroup,
    Warmup,
}

impl Route {
    pub fn resolve(method: Method, path: &str) -> Option<Self> {
        let route = match (method, path) {
            (Method::Get, "/") => Route::Index,
            (Method::Get, "/create/") => Route::CreatePage,
            (Method::Get, "/open/") => Route::OpenPage,
            (Method::Post, "/x/create-group/") => Route::CreateGroup,
            (Method::Get, "/x/get-group/") => Route::GetGroup,
            (Method::Post, "/x/update-group/") => Route::UpdateGroup,
            (Method::Get, "/_ah/warmup") => Route::Warmup,
            (Method::Get, path) => {
                let captures = KEYED_PAGE.captures(path)?;
                let key = captures[2].to_string();
                match &captures[1] {
                    "build" => Route::BuildPage(key),
                    "join" => Route::JoinPage(key),
                    "tweak" => Route::TweakPage(key),
                    "review" => Route::ReviewPage(key),
                    _ => Route::DonePage(key),
                }
            }
            _ => return None,
        };
        Some(route)
    }

    /// Bucket name used for throttling.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Index => "index",
            Route::CreatePage => "create-page",
            Route::OpenPage => "open-page",
            Route::BuildPage(_) => "build-page",
            Route::JoinPage(_) => "join-page",
            Route::TweakPage(_) => "tweak-page",
            Route::ReviewPage(_) => "review-page",
            Route::DonePage(_) => "done-page",
            Route::CreateGroup => "create-group",
            Route::GetGroup => "get-group",
            Route::UpdateGroup => "update-group",
            Route::Warmup => "warmup",
        }
    }

    /// Minimum spacing between two requests from one client.
    pub fn rate_period(&self) -> Duration {
        let secs = match self {
            Route::Index | Route::GetGroup | Route::UpdateGroup => 1,
            Route::Warmup => 10,
            _ => 2,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub remote_addr: String,
    pub params: HashMap<String, String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            remote_addr: remote_addr.into(),
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Page {
        template: &'static str,
        context: Value,
    },
    Json(Value),
    Raw {
        status: u16,
        body: String,
    },
}

impl Response {
    fn page(template: &'static str) -> Self {
        Response::Page {
            template,
            context: json!({}),
        }
    }
}

pub struct App {
    service: GroupService,
    limiter: RateLimiter,
}

impl App {
    pub fn new(service: GroupService, limiter: RateLimiter) -> Self {
        Self { service, limiter }
    }

    pub fn handle(&self, request: &Request) -> Response {
        let Some(route) = Route::resolve(request.method, &request.path) else {
            return Response::Raw {
                status: 404,
                body: "Not found.".into(),
            };
        };

        if !self
            .limiter
            .try_acquire(route.name(), &request.remote_addr, route.rate_period())
        {
            return Response::Raw {
                status: 403,
                body: "Rate limit exceeded.".into(),
            };
        }

        match route {
            Route::Index => Response::page("index.html"),
            Route::CreatePage => Response::page("create_group.html"),
            Route::OpenPage => Response::page("open_group.html"),
            Route::BuildPage(key) => Response::Page {
                template: "build_group.html",
                context: json!({ "key": key }),
            },
            Route::JoinPage(_) => Response::page("join_group.html"),
            Route::TweakPage(_) => Response::page("tweak_group.html"),
            Route::ReviewPage(_) => Response::page("review_assignments.html"),
            Route::DonePage(_) => Response::page("assignments_sent.html"),
            Route::Warmup => Response::Raw {
                status: 200,
                body: "Warmed up!".into(),
            },
            Route::CreateGroup => envelope(self.service.create_group(
                request.get("name").unwrap_or_default(),
                request.get("adminEmail").unwrap_or_default(),
            )),
            Route::GetGroup => {
                envelope(self.service.get_group(request.get("key").unwrap_or_default()))
            }
            Route::UpdateGroup => envelope(self.service.update_members(
                request.get("key").unwrap_or_default(),
                request.get("version").unwrap_or_default(),
                request.get("users").unwrap_or("null"),
            )),
        }
    }
}

fn envelope(result: Result<Group, GroupError>) -> Response {
    let body = match result {
        Ok(group) => serde_json::to_value(GroupView::from(&group)),
        Err(err) if err.is_expected() => serde_json::to_value(ErrorEnvelope::new(err.to_string())),
        Err(err) => {
            error!(error = ?err, "unexpected failure handling group request");
            serde_json::to_value(ErrorEnvelope::new(
                "Something went wrong on our end. Please try again in a moment.",
            ))
        }
    };
    match body {
        Ok(value) => Response::Json(value),
        Err(err) => {
            error!(error = %err, "response could not be serialized");
            Response::Raw {
                status: 500,
                body: "Internal error.".into(),
            }
        }
    }
}

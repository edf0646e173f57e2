//! Scripted HTTP transport shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use rest_filter::{HttpClient, HttpClientError, HttpMethod, HttpRequest, HttpResponse};
use serde_json::{json, Value};

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, HttpClientError> + Send + Sync;

/// Records every request and answers with a caller-supplied closure.
pub struct FakeClient {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, HttpClientError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(status: u16, body: &'static str) -> Self {
        Self::new(move |_| Ok(HttpResponse::new(status, body)))
    }

    /// Behaves like a small slice of jsonplaceholder.typicode.com
    pub fn placeholder_api() -> Self {
        Self::new(placeholder_api)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

impl HttpClient for FakeClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }
}

fn placeholder_api(request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
    let Some(path) = request
        .url
        .strip_prefix("http://jsonplaceholder.typicode.com")
        .or_else(|| request.url.strip_prefix("https://jsonplaceholder.typicode.com"))
    else {
        if request.url.contains("://") {
            return Ok(HttpResponse::new(404, "Not Found"));
        }
        return Err(HttpClientError::InvalidRequest(format!(
            "relative URL without a base: {}",
            request.url
        )));
    };

    match (request.method, path) {
        (HttpMethod::Get, p) if p.starts_with("/users/") => {
            match p["/users/".len()..].parse::<u64>() {
                Ok(id) if (1..=10).contains(&id) => Ok(json_response(
                    200,
                    json!({"id": id, "name": format!("User {id}"), "username": format!("user{id}")}),
                )),
                _ => Ok(json_response(404, json!({}))),
            }
        }
        (HttpMethod::Get, "/posts") => {
            let posts: Vec<Value> = all_posts()
                .into_iter()
                .filter(|post| {
                    request.query.iter().all(|(key, value)| {
                        post.get(key).map(|v| v.to_string()) == Some(value.clone())
                    })
                })
                .collect();
            Ok(json_response(200, Value::Array(posts)))
        }
        (HttpMethod::Post, "/posts") => {
            let mut created: Value = request
                .body
                .as_deref()
                .and_then(|b| serde_json::from_str(b).ok())
                .unwrap_or_else(|| json!({}));
            created["id"] = json!(101);
            Ok(json_response(201, created))
        }
        _ => Ok(json_response(404, json!({}))),
    }
}

fn all_posts() -> Vec<Value> {
    let mut posts = Vec::new();
    for (user, ids) in [(1u64, 1u64..=3), (10, 91..=93)] {
        for id in ids {
            posts.push(json!({"userId": user, "id": id, "title": format!("post {id}")}));
        }
    }
    posts
}

fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}

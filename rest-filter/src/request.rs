//! Request builder — turns the configured request template into a concrete
//! [`HttpRequest`] for one event.
//!
//! Interpolation always produces strings. When a body or param value came
//! from a template and its resolved text is a JSON number literal, it is
//! coerced back into a number before encoding, so `userId = "%{message}"`
//! with `message = "42"` is sent as `42`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{BasicAuth, FilterConfig};
use crate::error::RequestError;
use crate::http_client::{HttpMethod, HttpRequest};
use crate::template::{self, FieldLookup};

const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Validated, read-only request settings shared by every event.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    url: String,
    method: String,
    headers: Vec<(String, String)>,
    params: Option<Map<String, Value>>,
    body: Option<Map<String, Value>>,
    auth: Option<BasicAuth>,
    sprintf: bool,
}

impl RequestTemplate {
    /// Expects a config that already passed [`FilterConfig::validate`].
    pub fn from_config(config: &FilterConfig) -> Self {
        let request = &config.request;
        Self {
            url: request.url.clone().unwrap_or_default(),
            method: request.method.clone(),
            headers: request
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            params: request.params.clone(),
            body: request.body.clone(),
            auth: request.auth.clone(),
            sprintf: config.sprintf,
        }
    }

    pub fn build<F>(&self, fields: &F) -> Result<HttpRequest, RequestError>
    where
        F: FieldLookup + ?Sized,
    {
        let method: HttpMethod = self.method.parse()?;

        let url = if self.sprintf {
            template::interpolate(&self.url, fields)
        } else {
            self.url.clone()
        };

        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if self.sprintf {
                    template::interpolate(value, fields)
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();

        let params = self.resolve_map(self.params.as_ref(), fields);
        let body = self.resolve_map(self.body.as_ref(), fields);

        let mut query = Vec::new();
        let mut payload = None;

        if method.has_body() {
            // An explicit body wins over params
            if let Some(map) = body.or(params) {
                payload = Some(serde_json::to_string(&Value::Object(map))?);
                if !headers
                    .iter()
                    .any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE))
                {
                    headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
                }
            }
        } else {
            if body.is_some() {
                debug!("Ignoring request body for {method} request to {url}");
            }
            if let Some(map) = params {
                for (key, value) in map {
                    push_query_pairs(&mut query, key, value);
                }
            }
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            query,
            body: payload,
            auth: self.auth.clone(),
        })
    }

    fn resolve_map<F>(
        &self,
        map: Option<&Map<String, Value>>,
        fields: &F,
    ) -> Option<Map<String, Value>>
    where
        F: FieldLookup + ?Sized,
    {
        let map = map?;
        let resolved = map
            .iter()
            .map(|(key, value)| {
                let resolved = template::resolve_value(value, fields, self.sprintf);
                let coerced = if self.sprintf {
                    coerce_templated(value, resolved)
                } else {
                    resolved
                };
                (key.clone(), coerced)
            })
            .collect();
        Some(resolved)
    }
}

/// Walk `original` and `resolved` together; every string leaf that was a
/// template and now reads as a JSON number becomes that number.
fn coerce_templated(original: &Value, resolved: Value) -> Value {
    match (original, resolved) {
        (Value::String(template_text), Value::String(text)) => {
            if template::has_placeholder(template_text) {
                numeric(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            }
        }
        (Value::Object(originals), Value::Object(map)) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = match originals.get(&k) {
                        Some(orig) => coerce_templated(orig, v),
                        None => v,
                    };
                    (k, v)
                })
                .collect(),
        ),
        (Value::Array(originals), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .zip(originals.iter())
                .map(|(v, orig)| coerce_templated(orig, v))
                .collect(),
        ),
        (_, resolved) => resolved,
    }
}

/// Parse `text` as a JSON number literal. Only accepted when the number
/// prints back as exactly `text`, so precision and formatting survive.
fn numeric(text: &str) -> Option<Value> {
    if text.is_empty() || text.trim() != text {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Number(n)) if n.to_string() == text => Some(Value::Number(n)),
        _ => None,
    }
}

fn push_query_pairs(query: &mut Vec<(String, String)>, key: String, value: Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                query.push((key.clone(), query_string(item)));
            }
        }
        other => query.push((key, query_string(other))),
    }
}

fn query_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use serde_json::json;

    fn event(value: Value) -> Event {
        Event::from_value(value).unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn config(url: &str) -> FilterConfig {
        FilterConfig::new(url, "rest")
    }

    #[test]
    fn test_get_without_params() {
        let template = RequestTemplate::from_config(&config("http://example.com/users/10"));
        let request = template.build(&Event::new()).unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "http://example.com/users/10");
        assert!(request.query.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_url_interpolation_requires_sprintf() {
        let mut cfg = config("http://example.com/users/%{message}");
        let e = event(json!({"message": "10"}));

        let request = RequestTemplate::from_config(&cfg).build(&e).unwrap();
        assert_eq!(request.url, "http://example.com/users/%{message}");

        cfg.sprintf = true;
        let request = RequestTemplate::from_config(&cfg).build(&e).unwrap();
        assert_eq!(request.url, "http://example.com/users/10");
    }

    #[test]
    fn test_get_params_become_query() {
        let mut cfg = config("https://example.com/posts");
        cfg.sprintf = true;
        cfg.request.params = Some(map(json!({
            "userId": "%{message}",
            "id": "%{message}",
            "tags": ["a", "b"],
            "active": true
        })));
        let request = RequestTemplate::from_config(&cfg)
            .build(&event(json!({"message": "1"})))
            .unwrap();

        assert!(request.body.is_none());
        assert!(request.query.contains(&("userId".into(), "1".into())));
        assert!(request.query.contains(&("id".into(), "1".into())));
        assert!(request.query.contains(&("tags".into(), "a".into())));
        assert!(request.query.contains(&("tags".into(), "b".into())));
        assert!(request.query.contains(&("active".into(), "true".into())));
    }

    #[test]
    fn test_numeric_params_stringified() {
        let mut cfg = config("https://example.com/posts");
        cfg.request.params = Some(map(json!({"userId": 10})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();
        assert_eq!(request.query, vec![("userId".to_string(), "10".to_string())]);
    }

    #[test]
    fn test_post_params_become_json_payload() {
        let mut cfg = config("https://example.com/posts");
        cfg.request.method = "post".into();
        cfg.request.params = Some(map(json!({"title": "foo", "body": "bar", "userId": 42})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert!(request.query.is_empty());
        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(payload, json!({"title": "foo", "body": "bar", "userId": 42}));
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_post_body_templated_number_is_coerced() {
        let mut cfg = config("https://example.com/posts");
        cfg.sprintf = true;
        cfg.request.method = "post".into();
        cfg.request.body = Some(map(json!({
            "title": "foo",
            "body": "bar",
            "userId": "%{message}"
        })));
        let request = RequestTemplate::from_config(&cfg)
            .build(&event(json!({"message": "42"})))
            .unwrap();

        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(payload["userId"], json!(42));
        assert_eq!(payload["title"], json!("foo"));
    }

    #[test]
    fn test_literal_numeric_strings_are_not_coerced() {
        let mut cfg = config("https://example.com/posts");
        cfg.sprintf = true;
        cfg.request.method = "post".into();
        cfg.request.body = Some(map(json!({"zip": "01234", "code": "42"})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();

        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(payload["zip"], json!("01234"));
        assert_eq!(payload["code"], json!("42"));
    }

    #[test]
    fn test_templated_non_numeric_stays_string() {
        let mut cfg = config("https://example.com/posts");
        cfg.sprintf = true;
        cfg.request.method = "put".into();
        cfg.request.body = Some(map(json!({
            "name": "%{message}",
            "padded": "%{message} ",
            "nested": {"id": "%{id}"}
        })));
        let request = RequestTemplate::from_config(&cfg)
            .build(&event(json!({"message": "abc", "id": "7"})))
            .unwrap();

        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(payload["name"], json!("abc"));
        assert_eq!(payload["padded"], json!("abc "));
        assert_eq!(payload["nested"]["id"], json!(7));
    }

    #[test]
    fn test_body_takes_precedence_over_params() {
        let mut cfg = config("https://example.com/posts");
        cfg.request.method = "post".into();
        cfg.request.params = Some(map(json!({"from": "params"})));
        cfg.request.body = Some(map(json!({"from": "body"})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();

        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(payload, json!({"from": "body"}));
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_get_ignores_body() {
        let mut cfg = config("https://example.com/posts");
        cfg.request.body = Some(map(json!({"x": 1})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();
        assert!(request.body.is_none());
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_explicit_content_type_kept() {
        let mut cfg = config("https://example.com/posts");
        cfg.request.method = "post".into();
        cfg.request
            .headers
            .insert("content-type".into(), "application/vnd.api+json".into());
        cfg.request.body = Some(map(json!({"a": 1})));
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();

        let content_types: Vec<_> = request
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(request.header("Content-Type"), Some("application/vnd.api+json"));
    }

    #[test]
    fn test_headers_interpolated() {
        let mut cfg = config("https://example.com");
        cfg.sprintf = true;
        cfg.request
            .headers
            .insert("X-Request-Id".into(), "req-%{id}".into());
        let request = RequestTemplate::from_config(&cfg)
            .build(&event(json!({"id": 5})))
            .unwrap();
        assert_eq!(request.header("x-request-id"), Some("req-5"));
    }

    #[test]
    fn test_unsupported_method_is_a_build_error() {
        let mut cfg = config("https://example.com");
        cfg.request.method = "teleport".into();
        let result = RequestTemplate::from_config(&cfg).build(&Event::new());
        assert!(matches!(result, Err(RequestError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_auth_carried_through() {
        let mut cfg = config("https://example.com");
        cfg.request.auth = Some(BasicAuth {
            user: "u".into(),
            password: "p".into(),
        });
        let request = RequestTemplate::from_config(&cfg).build(&Event::new()).unwrap();
        assert_eq!(request.auth.unwrap().user, "u");
    }

    #[test]
    fn test_lossy_numbers_stay_strings() {
        let mut cfg = config("https://example.com/accounts");
        cfg.sprintf = true;
        cfg.request.method = "post".into();
        cfg.request.body = Some(map(json!({
            "account": "%{acct}",
            "version": "%{ver}",
            "max": "%{max}"
        })));
        let request = RequestTemplate::from_config(&cfg)
            .build(&event(json!({
                "acct": "123456789012345678901234",
                "ver": "1.10",
                "max": "18446744073709551615"
            })))
            .unwrap();

        let body = request.body.as_deref().unwrap();
        assert!(body.contains(r#""account":"123456789012345678901234""#));
        assert!(body.contains(r#""version":"1.10""#));
        assert!(body.contains(r#""max":18446744073709551615"#));
    }

    #[test]
    fn test_numeric_helper() {
        assert_eq!(numeric("10"), Some(json!(10)));
        assert_eq!(numeric("-2.5"), Some(json!(-2.5)));
        assert_eq!(numeric("007"), None);
        assert_eq!(numeric(" 1"), None);
        assert_eq!(numeric("true"), None);
        assert_eq!(numeric(""), None);
        assert_eq!(numeric("1.10"), None);
        assert_eq!(numeric("1e3"), None);
        assert_eq!(numeric("123456789012345678901234"), None);
        assert_eq!(numeric("0.25"), Some(json!(0.25)));
    }
}

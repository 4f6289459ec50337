use aws_config::BehaviorVersion;
use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::alb::{AlbTargetGroupRequest, AlbTargetGroupResponse};
use aws_sdk_dynamodb as ddb;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue};

use crate::config::Config;
use crate::model::Redirect;
use crate::resolve;
use crate::store::{LookupOutcome, RedirectStore};

#[derive(Clone)]
pub struct Ctx {
    pub store: RedirectStore,
    pub config: Config,
}

impl Ctx {
    pub async fn new(config: Config) -> Self {
        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let store = RedirectStore::new(ddb::Client::new(&aws), config.table.clone());
        Self { store, config }
    }
}

/// Resolve one ALB request into a redirect response.
///
/// Never fails: a lookup miss or store error degrades to the configured
/// default destination.
pub async fn handle(event: AlbTargetGroupRequest, ctx: &Ctx) -> AlbTargetGroupResponse {
    let (host, path) = request_parts(&event);
    tracing::debug!(
        host = host.as_deref().unwrap_or("-"),
        %path,
        "resolving redirect"
    );
    let location = resolve_location(ctx, host.as_deref(), &path).await;
    render(&ctx.config.redirect(location))
}

fn request_parts(event: &AlbTargetGroupRequest) -> (Option<String>, String) {
    let raw = event.path.clone().unwrap_or_else(|| "/".to_string());
    let path = if raw.len() > 1 {
        resolve::sanitize_path(&raw)
    } else {
        raw
    };
    let host = event
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (host, path)
}

async fn resolve_location(ctx: &Ctx, host: Option<&str>, path: &str) -> String {
    let cfg = &ctx.config;

    // Strip mode: static rewrite onto the default host, table never queried.
    if let Some(rule) = &cfg.path_strip {
        let stripped = resolve::strip_path(rule, path);
        return resolve::redirect_location(&cfg.scheme, &cfg.default_host, &stripped);
    }

    let fallback = resolve::redirect_location(&cfg.scheme, &cfg.default_host, &cfg.default_path);
    let Some(host) = host else {
        return fallback;
    };

    match ctx.store.lookup(host, path).await {
        LookupOutcome::Hit(rec) => {
            tracing::debug!(site = %host, uri = %path, location = %rec.redirect_to, hits = rec.hit_count, "redirect hit");
            rec.redirect_to
        }
        LookupOutcome::Miss => {
            tracing::debug!(site = %host, uri = %path, "no redirect record");
            fallback
        }
        LookupOutcome::StoreError(detail) => {
            tracing::debug!(site = %host, uri = %path, error = %detail, "lookup failed, using default");
            fallback
        }
    }
}

fn render(redirect: &Redirect) -> AlbTargetGroupResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    match HeaderValue::from_str(&redirect.location) {
        Ok(v) => {
            headers.insert(LOCATION, v);
        }
        Err(_) => {
            tracing::warn!(location = %redirect.location, "redirect target is not a valid header value");
        }
    }
    if let Some(cc) = &redirect.cache_control {
        if let Ok(v) = HeaderValue::from_str(cc) {
            headers.insert(CACHE_CONTROL, v);
        }
    }

    AlbTargetGroupResponse {
        status_code: i64::from(redirect.status_code),
        status_description: Some(redirect.status_description.clone()),
        headers,
        multi_value_headers: HeaderMap::new(),
        body: Some(Body::Empty),
        is_base64_encoded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::status_description;
    use regex::Regex;
    use serde_json::json;

    fn config(path_strip: Option<&str>) -> Config {
        Config {
            table: "redirects".to_string(),
            default_host: "www.example.com".to_string(),
            default_path: "/".to_string(),
            scheme: "https".to_string(),
            redirect_code: 301,
            redirect_desc: status_description(301),
            cache_max_age: Some(600),
            path_strip: path_strip.map(|src| Regex::new(src).unwrap()),
            debug: false,
        }
    }

    // A client that would fail any request it sent; the tests below only
    // exercise paths that never reach the store.
    fn offline_ctx(config: Config) -> Ctx {
        let conf = ddb::Config::builder()
            .behavior_version(ddb::config::BehaviorVersion::latest())
            .build();
        Ctx {
            store: RedirectStore::new(ddb::Client::from_conf(conf), config.table.clone()),
            config,
        }
    }

    fn alb_request(v: serde_json::Value) -> AlbTargetGroupRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn parts_default_and_sanitize() {
        let event = alb_request(json!({
            "requestContext": {"elb": {"targetGroupArn": "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/redirects/abc"}},
            "httpMethod": "GET",
            "path": "/a//b///c/",
            "queryStringParameters": {},
            "headers": {"host": "legacy.example.com"},
            "body": "",
            "isBase64Encoded": false
        }));
        let (host, path) = request_parts(&event);
        assert_eq!(host.as_deref(), Some("legacy.example.com"));
        assert_eq!(path, "/a/b/c");
    }

    #[test]
    fn parts_without_path_or_host() {
        let event = alb_request(json!({
            "requestContext": {"elb": {"targetGroupArn": "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/redirects/abc"}},
            "httpMethod": "GET",
            "path": null,
            "queryStringParameters": {},
            "headers": {},
            "body": "",
            "isBase64Encoded": false
        }));
        let (host, path) = request_parts(&event);
        assert_eq!(host, None);
        assert_eq!(path, "/");
    }

    #[tokio::test]
    async fn strip_mode_never_touches_the_store() {
        let ctx = offline_ctx(config(Some("/en-us/?")));
        let location = resolve_location(&ctx, Some("legacy.example.com"), "/en-us/products").await;
        assert_eq!(location, "https://www.example.com/products");
    }

    #[tokio::test]
    async fn strip_mode_passes_unmatched_paths_through() {
        let ctx = offline_ctx(config(Some("/en-us/?")));
        let location = resolve_location(&ctx, None, "/products").await;
        assert_eq!(location, "https://www.example.com/products");
    }

    #[tokio::test]
    async fn missing_host_falls_back_to_default() {
        let ctx = offline_ctx(config(None));
        let location = resolve_location(&ctx, None, "/p").await;
        assert_eq!(location, "https://www.example.com/");
    }

    #[test]
    fn renders_redirect_headers() {
        let resp = render(&Redirect {
            status_code: 301,
            status_description: "Moved Permanently".to_string(),
            location: "https://www.example.com/q".to_string(),
            cache_control: Some("max-age=600, public".to_string()),
        });
        assert_eq!(resp.status_code, 301);
        assert_eq!(resp.status_description.as_deref(), Some("Moved Permanently"));
        assert!(!resp.is_base64_encoded);
        assert_eq!(resp.headers.get("content-type").unwrap(), "text/html");
        assert_eq!(
            resp.headers.get("location").unwrap(),
            "https://www.example.com/q"
        );
        assert_eq!(
            resp.headers.get("cache-control").unwrap(),
            "max-age=600, public"
        );
    }

    #[test]
    fn renders_without_cache_control() {
        let resp = render(&Redirect {
            status_code: 302,
            status_description: "Found".to_string(),
            location: "/q".to_string(),
            cache_control: None,
        });
        assert_eq!(resp.status_code, 302);
        assert!(resp.headers.get("cache-control").is_none());
        assert_eq!(resp.headers.get("location").unwrap(), "/q");
    }
}

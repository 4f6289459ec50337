// =============================================
// Process configuration
// =============================================
// Both Lambdas read their configuration from the environment exactly once,
// at startup, into an immutable struct that is passed by reference into
// every invocation. A missing or unparsable required variable aborts the
// process before the runtime starts polling for events.
//
// redirectd:
//   DYNAMO_DB_TABLE          : redirects table name (required)
//   DEFAULT_DESTINATION_HOST : host to redirect to when nothing matches (required)
//   DEFAULT_DESTINATION_PATH : path to redirect to when nothing matches (required)
//   DEFAULT_HTTP_SCHEME      : http or https (default https)
//   DEFAULT_REDIRECT_CODE    : redirect status to issue (default 301)
//   DEFAULT_CACHE_MAX_AGE    : seconds a 301 may be cached (optional)
//   PATH_STRIP               : regex prefix to strip, e.g. `/en-us/?`;
//                              when set the table is never consulted
//   DEBUG                    : truthy string enables debug diagnostics
//
// importer:
//   DYNAMO_DB_TABLE          : redirects table name (required)
//   S3_BUCKET_ARN            : bucket allowed to trigger imports (required)
//   DEBUG                    : truthy string enables debug diagnostics

use crate::model::Redirect;
use crate::resolve::status_description;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct Config {
    pub table: String,
    pub default_host: String,
    pub default_path: String,
    pub scheme: String,
    pub redirect_code: u16,
    pub redirect_desc: String,
    pub cache_max_age: Option<u64>,
    pub path_strip: Option<Regex>,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let table = std::env::var("DYNAMO_DB_TABLE").expect("DYNAMO_DB_TABLE");
        let default_host =
            std::env::var("DEFAULT_DESTINATION_HOST").expect("DEFAULT_DESTINATION_HOST");
        let default_path =
            std::env::var("DEFAULT_DESTINATION_PATH").expect("DEFAULT_DESTINATION_PATH");
        let scheme =
            std::env::var("DEFAULT_HTTP_SCHEME").unwrap_or_else(|_| "https".to_string());
        let redirect_code = match std::env::var("DEFAULT_REDIRECT_CODE") {
            Ok(s) => s
                .parse()
                .unwrap_or_else(|_| panic!("DEFAULT_REDIRECT_CODE is not a status code: {s}")),
            Err(_) => 301,
        };
        let cache_max_age = std::env::var("DEFAULT_CACHE_MAX_AGE").ok().map(|s| {
            s.parse()
                .unwrap_or_else(|_| panic!("DEFAULT_CACHE_MAX_AGE is not a number: {s}"))
        });
        let path_strip = std::env::var("PATH_STRIP").ok().map(|src| {
            Regex::new(&src).unwrap_or_else(|e| panic!("PATH_STRIP is not a valid regex: {e}"))
        });

        Self {
            table,
            default_host,
            default_path,
            scheme,
            redirect_desc: status_description(redirect_code),
            redirect_code,
            cache_max_age,
            path_strip,
            debug: debug_from_env(),
        }
    }

    /// Response plan for a resolved location.
    pub fn redirect(&self, location: String) -> Redirect {
        Redirect {
            status_code: self.redirect_code,
            status_description: self.redirect_desc.clone(),
            location,
            cache_control: self.cache_control(),
        }
    }

    fn cache_control(&self) -> Option<String> {
        match self.cache_max_age {
            Some(secs) if self.redirect_code == 301 => Some(format!("max-age={secs}, public")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImporterConfig {
    pub table: String,
    pub bucket_arn: String,
    pub debug: bool,
}

impl ImporterConfig {
    pub fn from_env() -> Self {
        Self {
            table: std::env::var("DYNAMO_DB_TABLE").expect("DYNAMO_DB_TABLE"),
            bucket_arn: std::env::var("S3_BUCKET_ARN").expect("S3_BUCKET_ARN"),
            debug: debug_from_env(),
        }
    }
}

fn debug_from_env() -> bool {
    std::env::var("DEBUG").map(|v| truthy(&v)).unwrap_or(false)
}

pub fn truthy(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "yes" | "true" | "t" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(code: u16, max_age: Option<u64>) -> Config {
        Config {
            table: "redirects".to_string(),
            default_host: "www.example.com".to_string(),
            default_path: "/".to_string(),
            scheme: "https".to_string(),
            redirect_code: code,
            redirect_desc: status_description(code),
            cache_max_age: max_age,
            path_strip: None,
            debug: false,
        }
    }

    #[test]
    fn truthy_strings() {
        for v in ["yes", "True", "T", "1", "TRUE"] {
            assert!(truthy(v), "{v} should be truthy");
        }
        for v in ["no", "0", "false", "", "on"] {
            assert!(!truthy(v), "{v} should not be truthy");
        }
    }

    #[test]
    fn cache_control_for_cacheable_301() {
        let plan = config(301, Some(600)).redirect("/q".to_string());
        assert_eq!(plan.cache_control.as_deref(), Some("max-age=600, public"));
    }

    #[test]
    fn no_cache_control_for_302() {
        let plan = config(302, Some(600)).redirect("/q".to_string());
        assert_eq!(plan.cache_control, None);
    }

    #[test]
    fn no_cache_control_without_max_age() {
        let plan = config(301, None).redirect("/q".to_string());
        assert_eq!(plan.cache_control, None);
    }

    #[test]
    fn redirect_carries_configured_status() {
        let plan = config(302, None).redirect("https://new.example.com/".to_string());
        assert_eq!(plan.status_code, 302);
        assert_eq!(plan.status_description, "Found");
        assert_eq!(plan.location, "https://new.example.com/");
    }
}

use serde::Serialize;

// Attribute names in the redirects table. The table predates this code; the
// names are part of its schema and must not drift.
//   PK: Site (S), SK: URI (S)
//   RedirectLocation (S), HitCount (N), LastHit (S "YYYY-MM-DD HH:MM:SS")
pub const ATTR_SITE: &str = "Site";
pub const ATTR_URI: &str = "URI";
pub const ATTR_REDIRECT_LOCATION: &str = "RedirectLocation";
pub const ATTR_HIT_COUNT: &str = "HitCount";
pub const ATTR_LAST_HIT: &str = "LastHit";

#[derive(Debug, Clone, PartialEq)]
pub struct RedirectRecord {
    pub site: String,
    /// Normalized request path: no duplicate slashes, no trailing slash.
    pub uri: String,
    pub redirect_to: String,
    pub hit_count: u64,
    /// Absent until the record is matched for the first time.
    pub last_hit: Option<String>,
}

/// Per-request response plan, computed before anything is rendered to the
/// ALB wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub status_code: u16,
    pub status_description: String,
    pub location: String,
    /// Only set for 301s when a cache max-age is configured.
    pub cache_control: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    #[serde(rename = "NumRecordsImported")]
    pub num_records_imported: usize,
    #[serde(rename = "FilesProcessed")]
    pub files_processed: Vec<String>,
}

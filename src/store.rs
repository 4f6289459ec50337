use std::collections::HashMap;

use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::error::ProvideErrorMetadata; // for .code()
use aws_sdk_dynamodb::types::ReturnValue;
use chrono::{DateTime, Utc};
use ddb::types::AttributeValue as Av;

use crate::model::{self, RedirectRecord};

/// What a lookup came back with. The fall-back-to-default decision is an
/// explicit branch over this tag in the handler, never an ignored error.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Hit(RedirectRecord),
    Miss,
    StoreError(String),
}

#[derive(Clone)]
pub struct RedirectStore {
    client: ddb::Client,
    table: String,
}

impl RedirectStore {
    pub fn new(client: ddb::Client, table: String) -> Self {
        Self { client, table }
    }

    /// Look up `(site, uri)` and bump its counters in one atomic round trip.
    ///
    /// The condition keeps a miss from materializing a record, and
    /// `if_not_exists` lets freshly imported records (which carry no
    /// `HitCount` yet) count from zero on their first hit.
    pub async fn lookup(&self, site: &str, uri: &str) -> LookupOutcome {
        let r = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(model::ATTR_SITE, Av::S(site.to_string()))
            .key(model::ATTR_URI, Av::S(uri.to_string()))
            .update_expression("SET HitCount = if_not_exists(HitCount, :z) + :i, LastHit = :l")
            .condition_expression("attribute_exists(#s) AND attribute_exists(#u)")
            .expression_attribute_names("#s", model::ATTR_SITE)
            .expression_attribute_names("#u", model::ATTR_URI)
            .expression_attribute_values(":z", Av::N("0".into()))
            .expression_attribute_values(":i", Av::N("1".into()))
            .expression_attribute_values(":l", Av::S(last_hit_stamp(Utc::now())))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match r {
            Ok(out) => {
                let attrs = out.attributes.unwrap_or_default();
                match record_from_attrs(&attrs) {
                    Some(rec) => LookupOutcome::Hit(rec),
                    None => {
                        LookupOutcome::StoreError("record has no RedirectLocation".to_string())
                    }
                }
            }
            Err(e) => {
                if e.code() == Some("ConditionalCheckFailedException") {
                    return LookupOutcome::Miss;
                }
                LookupOutcome::StoreError(format!(
                    "ddb update: {} {}",
                    e.code().unwrap_or("unknown"),
                    e.message().unwrap_or("")
                ))
            }
        }
    }

    /// Create-or-update the redirect for `(site, uri)`.
    ///
    /// Touches only `RedirectLocation`; `HitCount`/`LastHit` stay absent on
    /// first creation and untouched on update.
    pub async fn upsert(&self, site: &str, uri: &str, redirect_to: &str) -> Result<(), String> {
        self.client
            .update_item()
            .table_name(&self.table)
            .key(model::ATTR_SITE, Av::S(site.to_string()))
            .key(model::ATTR_URI, Av::S(uri.to_string()))
            .update_expression("SET RedirectLocation = :l")
            .expression_attribute_values(":l", Av::S(redirect_to.to_string()))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| {
                format!(
                    "ddb update: {} {}",
                    e.code().unwrap_or("unknown"),
                    e.message().unwrap_or("")
                )
            })
    }
}

pub fn last_hit_stamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn record_from_attrs(attrs: &HashMap<String, Av>) -> Option<RedirectRecord> {
    let redirect_to = attrs
        .get(model::ATTR_REDIRECT_LOCATION)?
        .as_s()
        .ok()?
        .clone();
    let site = attrs
        .get(model::ATTR_SITE)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default();
    let uri = attrs
        .get(model::ATTR_URI)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default();
    let hit_count = attrs
        .get(model::ATTR_HIT_COUNT)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);
    let last_hit = attrs
        .get(model::ATTR_LAST_HIT)
        .and_then(|v| v.as_s().ok())
        .cloned();

    Some(RedirectRecord {
        site,
        uri,
        redirect_to,
        hit_count,
        last_hit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attrs(pairs: &[(&str, Av)]) -> HashMap<String, Av> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn stamp_is_second_resolution_utc() {
        let t = Utc.with_ymd_and_hms(2026, 3, 9, 17, 5, 2).unwrap();
        assert_eq!(last_hit_stamp(t), "2026-03-09 17:05:02");
    }

    #[test]
    fn decodes_full_record() {
        let attrs = attrs(&[
            (model::ATTR_SITE, Av::S("a.com".into())),
            (model::ATTR_URI, Av::S("/p".into())),
            (model::ATTR_REDIRECT_LOCATION, Av::S("/q".into())),
            (model::ATTR_HIT_COUNT, Av::N("12".into())),
            (model::ATTR_LAST_HIT, Av::S("2026-03-09 17:05:02".into())),
        ]);
        let rec = record_from_attrs(&attrs).unwrap();
        assert_eq!(rec.site, "a.com");
        assert_eq!(rec.uri, "/p");
        assert_eq!(rec.redirect_to, "/q");
        assert_eq!(rec.hit_count, 12);
        assert_eq!(rec.last_hit.as_deref(), Some("2026-03-09 17:05:02"));
    }

    #[test]
    fn counters_default_when_absent() {
        let attrs = attrs(&[
            (model::ATTR_SITE, Av::S("a.com".into())),
            (model::ATTR_URI, Av::S("/p".into())),
            (model::ATTR_REDIRECT_LOCATION, Av::S("/q".into())),
        ]);
        let rec = record_from_attrs(&attrs).unwrap();
        assert_eq!(rec.hit_count, 0);
        assert_eq!(rec.last_hit, None);
    }

    #[test]
    fn record_without_target_is_rejected() {
        let attrs = attrs(&[
            (model::ATTR_SITE, Av::S("a.com".into())),
            (model::ATTR_URI, Av::S("/p".into())),
        ]);
        assert!(record_from_attrs(&attrs).is_none());
    }
}

// =============================================
// Redirect table import
// =============================================
// Triggered by S3 object-created notifications. Each named object is a
// header-less CSV with the fixed column order
//
//   site, from_uri, redirect_to
//
// and every row becomes one upsert into the redirects table. A bad row (or
// a whole unfetchable object) is logged and skipped; the batch always runs
// to completion and reports a summary.

use aws_lambda_events::event::s3::{S3Entity, S3Event};
use aws_sdk_s3::Client as S3Client;

use crate::config::ImporterConfig;
use crate::model::ImportSummary;
use crate::store::RedirectStore;

#[derive(Clone)]
pub struct ImportCtx {
    pub store: RedirectStore,
    pub s3: S3Client,
    pub config: ImporterConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub site: String,
    /// Stored with trailing slashes stripped, matching lookup normalization.
    pub from_uri: String,
    pub redirect_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Imported,
    Failed(String),
}

/// Process one notification batch. Every named object contributes to
/// `FilesProcessed`, whether or not anything was imported from it.
pub async fn process_event(event: S3Event, ctx: &ImportCtx) -> ImportSummary {
    let mut num_records_imported = 0;
    let mut files_processed = Vec::new();

    for record in &event.records {
        files_processed.push(format!(
            "{}/{}",
            record.s3.bucket.arn.as_deref().unwrap_or_default(),
            record.s3.object.key.as_deref().unwrap_or_default()
        ));
        num_records_imported += import_entity(&record.s3, ctx).await;
    }

    ImportSummary {
        num_records_imported,
        files_processed,
    }
}

async fn import_entity(entity: &S3Entity, ctx: &ImportCtx) -> usize {
    let bucket_arn = entity.bucket.arn.as_deref().unwrap_or_default();
    let bucket = entity.bucket.name.as_deref().unwrap_or_default();
    let key = entity.object.key.as_deref().unwrap_or_default();

    // Guard against a misconfigured trigger pointing at some other bucket.
    if bucket_arn != ctx.config.bucket_arn {
        tracing::warn!(bucket = %bucket_arn, key = %key, "skipping object from unexpected bucket");
        return 0;
    }

    let content = match fetch_object(&ctx.s3, bucket, key).await {
        Ok(c) => c,
        Err(detail) => {
            tracing::warn!(bucket = %bucket, key = %key, error = %detail, "failed to fetch object, skipping");
            return 0;
        }
    };

    let mut imported = 0;
    for outcome in import_rows(&ctx.store, &content).await {
        match outcome {
            RowOutcome::Imported => imported += 1,
            RowOutcome::Failed(reason) => {
                tracing::warn!(key = %key, %reason, "row not imported");
            }
        }
    }
    tracing::info!(bucket = %bucket, key = %key, imported, "imported redirect records");
    imported
}

async fn fetch_object(s3: &S3Client, bucket: &str, key: &str) -> Result<String, String> {
    let resp = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| format!("s3 get: {e}"))?;
    let data = resp
        .body
        .collect()
        .await
        .map_err(|e| format!("s3 body: {e}"))?;
    String::from_utf8(data.into_bytes().to_vec()).map_err(|e| format!("object is not utf-8: {e}"))
}

/// Upsert every parsed row, in order. One failed row does not stop the rest.
async fn import_rows(store: &RedirectStore, content: &str) -> Vec<RowOutcome> {
    let mut outcomes = Vec::new();
    for parsed in parse_rows(content) {
        outcomes.push(match parsed {
            Ok(row) => match store
                .upsert(&row.site, &row.from_uri, &row.redirect_to)
                .await
            {
                Ok(()) => RowOutcome::Imported,
                Err(detail) => RowOutcome::Failed(detail),
            },
            Err(detail) => RowOutcome::Failed(detail),
        });
    }
    outcomes
}

pub fn parse_rows(content: &str) -> Vec<Result<ImportRow, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 1;
        rows.push(match record {
            Ok(rec) => parse_row(&rec).map_err(|why| format!("line {line}: {why}")),
            Err(e) => Err(format!("line {line}: {e}")),
        });
    }
    rows
}

fn parse_row(rec: &csv::StringRecord) -> Result<ImportRow, String> {
    let site = rec.get(0).unwrap_or_default().to_string();
    let from_uri = rec
        .get(1)
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();
    let redirect_to = rec.get(2).unwrap_or_default().to_string();

    // Empty key attributes would be rejected by the table anyway.
    if site.is_empty() {
        return Err("missing site".to_string());
    }
    if from_uri.is_empty() {
        return Err("missing from_uri".to_string());
    }

    Ok(ImportRow {
        site,
        from_uri,
        redirect_to,
    })
}

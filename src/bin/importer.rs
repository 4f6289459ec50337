use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use aws_sdk_dynamodb::Client as DdbClient;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use redirectd::config::ImporterConfig;
use redirectd::import::{self, ImportCtx};
use redirectd::store::RedirectStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ImporterConfig::from_env();

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let ctx = ImportCtx {
        store: RedirectStore::new(DdbClient::new(&aws), config.table.clone()),
        s3: S3Client::new(&aws),
        config,
    };

    let ctx_for_service = ctx.clone();

    run(service_fn(move |event: LambdaEvent<S3Event>| {
        let ctx = ctx_for_service.clone();
        async move { Ok::<_, Error>(import::process_event(event.payload, &ctx).await) }
    }))
    .await
}

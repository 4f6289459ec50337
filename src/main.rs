use aws_lambda_events::event::alb::AlbTargetGroupRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use redirectd::config::Config;
use redirectd::handler::{self, Ctx};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env();

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    let ctx = Ctx::new(config).await;

    // Clone once for the service closure; cheap (Client is Clone)
    let ctx_for_service = ctx.clone();

    run(service_fn(move |event: LambdaEvent<AlbTargetGroupRequest>| {
        let ctx = ctx_for_service.clone();
        async move { Ok::<_, Error>(handler::handle(event.payload, &ctx).await) }
    }))
    .await
}

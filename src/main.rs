use membercard::{
    configuration::get_configuration,
    startup,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = get_configuration()?;

    let subscriber = get_subscriber(
        "membercard".into(),
        cfg.telemetry.filter.clone(),
        cfg.telemetry.otlp_endpoint.as_deref(),
        std::io::stdout,
    )?;
    init_subscriber(subscriber)?;

    let result = startup::run(cfg).await;
    opentelemetry::global::shutdown_tracer_provider();
    result
}

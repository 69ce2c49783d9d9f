use postern::{build_client, serve, shutdown_signal, Config, Gateway, UpstreamClient};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE_PATH: &str = "./Config.yml";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load_from_file(CONFIG_FILE_PATH)
        .and_then(|c| c.into_runtime())
        .unwrap_or_else(|e| {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        });

    let http = build_client(&config);
    let gateway = Gateway::new(UpstreamClient::new(http, &config));

    let listener = TcpListener::bind(config.listen).await.unwrap_or_else(|e| {
        eprintln!("fatal: failed to bind {}: {e}", config.listen);
        std::process::exit(1);
    });

    info!(
        listen = %config.listen,
        posts = %config.post_base,
        comments = %config.comment_base,
        "gateway listening"
    );

    serve(listener, gateway, shutdown_signal()).await;
}

use classlm_vocab::Pipeline;
use std::process;
use tracing::error;

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = Pipeline::run() {
        error!("{}", e);
        process::exit(1);
    }
}

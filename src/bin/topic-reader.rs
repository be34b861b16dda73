use anyhow::Result;
use clap::Parser;
use topic_reader::{config::RunConfig, shell, signal::shutdown_token};
use topic_reader_kafka::{KafkaConnectOptions, KafkaSession};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::parse();
    let cancel = shutdown_token()?;

    let mut options: KafkaConnectOptions = config.connect_options()?;
    for (k, v) in config.client_options.iter() {
        options.set_client_option(k, v);
    }

    let mut stdout = std::io::stdout();
    match shell::start::<KafkaSession, _>(
        config.endpoint(),
        options,
        &config.settings(),
        &cancel,
        &mut stdout,
    )
    .await
    {
        Ok(stats) => {
            log::debug!("{stats:?}");
            Ok(())
        }
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    }
}

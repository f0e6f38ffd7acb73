//! userbook server binary.
//!
//! ```bash
//! userbook --listen 0.0.0.0:3000
//! USERBOOK_TOKEN=s3cret RUST_LOG=debug userbook --log-format text
//!
//! curl -H 'Authorization: Bearer demo-token' http://localhost:3000/users/1
//! ```

use std::io::IsTerminal;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use userbook::config::{Config, LogFormat};
use userbook::users::UserStore;
use userbook::{Server, app};

#[tokio::main]
async fn main() -> Result<(), userbook::Error> {
    let config = Config::parse();
    init_logging(config.log_format);

    if config.token == userbook::DEFAULT_TOKEN {
        tracing::warn!("using the built-in demo token; set --token or USERBOOK_TOKEN");
    }

    let store = Arc::new(UserStore::seeded());
    Server::bind(config.listen)
        .serve(app(store, &config.token))
        .await
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}

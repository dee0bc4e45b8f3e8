use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{eyre, Context, Error};
use log::info;

const DEFAULT_TOPIC_FILTER: &str = "scheduler_attendance";
const DEFAULT_LOG: &str = "info";

#[derive(Clone, Debug)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone, Debug)]
pub struct EnvInner {
    api_url: String,
    push_topic_filter: String,
    request_timeout_secs: Option<u64>,
    rust_log: String,
}

impl Env {
    pub fn api_url(&self) -> &str {
        &self.0.api_url
    }

    pub fn push_topic_filter(&self) -> &str {
        &self.0.push_topic_filter
    }

    pub fn request_timeout_secs(&self) -> Option<u64> {
        self.0.request_timeout_secs
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("Failed to load .env file: {}", err);
        }
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Env, Error> {
        let timeout = lookup("SCHOOL_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("SCHOOL_REQUEST_TIMEOUT_SECS is invalid: {}", raw))
            })
            .transpose()?;

        Ok(Env(Arc::new(EnvInner {
            api_url: lookup("SCHOOL_API_URL").ok_or_else(|| eyre!("SCHOOL_API_URL is not set"))?,
            push_topic_filter: lookup("SCHOOL_PUSH_TOPIC_FILTER")
                .unwrap_or_else(|| DEFAULT_TOPIC_FILTER.to_string()),
            request_timeout_secs: timeout,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG.to_string()),
        })))
    }
}

/// Installs the logger once; later calls are ignored.
pub fn init_logger(env: &Env) {
    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(env.rust_log())
        .try_init();
}

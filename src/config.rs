use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::{
    domain::models::MessageTemplate,
    infrastructure::{
        mail::smtp::{SmtpConfig, SmtpTls},
        messaging::jetstream::JetstreamConfig,
    },
};

const ACK_WAIT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("An error occured while parsing {name} env param: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// HTTP API and in-process workers.
    All,
    Api,
    Worker,
}

impl RunMode {
    pub fn serves_api(self) -> bool {
        matches!(self, RunMode::All | RunMode::Api)
    }

    pub fn runs_workers(self) -> bool {
        matches!(self, RunMode::All | RunMode::Worker)
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(RunMode::All),
            "api" => Ok(RunMode::Api),
            "worker" => Ok(RunMode::Worker),
            other => Err(format!("unknown run mode {other:?}")),
        }
    }
}

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub run_mode: RunMode,
    /// `APP_ENV=production` switches logs to JSON.
    pub production: bool,
    /// JetStream backs the queue and status store when set; otherwise both
    /// live in this process.
    pub jetstream: Option<JetstreamConfig>,
    pub status_bucket: String,
    pub status_retention: Duration,
    pub worker_concurrency: usize,
    pub enqueue_timeout: Duration,
    pub poll_interval: Duration,
    pub max_stream_wait: Option<Duration>,
    pub smtp: SmtpConfig,
    pub template: MessageTemplate,
    pub audit_log_path: Option<String>,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let env = Env(&lookup);

        let run_mode = env.parse("RUN_MODE", RunMode::All)?;
        if run_mode == RunMode::Worker && env.get("NATS_URL").is_none() {
            return Err(ConfigError::Invalid {
                name: "RUN_MODE",
                reason: "worker mode needs NATS_URL so tasks can come from another process"
                    .to_string(),
            });
        }

        let smtp_timeout = Duration::from_secs(env.parse("SMTP_TIMEOUT_SECONDS", 30)?);

        let jetstream = match env.get("NATS_URL") {
            Some(url) => {
                let ack_wait_seconds: u64 = env.parse("JETSTREAM_ACK_WAIT_SECONDS", 60)?;
                // A delivery must stay owned by its worker for the whole send.
                let min_ack_wait = smtp_timeout.saturating_add(ACK_WAIT_MARGIN);
                if Duration::from_secs(ack_wait_seconds) < min_ack_wait {
                    return Err(ConfigError::Invalid {
                        name: "JETSTREAM_ACK_WAIT_SECONDS",
                        reason: format!(
                            "must be at least {}s (SMTP_TIMEOUT_SECONDS plus {}s)",
                            min_ack_wait.as_secs(),
                            ACK_WAIT_MARGIN.as_secs()
                        ),
                    });
                }

                Some(JetstreamConfig {
                    url,
                    stream: env.string("JETSTREAM_STREAM", "EMAIL_TASKS"),
                    subject: env.string("JETSTREAM_SUBJECT", "email.tasks.send"),
                    durable: env.string("JETSTREAM_DURABLE", "email-workers"),
                    ack_wait_seconds,
                    max_deliver: env.parse("JETSTREAM_MAX_DELIVER", 5)?,
                    fetch_expiry: Duration::from_secs(5),
                })
            }
            None => None,
        };

        let smtp_username = env.string("SMTP_USERNAME", "");
        let smtp_tls = match env.string("SMTP_TLS", "implicit").as_str() {
            "implicit" => SmtpTls::Implicit,
            "starttls" => SmtpTls::StartTls,
            "none" => SmtpTls::None,
            other => {
                return Err(ConfigError::Invalid {
                    name: "SMTP_TLS",
                    reason: format!("expected implicit, starttls or none, got {other:?}"),
                });
            }
        };

        let worker_concurrency: usize = env.parse("WORKER_CONCURRENCY", 1)?;
        if worker_concurrency == 0 && run_mode == RunMode::Worker {
            return Err(ConfigError::Invalid {
                name: "WORKER_CONCURRENCY",
                reason: "worker mode needs at least one worker".to_string(),
            });
        }

        let poll_interval_ms: u64 = env.parse("STATUS_POLL_INTERVAL_MS", 1000)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "STATUS_POLL_INTERVAL_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_wait_seconds: u64 = env.parse("STATUS_MAX_WAIT_SECONDS", 300)?;
        let defaults = MessageTemplate::default();

        Ok(Config {
            port: env.parse("PORT", 3000)?,
            scheme: env.string("SCHEME", "http"),
            host: env.string("HOST", "localhost"),
            run_mode,
            production: env.get("APP_ENV").as_deref() == Some("production"),
            jetstream,
            status_bucket: env.string("STATUS_BUCKET", "email_task_status"),
            status_retention: Duration::from_secs(env.parse("STATUS_RETENTION_SECONDS", 3600)?),
            worker_concurrency,
            enqueue_timeout: Duration::from_millis(env.parse("ENQUEUE_TIMEOUT_MS", 5000)?),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_stream_wait: (max_wait_seconds > 0).then(|| Duration::from_secs(max_wait_seconds)),
            smtp: SmtpConfig {
                host: env.string("SMTP_HOST", "localhost"),
                port: env.parse("SMTP_PORT", 465)?,
                username: smtp_username.clone(),
                password: env.string("SMTP_PASSWORD", ""),
                tls: smtp_tls,
                timeout: smtp_timeout,
            },
            template: MessageTemplate {
                from: env.get("MAIL_FROM").unwrap_or(smtp_username),
                subject: env.string("MAIL_SUBJECT", &defaults.subject),
                body: env.string("MAIL_BODY", &defaults.body),
            },
            audit_log_path: env.get("AUDIT_LOG_PATH"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.get(name) {
            Some(raw) => raw.parse::<T>().map_err(|err| ConfigError::Invalid {
                name,
                reason: err.to_string(),
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_run_everything_in_process() {
        let config = parse(&[]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.run_mode, RunMode::All);
        assert!(config.jetstream.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_stream_wait, Some(Duration::from_secs(300)));
        assert_eq!(config.smtp.tls, SmtpTls::Implicit);
        assert_eq!(config.template.subject, "Test Email");
        assert_eq!(config.server_url(), "http://localhost:3000");
    }

    #[test]
    fn sender_defaults_to_smtp_username() {
        let config = parse(&[("SMTP_USERNAME", "bot@example.com")]).unwrap();
        assert_eq!(config.template.from, "bot@example.com");

        let config = parse(&[
            ("SMTP_USERNAME", "bot@example.com"),
            ("MAIL_FROM", "noreply@example.com"),
        ])
        .unwrap();
        assert_eq!(config.template.from, "noreply@example.com");
    }

    #[test]
    fn nats_url_enables_jetstream() {
        let config = parse(&[
            ("NATS_URL", "nats://localhost:4222"),
            ("JETSTREAM_MAX_DELIVER", "3"),
        ])
        .unwrap();

        let jetstream = config.jetstream.unwrap();
        assert_eq!(jetstream.url, "nats://localhost:4222");
        assert_eq!(jetstream.max_deliver, 3);
        assert_eq!(jetstream.subject, "email.tasks.send");
    }

    #[test]
    fn zero_max_wait_disables_escape_hatch() {
        let config = parse(&[("STATUS_MAX_WAIT_SECONDS", "0")]).unwrap();
        assert_eq!(config.max_stream_wait, None);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = parse(&[("PORT", "eighty")]).err().unwrap();
        assert!(err.to_string().contains("PORT"));

        let err = parse(&[("SMTP_TLS", "sometimes")]).err().unwrap();
        assert!(err.to_string().contains("SMTP_TLS"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = parse(&[("STATUS_POLL_INTERVAL_MS", "0")]).err().unwrap();
        assert!(err.to_string().contains("STATUS_POLL_INTERVAL_MS"));

        let config = parse(&[("STATUS_POLL_INTERVAL_MS", "250")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn ack_wait_must_cover_the_smtp_timeout() {
        let err = parse(&[
            ("NATS_URL", "nats://localhost:4222"),
            ("JETSTREAM_ACK_WAIT_SECONDS", "5"),
            ("SMTP_TIMEOUT_SECONDS", "30"),
        ])
        .err()
        .unwrap();
        assert!(err.to_string().contains("JETSTREAM_ACK_WAIT_SECONDS"));

        let err = parse(&[
            ("NATS_URL", "nats://localhost:4222"),
            ("JETSTREAM_ACK_WAIT_SECONDS", "30"),
            ("SMTP_TIMEOUT_SECONDS", "30"),
        ])
        .err()
        .unwrap();
        assert!(err.to_string().contains("at least 35s"));

        let config = parse(&[
            ("NATS_URL", "nats://localhost:4222"),
            ("JETSTREAM_ACK_WAIT_SECONDS", "35"),
            ("SMTP_TIMEOUT_SECONDS", "30"),
        ])
        .unwrap();
        assert_eq!(config.jetstream.unwrap().ack_wait_seconds, 35);
        assert_eq!(config.smtp.timeout, Duration::from_secs(30));
    }

    #[test]
    fn ack_wait_is_not_checked_without_nats() {
        let config = parse(&[
            ("JETSTREAM_ACK_WAIT_SECONDS", "5"),
            ("SMTP_TIMEOUT_SECONDS", "30"),
        ])
        .unwrap();
        assert!(config.jetstream.is_none());
    }

    #[test]
    fn worker_mode_requires_shared_queue() {
        let err = parse(&[("RUN_MODE", "worker")]).err().unwrap();
        assert!(err.to_string().contains("NATS_URL"));

        let config = parse(&[("RUN_MODE", "worker"), ("NATS_URL", "nats://q:4222")]).unwrap();
        assert!(!config.run_mode.serves_api());
        assert!(config.run_mode.runs_workers());
    }
}

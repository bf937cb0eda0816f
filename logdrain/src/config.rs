use log_ingest::config::Config as LogDrainConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub log_drain: LogDrainConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use log_ingest::config::SinkConfig;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn log_drain_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: "https://public@sentry.example.com/1"
            log_drain:
                listener:
                    host: 0.0.0.0
                    port: 8082
                admin_listener:
                    host: 127.0.0.1
                    port: 8083
                sink:
                    type: log
                tenants:
                    aliases:
                        acme-prod: 42
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert!(config.common.logging.is_some());

        let drain = config.log_drain;
        assert_eq!(drain.listener.port, 8082);
        assert_eq!(drain.sink, SinkConfig::Log);
        assert_eq!(drain.tenants.aliases.get("acme-prod"), Some(&42));
        assert!(drain.validate().is_ok());
    }

    #[test]
    fn common_sections_are_optional() {
        let yaml = r#"
            log_drain:
                listener: {host: 0.0.0.0, port: 8082}
                admin_listener: {host: 127.0.0.1, port: 8083}
                sink: {type: http, url: "http://collector:4318/logs"}
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.is_none());
    }

    #[test]
    fn load_errors() {
        let missing = Config::from_file(std::path::Path::new("/nonexistent/logdrain.yaml"));
        assert!(matches!(missing, Err(ConfigError::LoadError(_))));

        let tmp = write_tmp_file("metrics: {}\n");
        let invalid = Config::from_file(tmp.path());
        assert!(matches!(invalid, Err(ConfigError::ParseError(_))));
    }
}

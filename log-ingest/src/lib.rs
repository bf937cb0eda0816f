pub mod config;
pub mod drain;
pub mod errors;
pub mod firehose;
pub mod json_drain;
pub mod metrics_defs;
pub mod record;
pub mod router;
pub mod service;
pub mod sink;
pub mod tenant;

#[cfg(test)]
mod testutils;

use crate::drain::DrainContext;
use crate::errors::LogIngestError;
use crate::router::Router;
use crate::service::DrainService;
use crate::sink::LogSink;
use crate::tenant::{TenantCodec, VerboseIdCodec};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<(), LogIngestError> {
    config.validate()?;

    let codec = Arc::new(VerboseIdCodec::from_config(&config.tenants));
    let sink = sink::from_config(&config.sink)?;

    serve(&config, codec, sink).await
}

/// Serves the drains and the admin endpoints until either listener fails.
pub async fn serve(
    config: &config::Config,
    codec: Arc<dyn TenantCodec>,
    sink: Arc<dyn LogSink>,
) -> Result<(), LogIngestError> {
    let ctx = DrainContext::new(codec, sink.clone(), config.max_body_size);
    let router = Router::with_drains(ctx);
    let drain_service = DrainService::new(router, config.max_body_size);
    let admin_service: AdminService<_, LogIngestError> =
        AdminService::new(move || sink.is_ready());

    let drain_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        drain_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(drain_task, admin_task)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Listener, SinkConfig, TenantConfig};
    use crate::testutils::RecordingSink;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    // Minimal HTTP/1.1 exchange; the server closes after `connection: close`
    async fn send(port: u16, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn wait_for(port: u16) {
        for _ in 0..50 {
            if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("listener on port {port} never came up");
    }

    #[tokio::test]
    async fn test_serve_drains_and_admin() {
        let config = config::Config {
            listener: Listener {
                host: "127.0.0.1".to_string(),
                port: free_port().await,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: free_port().await,
            },
            max_body_size: 1024,
            sink: SinkConfig::Log,
            tenants: TenantConfig::default(),
        };
        let sink = Arc::new(RecordingSink::default());
        let codec = Arc::new(VerboseIdCodec::from_config(&config.tenants));

        let server_config = config.clone();
        let server_sink = sink.clone();
        tokio::spawn(async move { serve(&server_config, codec, server_sink).await });
        wait_for(config.listener.port).await;
        wait_for(config.admin_listener.port).await;

        let body = r#"{"message":"over the wire"}"#;
        let response = send(
            config.listener.port,
            &format!(
                "POST /v1/logs/json HTTP/1.1\r\nhost: localhost\r\nx-highlight-project: 5\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.value(), 5);
        assert_eq!(records[0].1.message, "over the wire");

        let response = send(
            config.admin_listener.port,
            "GET /ready HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let config = config::Config {
            listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            max_body_size: 1024,
            sink: SinkConfig::Log,
            tenants: TenantConfig::default(),
        };
        assert!(matches!(
            run(config).await,
            Err(LogIngestError::InvalidConfig(_))
        ));
    }
}

use serde::Serialize;
use tracing::{error, info};

use super::IntakeError;
use crate::config::CollaboratorConfig;

/// Request timeout for task imports.
pub const LABEL_STUDIO_TIMEOUT_SECS: u64 = 10;

/// Human-labeling platform that accepts text tasks.
pub trait AnnotationPlatform {
    /// Submit one text task and return the platform's JSON response.
    fn create_task(&self, text: &str) -> Result<serde_json::Value, IntakeError>;
}

#[derive(Serialize)]
struct TaskData<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Task<'a> {
    data: TaskData<'a>,
}

/// Label Studio project import client.
pub struct LabelStudioClient {
    base_url: String,
    token: String,
    project_id: String,
    client: reqwest::blocking::Client,
}

impl LabelStudioClient {
    pub fn new(base_url: &str, token: &str, project_id: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(LABEL_STUDIO_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            project_id: project_id.to_string(),
            client,
        }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(
            &config.label_studio_url,
            &config.label_studio_token,
            &config.label_studio_project,
        )
    }

    pub fn import_url(&self) -> String {
        format!(
            "{}/api/projects/{}/import?format=JSON",
            self.base_url, self.project_id
        )
    }
}

impl AnnotationPlatform for LabelStudioClient {
    fn create_task(&self, text: &str) -> Result<serde_json::Value, IntakeError> {
        let url = self.import_url();
        let body = [Task {
            data: TaskData { text },
        }];

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&body)
            .send()
            .map_err(|e| {
                error!(url = %url, error = %e, "Label Studio request failed");
                if e.is_connect() {
                    IntakeError::AnnotationConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    IntakeError::AnnotationHttp(format!(
                        "Request timed out after {LABEL_STUDIO_TIMEOUT_SECS}s"
                    ))
                } else {
                    IntakeError::AnnotationHttp(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(status = status.as_u16(), "Label Studio rejected task");
            return Err(IntakeError::AnnotationStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: serde_json::Value = response
            .json()
            .map_err(|e| IntakeError::AnnotationHttp(format!("Invalid JSON response: {e}")))?;

        info!(project = %self.project_id, chars = text.len(), "Labeling task created");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one HTTP request, returning (request head, body) to the test.
    fn one_shot_server(
        status_line: &'static str,
        reply: &'static str,
    ) -> (String, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some(v) = line.to_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            )
            .unwrap();
            (head, String::from_utf8(body).unwrap())
        });

        (addr, handle)
    }

    #[test]
    fn import_url_shape() {
        let client = LabelStudioClient::new("http://labelstudio:8080/", "changeme", "1");
        assert_eq!(
            client.import_url(),
            "http://labelstudio:8080/api/projects/1/import?format=JSON"
        );
    }

    #[test]
    fn from_config_uses_project() {
        let config = CollaboratorConfig {
            label_studio_url: "http://ls.local".into(),
            label_studio_token: "t".into(),
            label_studio_project: "42".into(),
            object_store_root: "/tmp".into(),
            bucket: "b".into(),
            metadata_db_path: "/tmp/m.db".into(),
        };
        let client = LabelStudioClient::from_config(&config);
        assert!(client.import_url().contains("/api/projects/42/import"));
    }

    #[test]
    fn posts_task_array_with_token() {
        let (addr, server) = one_shot_server(
            "HTTP/1.1 201 Created",
            r#"{"task_count":1,"annotation_count":0}"#,
        );
        let client = LabelStudioClient::new(&addr, "secret-token", "3");
        let response = client.create_task("WARRANTY DEED\n\nSigned").unwrap();
        assert_eq!(response["task_count"], 1);

        let (head, body) = server.join().unwrap();
        assert!(head.starts_with("POST /api/projects/3/import?format=JSON HTTP/1.1"));
        assert!(head.to_lowercase().contains("authorization: token secret-token"));
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!([{ "data": { "text": "WARRANTY DEED\n\nSigned" } }])
        );
    }

    #[test]
    fn error_status_is_reported() {
        let (addr, server) =
            one_shot_server("HTTP/1.1 401 Unauthorized", r#"{"detail":"bad token"}"#);
        let client = LabelStudioClient::new(&addr, "wrong", "1");
        let err = client.create_task("x").unwrap_err();
        assert!(matches!(err, IntakeError::AnnotationStatus { status: 401, .. }));
        server.join().unwrap();
    }

    #[test]
    fn unreachable_host_is_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = LabelStudioClient::new(&format!("http://127.0.0.1:{port}"), "t", "1");
        assert!(matches!(
            client.create_task("x"),
            Err(IntakeError::AnnotationConnection(_))
        ));
    }
}

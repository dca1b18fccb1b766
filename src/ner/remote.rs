//! HTTP recognizer backed by a model server.
//!
//! Protocol: `POST {url}` with `{"text": "..."}`; the server answers
//! `{"ents": [{"text": "...", "label": "CIT", "start": 0, "end": 12}]}`.

use std::time::Duration;

use serde::Deserialize;

use super::{Entity, EntityRecognizer};
use crate::error::{NerError, NerResult};

#[derive(Deserialize)]
struct ModelResponse {
    #[serde(default)]
    ents: Vec<Entity>,
}

/// Recognizer that delegates to a pretrained model behind HTTP.
pub struct RemoteRecognizer {
    url: String,
    agent: ureq::Agent,
}

impl RemoteRecognizer {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self {
            url: url.to_string(),
            agent,
        }
    }
}

impl EntityRecognizer for RemoteRecognizer {
    fn recognize(&self, text: &str) -> NerResult<Vec<Entity>> {
        let response = match self
            .agent
            .post(&self.url)
            .send_json(serde_json::json!({ "text": text }))
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(NerError::Status {
                    url: self.url.clone(),
                    status,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(NerError::Transport {
                    url: self.url.clone(),
                    message: transport.to_string(),
                });
            }
        };

        let body: ModelResponse = response.into_json().map_err(|e| NerError::Malformed {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(url = %self.url, count = body.ents.len(), "model server answered");
        Ok(body.ents)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;
    use crate::ner::EntityLabel;

    /// Serve exactly one canned HTTP response on an ephemeral port.
    fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                drain_request(&mut stream);
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/ner")
    }

    /// Read headers and a Content-Length body so closing never resets the peer.
    fn drain_request(stream: &mut std::net::TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);
            let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= header_end + 4 + length {
                return;
            }
        }
    }

    #[test]
    fn parses_entities_from_model_server() {
        let url = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"ents": [{"text": "ACME LIMITED", "label": "ORG", "start": 4, "end": 16}]}"#,
        );
        let ents = RemoteRecognizer::new(&url, 5).recognize("The ACME LIMITED case").unwrap();
        assert_eq!(ents.len(), 1);
        assert_eq!(ents[0].text, "ACME LIMITED");
        assert_eq!(ents[0].label, EntityLabel::Organization);
        assert_eq!((ents[0].start, ents[0].end), (4, 16));
    }

    #[test]
    fn error_status_is_reported() {
        let url = one_shot_server("HTTP/1.1 500 Internal Server Error", "{}");
        let err = RemoteRecognizer::new(&url, 5).recognize("text").unwrap_err();
        assert!(matches!(err, NerError::Status { status: 500, .. }));
    }

    #[test]
    fn malformed_body_is_reported() {
        let url = one_shot_server("HTTP/1.1 200 OK", "not json");
        let err = RemoteRecognizer::new(&url, 5).recognize("text").unwrap_err();
        assert!(matches!(err, NerError::Malformed { .. }));
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/ner");
        let err = RemoteRecognizer::new(&url, 2).recognize("text").unwrap_err();
        assert!(matches!(err, NerError::Transport { .. }));
    }
}

//! Scripted HTTP backend for integration tests.
//!
//! Binds `127.0.0.1:0`, answers each incoming request with the next scripted
//! response and records what it received.
#![allow(dead_code)]

use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use loadplan::config::schema::{BackendConfig, LoadplanConfig};
use serde_json::{Value, json};
use tiny_http::{Response, Server, StatusCode};

/// One scripted answer.
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request as the fake backend saw it.
#[derive(Debug)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub struct FakeBackend {
    pub base_url: String,
    requests: Receiver<Recorded>,
}

impl FakeBackend {
    pub fn start(replies: Vec<Reply>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for reply in replies {
                let Ok(mut request) = server.recv() else {
                    return;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let _ = tx.send(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });
                if !reply.delay.is_zero() {
                    thread::sleep(reply.delay);
                }
                let response =
                    Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// The next request the backend received.
    pub fn next_request(&self) -> Recorded {
        self.requests.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 5_000,
            health_timeout_ms: 1_000,
            ..BackendConfig::default()
        }
    }

    /// Full config with the run log disabled.
    pub fn config(&self) -> LoadplanConfig {
        let mut cfg = LoadplanConfig::default();
        cfg.backend = self.backend_config();
        cfg.logging.enabled = false;
        cfg
    }
}

/// A URL nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Smallest successful result document.
pub fn success_document(flight_number: &str) -> Value {
    json!({
        "success": true,
        "flight_info": {
            "flight_number": flight_number,
            "departure_airport": "AMS",
            "arrival_airport": "SIN",
            "date": "2024-06-01"
        },
        "weight_distribution": {
            "by_compartment": {"C1": 600.0, "C2": 400.0},
            "by_side": {"Left": 500.0, "Right": 500.0},
            "total_weight": 1000.0,
            "zfw": 181000.0,
            "mac_zfw": 27.1
        },
        "uld_utilization": {"utilization_rate": 0.75},
        "fuel_savings_kg": 35.0,
        "runtime_seconds": 4.2,
        "warnings": []
    })
}

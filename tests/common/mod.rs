#![allow(dead_code)]

pub mod mock_room;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wikibot::lookup::Responder;
use wikibot::wiki::WikiClient;

pub const API_PATH: &str = "/w/api.php";

/// Nothing listens here; connections are refused immediately.
pub const UNREACHABLE_API_URL: &str = "http://127.0.0.1:9/w/api.php";

pub fn responder_for(api_url: &str, reply_on_error: bool) -> Responder {
    responder_with_timeout(api_url, Duration::from_secs(5), reply_on_error)
}

pub fn responder_with_timeout(api_url: &str, timeout: Duration, reply_on_error: bool) -> Responder {
    let wiki = WikiClient::new(api_url, timeout).unwrap();
    Responder::new(wiki, reply_on_error)
}

pub fn api_url(server: &mockito::ServerGuard) -> String {
    format!("{}{}", server.url(), API_PATH)
}

/// Starts a server that accepts connections and never answers.
///
/// Returns the API URL to point a client at.
pub async fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{addr}{API_PATH}")
}

/// Starts a server that answers every request with headers announcing a
/// 500-byte body, sends a fragment of it and then drops the connection.
pub async fn spawn_truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\n\
                          Content-Type: application/json\r\n\
                          Content-Length: 500\r\n\r\n\
                          {\"query\":{\"pages\":[{\"extract\":\"Berl",
                    )
                    .await;
                let _ = socket.flush().await;
                drop(socket);
            });
        }
    });

    format!("http://{addr}{API_PATH}")
}

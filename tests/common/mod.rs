//! Local HTTP fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TEST_TIMESTAMP: i64 = 1_700_000_000_000;
pub const TEST_API_KEY: &str = "ABC123";
pub const PKCS8_PEM: &str = include_str!("../fixtures/test_rsa_key.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/test_rsa_pub.pem");

/// A raw request as the server saw it
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    /// Request target from the request line (absolute-form through a proxy)
    pub fn target(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or_default()
    }
}

pub type Handler = Arc<dyn Fn(&CapturedRequest) -> String + Send + Sync>;

pub struct TestServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl TestServer {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Serve every connection with `handler`, one request per connection
pub async fn spawn_server<F>(handler: F) -> TestServer
where
    F: Fn(&CapturedRequest) -> String + Send + Sync + 'static,
{
    let handler: Handler = Arc::new(handler);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            let captured = captured.clone();
            tokio::spawn(async move {
                serve_one(stream, handler, captured).await;
            });
        }
    });

    TestServer {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// Serve the same response to every request
pub async fn spawn_fixed(response: String) -> TestServer {
    spawn_server(move |_| response.clone()).await
}

/// Accept connections but never answer them
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

/// Address nothing listens on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn serve_one(
    mut stream: TcpStream,
    handler: Handler,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    let response = handler(&request);
    captured.lock().unwrap().push(request);
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    let body_start = head_end + 4;
    while buffer.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    let body_end = buffer.len().min(body_start + content_length);
    Some(CapturedRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buffer[body_start..body_end]).to_string(),
        head,
    })
}

pub fn http_response(status: u16, reason: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        content_type,
        body.len(),
        body
    )
}

pub fn json_response(status: u16, body: &serde_json::Value) -> String {
    let reason = match status {
        200 => "OK",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    };
    http_response(status, reason, "application/json", &body.to_string())
}

/// Venue envelope with `retCode = 0`
pub fn venue_ok(result: serde_json::Value) -> String {
    let body = serde_json::json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": result,
        "time": TEST_TIMESTAMP
    });
    json_response(200, &body)
}

pub fn bybit_ticker_body(last_price: &str) -> serde_json::Value {
    bybit_ticker_body_for("BTCUSDT", last_price)
}

pub fn bybit_ticker_body_for(symbol: &str, last_price: &str) -> serde_json::Value {
    serde_json::json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "category": "linear",
            "list": [{
                "symbol": symbol,
                "lastPrice": last_price,
                "price24hPcnt": "0.0123",
                "highPrice24h": "43000",
                "lowPrice24h": "41000",
                "volume24h": "1234.5",
                "fundingRate": "0.0001"
            }]
        }
    })
}

//! `HttpGateway` against a scripted HTTP server on a local port.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lib_dashboard::core::{CommandGateway, OrderRequest, StatisticsSnapshot};
use lib_dashboard::retrieve::HttpGateway;
use lib_dashboard::{CommandError, SessionConfig};

struct Recorded {
    request_line: String,
    body: String,
}

/// Serves one scripted response per connection, in order, then closes the
/// listener. Returns the base URL and a handle yielding what was received.
fn mock_server(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}/", port);

    let handle = thread::spawn(move || {
        let mut recorded = Vec::new();
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            recorded.push(read_request(&mut stream));

            let response = format!(
                "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        recorded
    });

    (base_url, handle)
}

fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut buf).unwrap();
        assert!(n > 0, "client closed before sending headers");
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .map(|(_, value)| value.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    Recorded {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&data[header_end..]).to_string(),
    }
}

fn gateway(base_url: &str) -> HttpGateway {
    let config = SessionConfig {
        api_base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        ..SessionConfig::default()
    };
    HttpGateway::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_statistics() {
    let (url, server) = mock_server(vec![(
        200,
        r#"{"totalOrders":12,"runningAverage":250.5,"totalRevenue":9018.0,"successfulOrders":12,"failedOrders":3}"#,
    )]);

    let stats = gateway(&url).fetch_statistics().await.unwrap();
    let recorded = server.join().unwrap();

    assert_eq!(recorded[0].request_line, "GET /api/orders/statistics HTTP/1.1");
    assert_eq!(
        stats,
        StatisticsSnapshot {
            total_orders: 12,
            running_average: 250.5,
            total_revenue: 9018.0,
            successful_orders: 12,
            failed_orders: 3,
        }
    );
}

#[tokio::test]
async fn test_fetch_statistics_rejects_invalid_snapshot() {
    let (url, server) = mock_server(vec![(
        200,
        r#"{"totalOrders":1,"runningAverage":1.0,"totalRevenue":-5.0,"successfulOrders":1,"failedOrders":0}"#,
    )]);

    let err = gateway(&url).fetch_statistics().await.unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, CommandError::Network(m) if m.contains("totalRevenue")));
}

#[tokio::test]
async fn test_reads_retry_transient_failures() {
    let (url, server) = mock_server(vec![
        (503, r#"{"error":"warming up"}"#),
        (
            200,
            r#"{"totalOrders":1,"runningAverage":10.0,"totalRevenue":10.0,"successfulOrders":1,"failedOrders":0}"#,
        ),
    ]);

    let stats = gateway(&url).fetch_statistics().await.unwrap();
    let recorded = server.join().unwrap();

    assert_eq!(recorded.len(), 2);
    assert_eq!(stats.total_orders, 1);
}

#[tokio::test]
async fn test_submit_order_posts_json() {
    let (url, server) = mock_server(vec![(
        201,
        r#"{"orderId":"7f3e2a10-1b2c-4d5e-8f90-123456789abc","message":"Order created and sent to Kafka","status":"PENDING"}"#,
    )]);

    let request = OrderRequest::new("Headphones", 149.99, 2).unwrap();
    let accepted = gateway(&url).submit_order(&request).await.unwrap();
    let recorded = server.join().unwrap();

    assert_eq!(recorded[0].request_line, "POST /api/orders HTTP/1.1");
    let body: serde_json::Value = serde_json::from_str(&recorded[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"productName": "Headphones", "price": 149.99, "quantity": 2})
    );
    assert_eq!(accepted.short_id(), "7f3e2a10");
    assert_eq!(accepted.status.as_deref(), Some("PENDING"));
}

#[tokio::test]
async fn test_submit_order_is_not_retried() {
    let (url, server) = mock_server(vec![(
        500,
        r#"{"error":"Failed to create order","message":"Broker not available"}"#,
    )]);

    let request = OrderRequest::new("Keyboard", 89.0, 1).unwrap();
    let err = gateway(&url).submit_order(&request).await.unwrap_err();
    let recorded = server.join().unwrap();

    assert_eq!(recorded.len(), 1);
    assert_eq!(
        err,
        CommandError::Rejected {
            status: 500,
            message: "Broker not available".to_string()
        }
    );
}

#[tokio::test]
async fn test_reset_statistics() {
    let (url, server) = mock_server(vec![
        (200, r#"{"message":"Statistics reset successfully"}"#),
        (500, ""),
    ]);
    let gateway = gateway(&url);

    gateway.reset_statistics().await.unwrap();
    let err = gateway.reset_statistics().await.unwrap_err();
    let recorded = server.join().unwrap();

    assert_eq!(recorded[0].request_line, "POST /api/orders/statistics/reset HTTP/1.1");
    assert_eq!(err.to_string(), "Failed to reset statistics");
}

#[tokio::test]
async fn test_health() {
    let (url, server) = mock_server(vec![(200, r#"{"status":"UP","service":"order-service"}"#)]);

    let health = gateway(&url).health().await.unwrap();
    let recorded = server.join().unwrap();

    assert_eq!(recorded[0].request_line, "GET /api/orders/health HTTP/1.1");
    assert_eq!(health.get("status").map(String::as_str), Some("UP"));
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let gateway = gateway(&format!("http://127.0.0.1:{}/", port));

    let err = gateway.reset_statistics().await.unwrap_err();
    assert!(matches!(err, CommandError::Network(_)));
}

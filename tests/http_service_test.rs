//! HTTP client behaviour against a minimal in-test backend.
//!
//! The stub accepts one connection per canned response, records the request and replies
//! with `Connection: close`.

use chemion_designer::directory::Device;
use chemion_designer::frame::EncodedFrame;
use chemion_designer::service::{GlassesService, HttpGlassesService};
use chemion_designer::{Designer, GlassesError};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    content_type: Option<String>,
    body: String,
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap().split_whitespace();
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();

    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..head_end + content_length]).to_string();

    Recorded {
        method,
        path,
        content_type,
        body,
    }
}

/// Serve `responses` in order, one per connection. Returns the base URL and a handle
/// yielding the recorded requests.
async fn stub(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut recorded = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            recorded.push(read_request(&mut stream).await);

            let reason = if status < 400 { "OK" } else { "Internal Server Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        recorded
    });

    (url, handle)
}

#[tokio::test]
async fn test_discover_parses_device_list() {
    let (url, server) = stub(vec![(
        200,
        r#"[{"device_name":"CHEMION_1","device_address":"11:22:33:44:55:66"}]"#,
    )])
    .await;
    let service = HttpGlassesService::new(&url).unwrap();

    let devices = service.discover().await.unwrap();

    assert_eq!(devices, vec![Device::new("CHEMION_1", "11:22:33:44:55:66")]);
    let requests = server.await.unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/discover");
}

#[tokio::test]
async fn test_failure_message_is_surfaced_unmodified() {
    let (url, server) = stub(vec![(500, r#"{"message":"Couldn't get adapter"}"#)]).await;
    let service = HttpGlassesService::new(&url).unwrap();

    let err = service.discover().await.unwrap_err();

    assert_eq!(err.message, "Couldn't get adapter");
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_posts_form() {
    let (url, server) = stub(vec![(200, "")]).await;
    let service = HttpGlassesService::new(&url).unwrap();

    service
        .connect(&Device::new("CHEMION 1", "11:22:33:44:55:66"))
        .await
        .unwrap();

    let requests = server.await.unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/connect");
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        requests[0].body,
        "device_name=CHEMION+1&device_address=11%3A22%3A33%3A44%3A55%3A66"
    );
}

#[tokio::test]
async fn test_encode_and_display_wire_format() {
    let (url, server) = stub(vec![(200, r#"{"glasses_frame":[[250,3,0],[85,169]]}"#), (200, "")]).await;
    let service = HttpGlassesService::new(&url).unwrap();

    let encoded = service.encode(&vec![vec![0u8, 3], vec![1, 2]]).await.unwrap();
    assert_eq!(
        encoded,
        EncodedFrame::new(serde_json::json!([[250, 3, 0], [85, 169]]))
    );
    service.display(&encoded).await.unwrap();

    let requests = server.await.unwrap();
    assert_eq!(requests[0].path, "/encode");
    let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent, serde_json::json!({"glasses_frame": [[0, 3], [1, 2]]}));

    assert_eq!(requests[1].path, "/display");
    let shown: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(shown, serde_json::json!({"glasses_frame": [[250, 3, 0], [85, 169]]}));
}

#[tokio::test]
async fn test_error_without_message_body() {
    let (url, server) = stub(vec![(503, "gateway down")]).await;
    let service = HttpGlassesService::new(&url).unwrap();

    let err = service.disconnect().await.unwrap_err();

    assert!(err.message.contains("503"), "unexpected message: {}", err.message);
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let service = HttpGlassesService::new(&url).unwrap();
    let err = service.discover().await.unwrap_err();
    assert!(err.message.starts_with("Request to glasses service failed"));
}

#[tokio::test]
async fn test_designer_push_over_http_stops_after_encode_failure() {
    let (url, server) = stub(vec![
        (200, r#"[{"device_name":"CHEMION","device_address":"01:02:03:04:05:06"}]"#),
        (200, ""),
        (500, r#"{"message":"Wrong value in frame"}"#),
    ])
    .await;
    let designer = Designer::new(Arc::new(HttpGlassesService::new(&url).unwrap()));

    designer.discover().await.unwrap();
    designer.select(0).unwrap();
    designer.connect().await.unwrap();
    let err = designer.push().await.unwrap_err();

    assert_eq!(err, GlassesError::Encoding("Wrong value in frame".into()));
    let requests = server.await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/discover", "/connect", "/encode"]);
}

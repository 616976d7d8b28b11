//! One-shot HTTP server for exercising the clients in tests.

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct OneShot {
    pub base_url: String,
    handle: JoinHandle<String>,
}

impl OneShot {
    /// Waits for the request and returns its first line.
    pub async fn request_line(self) -> String {
        self.handle.await.unwrap()
    }
}

/// Accepts a single connection and answers it with `status` and `body`.
pub async fn serve_once(status: u16, body: &'static str) -> OneShot {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    OneShot {
        base_url: format!("http://{addr}"),
        handle,
    }
}

//! Scripted HTTP server that answers a fixed sequence of requests.

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct Canned {
    pub status: u16,
    pub body: &'static str,
}

impl Canned {
    pub const fn ok(body: &'static str) -> Self {
        Self { status: 200, body }
    }
}

pub struct Recorded {
    pub line: String,
    /// Lowercased header block.
    pub head: String,
    pub body: String,
}

pub struct Scripted {
    pub base_url: String,
    handle: JoinHandle<Vec<Recorded>>,
}

impl Scripted {
    /// Waits until every canned response was served.
    pub async fn requests(self) -> Vec<Recorded> {
        self.handle.await.unwrap()
    }
}

/// Serves one connection per canned response, in order.
pub async fn serve(responses: Vec<Canned>) -> Scripted {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut recorded = Vec::new();
        for canned in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            recorded.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.status,
                canned.body.len(),
                canned.body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        recorded
    });

    Scripted {
        base_url: format!("http://{addr}"),
        handle,
    }
}

async fn read_request(socket: &mut TcpStream) -> Recorded {
    let mut data = Vec::new();
    let mut buf = [0_u8; 4096];

    let header_end = loop {
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before headers ended");
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let chunked = head.contains("transfer-encoding: chunked");
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());

    loop {
        let body = &data[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if done {
            break;
        }
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let raw_head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    Recorded {
        line: raw_head.lines().next().unwrap_or_default().to_string(),
        head,
        body: String::from_utf8_lossy(&data[header_end..]).into_owned(),
    }
}

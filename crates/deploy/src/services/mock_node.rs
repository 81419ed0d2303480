//! Scripted JSON-RPC node for exercising the RPC collaborators.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

type Handler = dyn Fn(&str, &[Value]) -> Result<Value, String> + Send + Sync;

/// HTTP server answering one JSON-RPC request per connection.
///
/// The handler gets the method and params and returns either a `result` value or
/// an error message.
pub struct MockNode {
    pub url: String,
    calls: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl MockNode {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let task_calls = calls.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let calls = task_calls.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve(stream, handler, calls).await {
                        tracing::debug!(error = %e, "Mock node failed to serve request");
                    }
                });
            }
        });

        Self { url, calls }
    }

    /// Methods called so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Params of every call to `method`.
    pub fn params_of(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

async fn serve(
    mut stream: TcpStream,
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request: Value =
        serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap_or_default();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].as_array().cloned().unwrap_or_default();

    let reply = handler(&method, &params);
    calls.lock().unwrap().push((method, params));

    let body = match reply {
        Ok(result) => serde_json::json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
        Err(message) => serde_json::json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": -32000, "message": message }
        }),
    }
    .to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

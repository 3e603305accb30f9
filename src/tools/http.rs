//! HTTP 抓取工具：从步骤文本中取第一个 http(s) URL，按参数 method（默认 GET）请求
//! 参数 timeout（秒）覆盖客户端默认超时。
//!
//! 响应体读取到 max_body_bytes 为止，按 UTF-8 有损解码；传输失败与非 2xx 状态都作为工具错误。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::tools::{Tool, ToolCall, HTTP_TOOL};

/// 网络抓取工具
pub struct HttpTool {
    client: Client,
    max_body_bytes: usize,
}

/// 第一个以 http:// 或 https:// 开头的空白分隔词
pub fn extract_url(step: &str) -> Option<&str> {
    step.split_whitespace()
        .find(|t| t.starts_with("http://") || t.starts_with("https://"))
}

impl HttpTool {
    pub fn new(timeout_secs: u64, max_body_bytes: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("omniscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_body_bytes,
        }
    }

    async fn fetch(
        &self,
        method: Method,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<String, String> {
        let mut req = self.client.request(method, url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let mut resp = req
            .send()
            .await
            .map_err(|e| format!("http error: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("http error: HTTP {}", resp.status()));
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| format!("http error: {}", e))?
        {
            let room = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        HTTP_TOOL
    }

    fn description(&self) -> &str {
        "Fetch the first http(s) URL found in the step. \
         Params: {\"method\": \"GET\", \"timeout\": secs}."
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, String> {
        let url = extract_url(&call.step).ok_or_else(|| "no url found".to_string())?;
        let method_name = call.param_str("method").unwrap_or("GET").to_uppercase();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| format!("http error: invalid method {}", method_name))?;
        let timeout = call.param_u64("timeout").map(Duration::from_secs);
        tracing::info!(url = %url, method = %method, timeout = ?timeout, "http tool fetch");
        self.fetch(method, url, timeout).await
    }
}

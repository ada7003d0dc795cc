use anyhow::Context as _;
use serde_json::json;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Minimal MCP client for the server binary's stdio transport (one JSON message per line).
///
/// Exists only for integration tests; it does not use any of the crate's production code.
pub struct StdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioSession {
    /// Spawn the server with the given environment and complete the MCP handshake.
    pub async fn connect(env: &[(&str, &str)]) -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_n8n-mcp");
        let mut cmd = Command::new(bin);
        cmd.env_remove("N8N_BASE_URL")
            .env_remove("N8N_API_KEY")
            .env_remove("CF_ACCESS_CLIENT_ID")
            .env_remove("CF_ACCESS_CLIENT_SECRET")
            .env("N8N_MCP_LOG_LEVEL", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for (k, v) in env {
            cmd.env(k, v);
        }

        let mut child = cmd.spawn().context("spawn n8n-mcp")?;
        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;

        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "n8n-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        anyhow::ensure!(init.get("result").is_some(), "initialize failed: {init}");

        session
            .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;

        Ok(session)
    }

    pub async fn request(
        &mut self,
        id: u64,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(Duration::from_secs(10), self.read_response(id))
            .await
            .context("timeout waiting for response")?
    }

    pub async fn call_tool(
        &mut self,
        id: u64,
        name: &str,
        arguments: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        self.request(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    async fn send(&mut self, msg: serde_json::Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(&msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<serde_json::Value> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: serde_json::Value =
                serde_json::from_str(line).with_context(|| format!("parse line: {line}"))?;
            // Skip server-initiated notifications.
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
        anyhow::bail!("server closed stdout before answering request {id}")
    }
}

/// Text of the single content block in a `tools/call` result.
pub fn tool_text(msg: &serde_json::Value) -> anyhow::Result<&str> {
    msg.get("result")
        .and_then(|r| r.get("content"))
        .and_then(serde_json::Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("text"))
        .and_then(serde_json::Value::as_str)
        .context("tools/call missing result.content[0].text")
}

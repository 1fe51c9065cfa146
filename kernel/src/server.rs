//! Newline-delimited JSON-RPC 2.0 server speaking the tool protocol.
//!
//! One request per line on the input, one response per line on the output.
//! Requests are handled strictly in order; notifications get no reply.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::classify;
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;
use crate::tools::{call_tool, tool_definitions};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "agent-kernel";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Serve until `input` reaches end of file.
pub fn serve<S, R, W>(kernel: &mut Kernel<S>, input: R, mut output: W) -> Result<()>
where
    S: TupleRepository,
    R: BufRead,
    W: Write,
{
    info!(server = SERVER_NAME, version = SERVER_VERSION, "serving on stdio");
    for line in input.lines() {
        let line = line.context("read request line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(response) = handle_line(kernel, line) {
            write_message(&mut output, &response)?;
        }
    }
    info!("input closed");
    Ok(())
}

/// Parse and handle one raw line.
pub fn handle_line<S: TupleRepository>(kernel: &mut Kernel<S>, line: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(line) {
        Ok(message) => handle_message(kernel, &message),
        Err(err) => {
            warn!(error = %err, "unparsable request");
            Some(error_response(&Value::Null, PARSE_ERROR, &format!("Parse error: {err}")))
        }
    }
}

/// Handle one decoded message; `None` when no reply is due.
pub fn handle_message<S: TupleRepository>(kernel: &mut Kernel<S>, message: &Value) -> Option<Value> {
    let method = message["method"].as_str().unwrap_or("");
    let notification = message.get("id").is_none();
    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let params = &message["params"];
    debug!(method, "request received");

    let result = match method {
        "initialize" => json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        }),
        "notifications/initialized" => return None,
        "ping" => json!({}),
        "tools/list" => json!({ "tools": tool_definitions() }),
        "tools/call" => {
            let Some(name) = params["name"].as_str() else {
                return Some(error_response(
                    &id,
                    INVALID_PARAMS,
                    "Invalid params: tools/call requires a tool name",
                ));
            };
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            tool_result(name, call_tool(kernel, name, &arguments))
        }
        _ if notification => return None,
        other => {
            return Some(error_response(
                &id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {other}"),
            ));
        }
    };

    if notification {
        return None;
    }
    Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

/// Tool outcome as a content block; failures are flagged with `isError`.
fn tool_result(tool: &str, outcome: Result<String>) -> Value {
    match outcome {
        Ok(text) => json!({ "content": [{ "type": "text", "text": text }] }),
        Err(err) => {
            let kind = classify(&err).map_or("internal", |kernel_err| kernel_err.kind());
            debug!(tool, kind, error = %format!("{err:#}"), "tool failed");
            json!({
                "content": [{ "type": "text", "text": format!("Error: {err:#}") }],
                "isError": true,
            })
        }
    }
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

fn write_message<W: Write>(output: &mut W, message: &Value) -> Result<()> {
    serde_json::to_writer(&mut *output, message).context("encode response")?;
    output.write_all(b"\n").context("write response")?;
    output.flush().context("flush response")
}

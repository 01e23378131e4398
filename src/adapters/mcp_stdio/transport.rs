use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};

use crate::adapters::mcp_stdio::rpc::RpcEnvelope;

/// How a peer frames its messages; replies use the same framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TransportMode {
    Framed,
    JsonLine,
}

#[derive(Debug)]
pub(super) struct Frame {
    pub(super) body: String,
    pub(super) mode: TransportMode,
}

/// Reads the next message. `Ok(None)` on clean EOF.
pub(super) async fn read_frame<R>(
    reader: &mut BufReader<R>,
    max_frame_bytes: usize,
) -> anyhow::Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let Some(first) = skip_whitespace(reader).await? else {
        return Ok(None);
    };

    if first == b'{' || first == b'[' {
        let line = read_line_bounded(reader, max_frame_bytes)
            .await?
            .unwrap_or_default();
        serde_json::from_str::<serde_json::Value>(&line)
            .map_err(|e| anyhow::anyhow!("invalid JSON message: {}", e))?;
        return Ok(Some(Frame {
            body: line,
            mode: TransportMode::JsonLine,
        }));
    }

    let mut content_length = None;
    loop {
        let line = read_line_bounded(reader, max_frame_bytes)
            .await?
            .ok_or_else(|| anyhow::anyhow!("unexpected EOF while reading frame headers"))?;
        if line.trim().is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid frame header '{}'", line))?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("invalid Content-Length value"))?;
            if length > max_frame_bytes {
                anyhow::bail!(
                    "frame too large: {} bytes (max {})",
                    length,
                    max_frame_bytes
                );
            }
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or_else(|| anyhow::anyhow!("missing Content-Length header"))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(Frame {
        body: String::from_utf8_lossy(&body).into_owned(),
        mode: TransportMode::Framed,
    }))
}

async fn skip_whitespace<R>(reader: &mut BufReader<R>) -> anyhow::Result<Option<u8>>
where
    R: AsyncRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(idx) => {
                let first = buf[idx];
                reader.consume(idx);
                return Ok(Some(first));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// One line without its terminator. Lines over `max_bytes` are drained and
/// rejected so the next read starts on a fresh message.
async fn read_line_bounded<R>(
    reader: &mut BufReader<R>,
    max_bytes: usize,
) -> anyhow::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = max_bytes as u64 + 2;
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    let terminated = buf.last() == Some(&b'\n');
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    if buf.len() > max_bytes {
        if !terminated {
            discard_line(reader).await?;
        }
        anyhow::bail!("incoming frame too large: more than {} bytes", max_bytes);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

async fn discard_line<R>(reader: &mut BufReader<R>) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        if let Some(idx) = buf.iter().position(|b| *b == b'\n') {
            reader.consume(idx + 1);
            return Ok(());
        }
        let len = buf.len();
        reader.consume(len);
    }
}

pub(super) async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut BufWriter<W>,
    envelope: &RpcEnvelope,
    mode: TransportMode,
) -> anyhow::Result<()> {
    let body = serde_json::to_vec(envelope)?;
    match mode {
        TransportMode::Framed => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
        TransportMode::JsonLine => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const MAX: usize = 1024 * 1024;

    async fn read_one(input: &[u8], max: usize) -> anyhow::Result<Option<Frame>> {
        let mut reader = BufReader::new(input);
        read_frame(&mut reader, max).await
    }

    fn framed(body: &[u8], extra_headers: &str) -> Vec<u8> {
        let mut out =
            format!("{}Content-Length: {}\r\n\r\n", extra_headers, body.len()).into_bytes();
        out.extend_from_slice(body);
        out
    }

    #[tokio::test]
    async fn test_json_line_with_and_without_newline() {
        for input in [&b"{\"jsonrpc\":\"2.0\"}\n"[..], &b"  {\"jsonrpc\":\"2.0\"}"[..]] {
            let frame = read_one(input, MAX).await.unwrap().unwrap();
            assert_eq!(frame.mode, TransportMode::JsonLine);
            let parsed: Value = serde_json::from_str(&frame.body).unwrap();
            assert_eq!(parsed["jsonrpc"], "2.0");
        }
    }

    #[tokio::test]
    async fn test_multiline_json_is_rejected() {
        let err = read_one(b"{\n\"method\":\"ping\"\n}\n", MAX)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid JSON message"), "{}", err);
    }

    #[tokio::test]
    async fn test_sequential_json_lines() {
        let input = b"{\"id\":1}\r\n\n{\"id\":2}\n";
        let mut reader = BufReader::new(&input[..]);
        let first = read_frame(&mut reader, MAX).await.unwrap().unwrap();
        let second = read_frame(&mut reader, MAX).await.unwrap().unwrap();
        assert_eq!(first.body, "{\"id\":1}");
        assert_eq!(second.body, "{\"id\":2}");
        assert!(read_frame(&mut reader, MAX).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_length_framing() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let frame = read_one(&framed(body, ""), MAX).await.unwrap().unwrap();
        assert_eq!(frame.mode, TransportMode::Framed);
        assert!(frame.body.contains("tools/list"));

        let lower = format!("content-length: {}\n\n", body.len());
        let mut input = lower.into_bytes();
        input.extend_from_slice(body);
        assert!(read_one(&input, MAX).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_extra_headers_are_ignored() {
        let body = br#"{"method":"ping"}"#;
        let input = framed(body, "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\n");
        let frame = read_one(&input, MAX).await.unwrap().unwrap();
        assert_eq!(frame.body, r#"{"method":"ping"}"#);
    }

    #[tokio::test]
    async fn test_header_errors() {
        assert!(read_one(b"Content-Type: x\r\n\r\n", MAX).await.is_err());
        assert!(read_one(b"garbage\r\n\r\n", MAX).await.is_err());
        assert!(read_one(b"Content-Length: 10\r\n", MAX).await.is_err());
        let oversized = format!("Content-Length: {}\r\n\r\n", MAX + 1);
        assert!(read_one(oversized.as_bytes(), MAX).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_line_is_drained() {
        let long = format!("{{\"k\":\"{}\"}}\n{{\"id\":2}}\n", "v".repeat(64));
        let mut reader = BufReader::new(long.as_bytes());
        let err = read_frame(&mut reader, 32).await.unwrap_err();
        assert!(err.to_string().contains("too large"), "{}", err);
        let next = read_frame(&mut reader, 32).await.unwrap().unwrap();
        assert_eq!(next.body, "{\"id\":2}");
    }

    #[tokio::test]
    async fn test_write_response_uses_peer_framing() {
        let envelope = RpcEnvelope::success(json!(1), json!({}));

        let mut framed_out = BufWriter::new(Vec::new());
        write_response(&mut framed_out, &envelope, TransportMode::Framed)
            .await
            .unwrap();
        let framed_text = String::from_utf8(framed_out.into_inner()).unwrap();
        assert!(framed_text.starts_with("Content-Length: "));

        let mut line_out = BufWriter::new(Vec::new());
        write_response(&mut line_out, &envelope, TransportMode::JsonLine)
            .await
            .unwrap();
        let line_text = String::from_utf8(line_out.into_inner()).unwrap();
        assert!(line_text.ends_with("}\n"));
        assert!(!line_text.contains("Content-Length"));
    }
}

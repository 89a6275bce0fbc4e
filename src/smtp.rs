use std::io;
use std::time::Duration;

use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::CheckConfig;
use crate::records::SmtpProbeResult;

const SMTP_PORT: u16 = 25;

/// Identity announced in EHLO and the relay-test envelope. The `.invalid`
/// TLD guarantees nothing ever resolves or gets delivered.
const PROBE_HELO: &str = "probe.domain-auth-checker.invalid";
const PROBE_SENDER: &str = "probe@domain-auth-checker.invalid";
const PROBE_RECIPIENT: &str = "relay-probe@external-recipient.invalid";

/// Probes the first `smtp_host_cap` MX hosts on port 25, concurrently.
/// Per-host failures are isolated; the returned vector always has one
/// entry per attempted host.
pub async fn probe_smtp(hosts: &[String], cfg: &CheckConfig) -> Vec<SmtpProbeResult> {
    probe_all(hosts, SMTP_PORT, cfg.smtp_timeout, cfg.smtp_host_cap).await
}

pub(crate) async fn probe_all(
    hosts: &[String],
    port: u16,
    session_timeout: Duration,
    cap: usize,
) -> Vec<SmtpProbeResult> {
    let capped = &hosts[..hosts.len().min(cap)];
    join_all(
        capped
            .iter()
            .map(|host| probe_host(host, port, session_timeout)),
    )
    .await
}

/// One SMTP session: banner, EHLO, minimal open-relay test, then a
/// STARTTLS negotiation attempt when the extension is advertised. The
/// whole session is bounded by `session_timeout`.
pub async fn probe_host(host: &str, port: u16, session_timeout: Duration) -> SmtpProbeResult {
    match tokio::time::timeout(session_timeout, probe_session(host, port)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => SmtpProbeResult::failed(host, port, e.to_string()),
        Err(_) => SmtpProbeResult::failed(host, port, "smtp session timed out".to_string()),
    }
}

async fn probe_session(host: &str, port: u16) -> io::Result<SmtpProbeResult> {
    let stream = TcpStream::connect((host, port)).await?;
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let (code, banner) = read_reply(&mut reader).await?;
    if code != 220 {
        return Ok(SmtpProbeResult::failed(
            host,
            port,
            format!("unexpected greeting: {banner}"),
        ));
    }

    writer
        .write_all(format!("EHLO {PROBE_HELO}\r\n").as_bytes())
        .await?;
    let (ehlo_code, ehlo_text) = read_reply(&mut reader).await?;
    let starttls_advertised = ehlo_code == 250 && ehlo_text.to_uppercase().contains("STARTTLS");

    // Relay test: a server that accepts an external recipient without
    // authentication is an open relay. The envelope is abandoned with
    // RSET before DATA, so no message is ever submitted.
    let mut open_relay = false;
    writer
        .write_all(format!("MAIL FROM:<{PROBE_SENDER}>\r\n").as_bytes())
        .await?;
    let (mail_code, _) = read_reply(&mut reader).await?;
    if (200..300).contains(&mail_code) {
        writer
            .write_all(format!("RCPT TO:<{PROBE_RECIPIENT}>\r\n").as_bytes())
            .await?;
        let (rcpt_code, _) = read_reply(&mut reader).await?;
        open_relay = (200..300).contains(&rcpt_code);
        let _ = writer.write_all(b"RSET\r\n").await;
        let _ = read_reply(&mut reader).await;
    }

    if open_relay {
        log::warn!("open relay detected at {host}:{port}");
    }

    // STARTTLS negotiation attempt. Sequenced after the relay test since a
    // completed upgrade would encrypt the channel; 220 means the server is
    // ready to negotiate.
    let mut supports_starttls = false;
    if starttls_advertised {
        writer.write_all(b"STARTTLS\r\n").await?;
        let (tls_code, _) = read_reply(&mut reader).await?;
        supports_starttls = tls_code == 220;
    }

    if supports_starttls {
        // The server now expects a TLS handshake; close instead of
        // sending a plaintext QUIT.
        drop(writer);
    } else {
        let _ = writer.write_all(b"QUIT\r\n").await;
    }

    Ok(SmtpProbeResult {
        host: host.to_string(),
        port,
        success: true,
        response: Some(banner),
        supports_starttls,
        open_relay,
        error: None,
    })
}

/// Reads one SMTP reply, following multiline framing: "250-..." lines
/// continue, "250 ..." (or a bare code) terminates. Returns the code and
/// the full reply text.
async fn read_reply<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> io::Result<(u16, String)> {
    let mut text = String::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-reply",
            ));
        }
        let line = line.trim_end();
        if line.len() < 3 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("short smtp reply: {line:?}"),
            ));
        }
        // get(..3) rather than a direct slice: a multibyte character
        // straddling the boundary must be a protocol error, not a panic.
        let code: u16 = line
            .get(..3)
            .and_then(|prefix| prefix.parse().ok())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non-numeric smtp reply code: {line:?}"),
                )
            })?;
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
        if line.len() == 3 || line.as_bytes()[3] == b' ' {
            return Ok((code, text));
        }
    }
}

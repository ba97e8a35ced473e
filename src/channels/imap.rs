//! Minimal blocking IMAP client over rustls.
//!
//! Only what the replier needs: LOGIN, SELECT, UID SEARCH, UID FETCH,
//! UID STORE, LOGOUT. Run it inside `spawn_blocking`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls_pki_types::ServerName;
use tracing::debug;

use crate::error::TransportError;

const IO_TIMEOUT: Duration = Duration::from_secs(30);

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Untagged lines and literals returned for one tagged command.
#[derive(Debug, Default)]
pub struct ImapResponse {
    pub lines: Vec<String>,
    pub literals: Vec<Vec<u8>>,
}

impl ImapResponse {
    /// UIDs listed in `* SEARCH` lines.
    pub fn search_ids(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix("* SEARCH"))
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect()
    }
}

/// An authenticated-or-not IMAP connection.
pub struct ImapSession {
    reader: BufReader<TlsStream>,
    next_tag: u32,
}

impl ImapSession {
    /// Connect over implicit TLS and read the server greeting.
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let tcp = TcpStream::connect((host, port)).map_err(|e| TransportError::Connect {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        })?;
        tcp.set_read_timeout(Some(IO_TIMEOUT))?;
        tcp.set_write_timeout(Some(IO_TIMEOUT))?;

        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TransportError::Tls(format!("invalid server name {host}: {e}")))?;
        let conn = rustls::ClientConnection::new(Arc::new(tls_config), server_name)
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        let mut session = Self {
            reader: BufReader::new(rustls::StreamOwned::new(conn, tcp)),
            next_tag: 1,
        };
        let greeting = session.read_line()?;
        debug!(greeting = %greeting.trim_end(), "IMAP connected");
        Ok(session)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), TransportError> {
        self.command(&format!(
            "LOGIN {} {}",
            quote(username),
            quote(password)
        ))?;
        Ok(())
    }

    pub fn select_inbox(&mut self) -> Result<(), TransportError> {
        self.command("SELECT \"INBOX\"")?;
        Ok(())
    }

    /// UIDs of messages without the `\Seen` flag.
    pub fn search_unseen(&mut self) -> Result<Vec<String>, TransportError> {
        Ok(self.command("UID SEARCH UNSEEN")?.search_ids())
    }

    /// Raw RFC 5322 bytes of a message. `BODY.PEEK` leaves `\Seen` alone.
    pub fn fetch_raw(&mut self, uid: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let response = self.command(&format!("UID FETCH {uid} BODY.PEEK[]"))?;
        Ok(response.literals.into_iter().next())
    }

    pub fn mark_seen(&mut self, uid: &str) -> Result<(), TransportError> {
        self.command(&format!("UID STORE {uid} +FLAGS (\\Seen)"))?;
        Ok(())
    }

    /// Best effort; the connection is dropped either way.
    pub fn logout(mut self) {
        if let Err(e) = self.command("LOGOUT") {
            debug!(error = %e, "IMAP logout failed");
        }
    }

    /// Send a tagged command and collect its response up to the tagged status line.
    pub fn command(&mut self, command: &str) -> Result<ImapResponse, TransportError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;
        let tagged = format!("{tag} ");

        let stream = self.reader.get_mut();
        stream.write_all(format!("{tag} {command}\r\n").as_bytes())?;
        stream.flush()?;

        // Never echo arguments: LOGIN carries the password.
        let verb = command.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
        let mut response = ImapResponse::default();

        loop {
            let line = self.read_line()?;

            if let Some(status) = line.strip_prefix(tagged.as_str()) {
                if status.starts_with("OK") {
                    return Ok(response);
                }
                return Err(TransportError::Imap {
                    command: verb,
                    response: line.trim_end().to_string(),
                });
            }

            if let Some(len) = literal_length(&line) {
                let mut literal = vec![0u8; len];
                self.reader.read_exact(&mut literal)?;
                response.literals.push(literal);
            }
            response.lines.push(line);
        }
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Err(TransportError::Closed);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Byte count of a `{N}` literal announced at the end of a response line.
fn literal_length(line: &str) -> Option<usize> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let inner = trimmed.strip_suffix('}')?;
    let open = inner.rfind('{')?;
    inner[open + 1..].parse().ok()
}

/// IMAP quoted string.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_length_parsed_from_fetch_line() {
        assert_eq!(
            literal_length("* 12 FETCH (UID 7 BODY[] {3456}\r\n"),
            Some(3456)
        );
        assert_eq!(literal_length("* 12 FETCH (FLAGS (\\Seen))\r\n"), None);
        assert_eq!(literal_length("* OK {not a number}\r\n"), None);
    }

    #[test]
    fn search_ids_collected() {
        let response = ImapResponse {
            lines: vec![
                "* SEARCH 3 5 8\r\n".into(),
                "* SEARCH\r\n".into(),
                "* OK done\r\n".into(),
            ],
            literals: vec![],
        };
        assert_eq!(response.search_ids(), vec!["3", "5", "8"]);
    }

    #[test]
    fn quote_escapes_specials() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"pa"ss\word"#), r#""pa\"ss\\word""#);
    }
}

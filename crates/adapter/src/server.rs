//! TCP server for the session protocol
//!
//! Each connection is served by its own task: one request line in, one
//! response line out, in order. Sessions are not tied to connections; any
//! client holding a session id may drive that session.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use crate::core::{GameError, Shape};
use crate::protocol::*;
use crate::service::{ServiceOptions, SessionService};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub record_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub log_path: Option<String>,
    pub max_sessions: usize,
    /// Longest accepted request line, newline excluded.
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            record_path: None,
            seed: None,
            log_path: None,
            max_sessions: 1024,
            max_line_bytes: 64 * 1024,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ServerConfig {
    /// Create from `BLOCK_PUZZLE_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = non_empty_var("BLOCK_PUZZLE_HOST").unwrap_or(defaults.host);
        let port = non_empty_var("BLOCK_PUZZLE_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let record_path = non_empty_var("BLOCK_PUZZLE_RECORD_PATH").map(PathBuf::from);
        let seed = non_empty_var("BLOCK_PUZZLE_SEED").and_then(|s| s.parse().ok());
        let log_path = non_empty_var("BLOCK_PUZZLE_LOG_PATH");
        let max_sessions = non_empty_var("BLOCK_PUZZLE_MAX_SESSIONS")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.max_sessions);
        let max_line_bytes = non_empty_var("BLOCK_PUZZLE_MAX_LINE_BYTES")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.max_line_bytes);

        Self {
            host,
            port,
            record_path,
            seed,
            log_path,
            max_sessions,
            max_line_bytes,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            seed: self.seed,
            max_sessions: self.max_sessions,
            record_path: self.record_path.clone(),
        }
    }
}

/// Fail fast if `host:port` cannot be bound
pub fn check_tcp_listen_available(host: &str, port: u16) -> std::io::Result<()> {
    let listener = std::net::TcpListener::bind((host, port))?;
    drop(listener);
    Ok(())
}

/// Answer one request line
///
/// Lines that are not valid requests get an `invalid_request` error echoing
/// whatever `seq` could be recovered.
pub fn handle_line(service: &SessionService, line: &str) -> ResponseMessage {
    let parsed = match parse_message(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            let seq = extract_seq_best_effort(line).unwrap_or(0);
            return ResponseMessage::Error(create_error(
                seq,
                ErrorCode::InvalidRequest,
                &format!("malformed request: {}", err),
            ));
        }
    };

    match parsed {
        ParsedMessage::Init(msg) => respond(msg.seq, service.init(msg.session_id.as_deref()), |(id, snap)| {
            ResponseMessage::State(create_state(msg.seq, &id, &snap))
        }),
        ParsedMessage::Place(msg) => {
            let result = Shape::from_rows(&msg.piece.shape[..])
                .map_err(GameError::from)
                .and_then(|shape| service.place(&msg.session_id, &shape, msg.row, msg.col));
            respond(msg.seq, result, |outcome| {
                ResponseMessage::Placed(create_placed(msg.seq, &outcome))
            })
        }
        ParsedMessage::RequestPieces(msg) => {
            respond(msg.seq, service.request_new_pieces(&msg.session_id), |snap| {
                ResponseMessage::Pieces(create_pieces(msg.seq, &snap))
            })
        }
        ParsedMessage::GetState(msg) => {
            let id = crate::core::SessionId::new(msg.session_id.as_str());
            respond(msg.seq, service.get_state(&msg.session_id), |snap| {
                ResponseMessage::State(create_state(msg.seq, &id, &snap))
            })
        }
        ParsedMessage::GetTopRecord(msg) => respond(msg.seq, service.top_record(), |record| {
            ResponseMessage::Record(create_record(msg.seq, record.as_ref()))
        }),
        ParsedMessage::SaveTopRecord(msg) => {
            respond(msg.seq, service.save_top_record(&msg.name, msg.score), |record| {
                ResponseMessage::Record(create_record(msg.seq, Some(&record)))
            })
        }
        ParsedMessage::Unknown(unknown) => ResponseMessage::Error(create_error(
            unknown.seq,
            ErrorCode::InvalidRequest,
            &format!("unknown message type: {:?}", unknown.msg_type),
        )),
    }
}

fn respond<T>(
    seq: u64,
    result: Result<T, GameError>,
    ok: impl FnOnce(T) -> ResponseMessage,
) -> ResponseMessage {
    match result {
        Ok(value) => ok(value),
        Err(err) => ResponseMessage::Error(create_game_error(seq, &err)),
    }
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up, which lets
/// tests bind port 0.
pub async fn run_server(
    config: ServerConfig,
    service: Arc<SessionService>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);
    let max_line_bytes = config.max_line_bytes;

    let listener = TcpListener::bind(config.bind_addr()).await?;
    let bound = listener.local_addr()?;
    println!("[Server] TCP server listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        println!("[Server] Client {} connected from {}", client_id, addr);

        let service = Arc::clone(&service);
        let wire_log_tx = wire_log_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, service, max_line_bytes, wire_log_tx).await {
                eprintln!("[Server] Client {} error: {}", client_id, e);
            }
            println!("[Server] Client {} disconnected", client_id);
        });
    }
}

/// Append every request and response line to `path`
fn spawn_wire_log(path: String) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[Server] Wire log {} unavailable: {}", path, e);
                return;
            }
        };

        while let Some(bytes) = rx.recv().await {
            if file.write_all(&bytes).await.is_err() || file.write_all(b"\n").await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    tx
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    service: Arc<SessionService>,
    max_line_bytes: usize,
    wire_log_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);
    let mut raw: Vec<u8> = Vec::with_capacity(4096);
    let mut buf: Vec<u8> = Vec::with_capacity(4096);

    loop {
        raw.clear();
        // One byte past the cap tells an oversized line apart from one that fits exactly.
        let bytes_read = (&mut reader)
            .take(max_line_bytes as u64 + 1)
            .read_until(b'\n', &mut raw)
            .await?;
        if bytes_read == 0 {
            break;
        }

        if bytes_read > max_line_bytes && !raw.ends_with(b"\n") {
            let seq = extract_seq_best_effort(&String::from_utf8_lossy(&raw)).unwrap_or(0);
            skip_rest_of_line(&mut reader, max_line_bytes).await?;
            let error = ResponseMessage::Error(create_error(
                seq,
                ErrorCode::InvalidRequest,
                &format!("request line exceeds {} bytes", max_line_bytes),
            ));
            write_response(&mut writer, &mut buf, &error, wire_log_tx.as_ref()).await?;
            continue;
        }

        let line = String::from_utf8_lossy(&raw);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(tx) = wire_log_tx.as_ref() {
            let _ = tx.send(trimmed.as_bytes().to_vec());
        }

        // Session locks and record file writes block; keep them off the reactor.
        let request = trimmed.to_string();
        let service = Arc::clone(&service);
        let response = tokio::task::spawn_blocking(move || handle_line(&service, &request)).await?;
        write_response(&mut writer, &mut buf, &response, wire_log_tx.as_ref()).await?;
    }

    Ok(())
}

/// Discard input up to and including the next newline
async fn skip_rest_of_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    chunk: usize,
) -> std::io::Result<()> {
    let mut scratch = Vec::with_capacity(chunk.min(4096));
    loop {
        scratch.clear();
        let n = (&mut *reader)
            .take(chunk as u64)
            .read_until(b'\n', &mut scratch)
            .await?;
        if n == 0 || scratch.ends_with(b"\n") {
            return Ok(());
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    buf: &mut Vec<u8>,
    response: &ResponseMessage,
    wire_log_tx: Option<&mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    buf.clear();
    serde_json::to_writer(&mut *buf, response)?;
    if let Some(tx) = wire_log_tx {
        let _ = tx.send(buf.clone());
    }
    buf.push(b'\n');
    writer.write_all(buf).await?;
    writer.flush().await?;
    Ok(())
}

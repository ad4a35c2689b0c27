use std::sync::Arc;
use std::time::Duration;

use summary_stream::prelude::*;
use summary_stream::vendors::http::{HttpUploader, HttpUploaderConfig};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};

/// How the scripted server ends its chunked response.
enum Ending {
    Clean,
    DropConnection,
    Hold,
}

/// Serves one upload, answering with `chunks` as separate HTTP chunks.
async fn scripted_server(chunks: Vec<Vec<u8>>, ending: Ending) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        read_request(&mut socket).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ntransfer-encoding: chunked\r\n\r\n",
            )
            .await
            .expect("head");
        for chunk in chunks {
            let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
            frame.extend_from_slice(&chunk);
            frame.extend_from_slice(b"\r\n");
            socket.write_all(&frame).await.expect("chunk");
            socket.flush().await.expect("flush");
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        match ending {
            Ending::Clean => {
                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.flush().await;
            }
            Ending::DropConnection => drop(socket),
            Ending::Hold => {
                let mut sink = [0_u8; 64];
                // Held open until the client goes away.
                while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
            }
        }
    });
    format!("http://{addr}/upload")
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0_u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut tmp).await.expect("read request");
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let chunked = headers.contains("transfer-encoding: chunked");
    loop {
        let complete = if chunked {
            buf[header_end..].ends_with(b"0\r\n\r\n")
        } else {
            buf.len() >= header_end + content_length
        };
        if complete {
            break;
        }
        let n = socket.read(&mut tmp).await.expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

fn session_for(endpoint: String) -> UploadSession {
    let uploader = HttpUploader::new(HttpUploaderConfig::new(endpoint)).expect("uploader");
    UploadSession::new(Arc::new(uploader))
}

fn payload() -> FilePayload {
    FilePayload::new("lecture.mp4", vec![7_u8; 2048]).mime_type("video/mp4")
}

#[tokio::test]
async fn summary_chunks_stream_into_one_script() {
    let endpoint = scripted_server(
        vec![
            br#"{"summary":"Hel"}"#.to_vec(),
            br#"{"summary":"lo"}"#.to_vec(),
        ],
        Ending::Clean,
    )
    .await;
    let session = session_for(endpoint);

    let mut snapshots = Vec::new();
    let script = session
        .submit(payload())
        .await
        .expect("submit")
        .for_each_snapshot(|so_far| snapshots.push(so_far.to_owned()))
        .await
        .expect("completed");

    assert_eq!(script, "Hello");
    assert_eq!(snapshots.first().map(String::as_str), Some("Hel"));
    assert_eq!(session.view(), SessionView {
        state: SessionState::Completed,
        output: "Hello".into(),
    });
}

#[tokio::test]
async fn plain_text_and_split_characters_are_reassembled() {
    let text = "hello wörld, ünïcode";
    let bytes = text.as_bytes();
    let split = text.find('ö').expect("umlaut") + 1;
    let endpoint = scripted_server(
        vec![bytes[..split].to_vec(), bytes[split..].to_vec()],
        Ending::Clean,
    )
    .await;

    let script = session_for(endpoint)
        .submit(payload())
        .await
        .expect("submit")
        .finish()
        .await
        .expect("completed");
    assert_eq!(script, text);
}

#[tokio::test]
async fn dropped_connection_fails_with_partial_output() {
    let endpoint = scripted_server(
        vec![br#"{"summary":"Partial "}"#.to_vec()],
        Ending::DropConnection,
    )
    .await;
    let session = session_for(endpoint);

    let err = session
        .submit(payload())
        .await
        .expect("submit")
        .finish()
        .await
        .expect_err("connection dropped mid-stream");
    assert!(matches!(
        err,
        UploadError::SessionFailed { failure: SessionFailure::Stream { .. }, .. }
    ));
    assert_eq!(err.partial_output(), Some("Partial "));
    assert_eq!(session.output(), "Partial ");
}

#[tokio::test]
async fn concurrent_submit_is_rejected_until_abort() {
    let endpoint = scripted_server(vec![b"first words".to_vec()], Ending::Hold).await;
    let session = session_for(endpoint);
    let mut updates = session.subscribe();

    let run = session.submit(payload()).await.expect("submit");
    updates
        .wait_for(|view| view.output == "first words")
        .await
        .expect("first snapshot");

    assert!(matches!(session.submit(payload()).await, Err(UploadError::Busy)));
    assert_eq!(session.state(), SessionState::Streaming);
    assert_eq!(session.output(), "first words");

    run.abort_handle().abort();
    let err = run.finish().await.expect_err("aborted");
    assert_eq!(err.partial_output(), Some("first words"));
    assert_eq!(session.state(), SessionState::Failed(SessionFailure::Cancelled));
}

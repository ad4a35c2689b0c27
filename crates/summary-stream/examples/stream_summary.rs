use std::sync::Arc;

use summary_stream::prelude::*;
use summary_stream::vendors::http::HttpUploader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), UploadError> {
    summary_stream::init_observability();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| UploadError::Validation("usage: stream_summary <video-file>".into()))?;
    let payload = FilePayload::from_path(&path).await?;

    let session = UploadSession::new(Arc::new(HttpUploader::from_env()?));
    let mut run = session.submit(payload).await?;

    let mut printed = 0;
    while let Some(event) = run.next_event().await {
        match event {
            SessionEvent::Snapshot { output, .. } => {
                print!("{}", &output[printed..]);
                printed = output.len();
            }
            SessionEvent::Completed { .. } => println!(),
            SessionEvent::Failed { error, .. } => eprintln!("upload failed: {error}"),
            SessionEvent::Submitting { .. } | SessionEvent::Streaming { .. } => {}
        }
    }

    let _ = run.finish().await?;
    Ok(())
}

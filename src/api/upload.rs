/// Multipart file upload with live transfer progress
///
/// `POST /storage/file` streams the file body instead of buffering it,
/// and reports real byte-level progress: the file reader is wrapped so
/// every chunk handed to the HTTP client also bumps a percentage on a
/// side channel. The whole upload is exposed as a single
/// `Stream<Item = UploadEvent>` the UI subscribes to with an abortable
/// task, so closing the modal cancels the transfer.

use futures::channel::mpsc;
use futures::{future, stream, StreamExt};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;
use tracing::info;

use super::{ApiError, Client};

#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// Bytes written so far, as a percentage (0-100)
    Progress(f32),
    /// Terminal event; the stream ends after this
    Done(Result<(), ApiError>),
}

/// Upload a file, yielding progress events followed by one `Done`.
pub fn upload_file(client: Client, path: PathBuf) -> impl stream::Stream<Item = UploadEvent> {
    let (tx, rx) = mpsc::unbounded();

    let driver = async move {
        let result = run_upload(client, path, tx.clone()).await;
        let _ = tx.unbounded_send(UploadEvent::Done(result));
    };

    // Poll the upload future alongside the event channel; the stream
    // terminates once the sender is dropped after `Done`.
    stream::select(
        rx,
        stream::once(driver).filter_map(|_| future::ready(None)),
    )
}

async fn run_upload(
    client: Client,
    path: PathBuf,
    progress: mpsc::UnboundedSender<UploadEvent>,
) -> Result<(), ApiError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    let total = tokio::fs::metadata(&path)
        .await
        .map_err(|err| ApiError::Http(format!("cannot stat {}: {err}", path.display())))?
        .len();
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|err| ApiError::Http(format!("cannot open {}: {err}", path.display())))?;

    info!("uploading {file_name} ({total} bytes, {mime})");

    let mut sent: u64 = 0;
    let counted = ReaderStream::new(file).inspect(move |chunk| {
        if let Ok(bytes) = chunk {
            sent += bytes.len() as u64;
            let percent = if total == 0 {
                100.0
            } else {
                (sent as f32 / total as f32) * 100.0
            };
            let _ = progress.unbounded_send(UploadEvent::Progress(percent.min(100.0)));
        }
    });

    let part = reqwest::multipart::Part::stream_with_length(
        reqwest::Body::wrap_stream(counted),
        total,
    )
    .file_name(file_name)
    .mime_str(mime.essence_str())
    .map_err(|err| ApiError::Http(err.to_string()))?;

    let form = reqwest::multipart::Form::new().part("file", part);
    client
        .send_unit(client.post("/storage/file").multipart(form))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_error_done() {
        let client = Client::new("http://localhost:1", None);
        let events: Vec<UploadEvent> =
            upload_file(client, PathBuf::from("/nonexistent/upload.bin"))
                .collect()
                .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], UploadEvent::Done(Err(_))));
    }
}

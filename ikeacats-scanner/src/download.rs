use crate::error::{HarvestError, Result};
use crate::model::{Catalogue, DownloadedFile};
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Progress of a single file transfer.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started {
        title: String,
        url: String,
        total_bytes: Option<u64>,
    },
    Progress {
        downloaded: u64,
    },
    Finished {
        title: String,
        bytes: u64,
    },
}

pub type DownloadCallback = Arc<dyn Fn(DownloadEvent) + Send + Sync>;

/// Create the target directory and any missing parents.
pub async fn ensure_target_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| HarvestError::TargetDirectory {
            path: path.to_path_buf(),
            source,
        })
}

/// Stream the catalogue's PDF to `<target>/<title>.pdf`, replacing any file
/// already there.
pub async fn download_to(
    client: &Client,
    catalogue: &Catalogue,
    target: &Path,
    callback: Option<&DownloadCallback>,
) -> Result<DownloadedFile> {
    let path = target.join(catalogue.file_name());
    info!("Downloading {} ({})", catalogue.title, catalogue.url);

    let response = client.get(&catalogue.url).send().await?.error_for_status()?;
    let total_bytes = response.content_length();

    if let Some(cb) = callback {
        cb(DownloadEvent::Started {
            title: catalogue.title.clone(),
            url: catalogue.url.clone(),
            total_bytes,
        });
    }

    let mut file = File::create(&path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(cb) = callback {
            cb(DownloadEvent::Progress { downloaded });
        }
    }
    file.flush().await?;

    debug!("Wrote {} bytes to {}", downloaded, path.display());
    if let Some(cb) = callback {
        cb(DownloadEvent::Finished {
            title: catalogue.title.clone(),
            bytes: downloaded,
        });
    }

    Ok(DownloadedFile {
        title: catalogue.title.clone(),
        url: catalogue.url.clone(),
        path,
        bytes: downloaded,
    })
}

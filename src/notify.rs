//! Outbound notifications.
//!
//! The API never talks to a mail provider directly; it hands a
//! [`Notification`] to a [`NotificationSink`]. The bundled sink appends the
//! message to a local file, which is enough for development and tests.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> io::Result<()>;
}

/// Appends each notification to a log file instead of sending it.
#[derive(Debug, Clone)]
pub struct FileNotificationSink {
    path: PathBuf,
}

impl FileNotificationSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NotificationSink for FileNotificationSink {
    async fn deliver(&self, notification: &Notification) -> io::Result<()> {
        let entry = format!(
            "--- EMAIL TO {} ---\nSubject: {}\n{}\n--- END OF EMAIL ---\n",
            notification.to_email, notification.subject, notification.body
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

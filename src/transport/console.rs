//! Console transport - drives the workflow from stdin
//!
//! Commands, one per line:
//! - `start`: show the greeting
//! - `image <path-or-url> [name]`: upload one image
//! - `folder <dir>`: upload every image under a directory as one batch
//! - `<n>`: press button `n` of the most recent prompt
//! - `quit`: leave
//!
//! Any other line is treated as a raw selection token.

use crate::{
    models::{ChatId, FileRef, Upload},
    transport::{MessageId, Prompt, Transport},
    utils::PathExt,
    workflow::Workflow,
};
use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicI64, Ordering},
    time::Instant,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use walkdir::WalkDir;

/// Buttons of the last prompt shown in a chat, with the prompt's message id.
type ShownPrompt = (MessageId, Vec<String>);

pub struct ConsoleTransport {
    output_dir: PathBuf,
    http: reqwest::Client,
    next_message: AtomicI64,
    last_prompt: DashMap<ChatId, ShownPrompt>,
}

impl ConsoleTransport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            http: reqwest::Client::new(),
            next_message: AtomicI64::new(1),
            last_prompt: DashMap::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn allocate(&self) -> MessageId {
        self.next_message.fetch_add(1, Ordering::Relaxed)
    }

    /// Token and message id behind button `index` (1-based) of the last prompt.
    fn pressed(&self, chat: ChatId, index: usize) -> Option<(String, MessageId)> {
        let shown = self.last_prompt.get(&chat)?;
        let (message, tokens) = shown.value();
        let token = tokens.get(index.checked_sub(1)?)?;
        Some((token.clone(), *message))
    }
}

impl Transport for ConsoleTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        let id = self.allocate();
        println!("[{chat}#{id}] {text}");
        Ok(id)
    }

    async fn send_prompt(&self, chat: ChatId, prompt: &Prompt) -> Result<MessageId> {
        let id = self.allocate();
        println!("[{chat}#{id}] {}", prompt.text);
        for (index, button) in prompt.buttons.iter().enumerate() {
            println!("    {:>2}) {:<32} {}", index + 1, button.label, button.token);
        }
        self.last_prompt
            .insert(chat, (id, prompt.tokens().map(str::to_string).collect()));
        Ok(id)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
        debug!("Deleted message {} in chat {}", message, chat);
        Ok(())
    }

    async fn download(&self, file: &FileRef, dest: &Path) -> Result<()> {
        let source = file.0.as_str();
        if is_remote(source) {
            let bytes = self
                .http
                .get(source)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .with_context(|| format!("request for {source} failed"))?
                .bytes()
                .await
                .with_context(|| format!("failed to read body of {source}"))?;
            tokio::fs::write(dest, &bytes)
                .await
                .with_context(|| format!("failed to write {:?}", dest))?;
        } else {
            tokio::fs::copy(source, dest)
                .await
                .with_context(|| format!("failed to copy {source} to {:?}", dest))?;
        }
        Ok(())
    }

    async fn send_document(&self, chat: ChatId, path: &Path, filename: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("failed to create output dir {:?}", self.output_dir))?;
        let target = self.output_dir.join(filename);
        tokio::fs::copy(path, &target)
            .await
            .with_context(|| format!("failed to copy {:?} to {:?}", path, target))?;
        let id = self.allocate();
        println!("[{chat}#{id}] document {}", target.display());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────
// Command loop
// ────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Command {
    Start,
    Image { source: String, name: Option<String> },
    Folder(PathBuf),
    Press(usize),
    Quit,
    Token(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match head {
        "start" | "/start" => Command::Start,
        "quit" | "exit" => Command::Quit,
        "image" if !rest.is_empty() => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let source = parts.next().unwrap_or_default().to_string();
            let name = parts.next().map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
            Command::Image { source, name }
        }
        "folder" if !rest.is_empty() => Command::Folder(PathBuf::from(rest)),
        _ => match line.parse::<usize>() {
            Ok(index) => Command::Press(index),
            Err(_) => Command::Token(line.to_string()),
        },
    };
    Some(command)
}

/// Text printed for `--help`.
pub fn usage() -> String {
    let heic = if cfg!(feature = "heic") {
        "HEIC/HEIF input: supported"
    } else {
        "HEIC/HEIF input: not supported in this build (rebuild with `--features heic`)"
    };
    format!(
        "Usage: photo-stamp [--help]\n\
         \n\
         Reads commands from stdin:\n  \
           start                      show the greeting\n  \
           image <path-or-url> [name] upload one image\n  \
           folder <dir>               upload every image under <dir> as one batch\n  \
           <n>                        press button <n> of the last prompt\n  \
           quit                       leave\n\
         Any other line is sent as a raw selection token.\n\
         \n\
         Environment: STAMP_LOGO_DIR, STAMP_SCRATCH_DIR, STAMP_OUTPUT_DIR,\n\
         STAMP_IDLE_GAP_MS, STAMP_MAX_UPLOAD_BYTES, RUST_LOG\n\
         \n\
         {heic}\n"
    )
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Describe a local file or URL the way a chat service would. Remote sizes
/// and types come from a `HEAD` request.
async fn describe(http: &reqwest::Client, source: &str, name: Option<String>) -> Result<Upload> {
    let file_name = name.or_else(|| {
        let trimmed = source.split(['?', '#']).next().unwrap_or(source);
        Path::new(trimmed)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    });
    let named_mime = file_name.as_deref().map(|name| {
        Path::new(name)
            .image_mime()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    });

    let (size, mime_type) = if is_remote(source) {
        let response = http
            .head(source)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("request for {source} failed"))?;
        let headers = response.headers();
        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        let served_mime = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
        (size, served_mime.or(named_mime))
    } else {
        let size = tokio::fs::metadata(source)
            .await
            .with_context(|| format!("cannot read {source}"))?
            .len();
        (size, named_mime)
    };

    Ok(Upload {
        file: FileRef(source.to_string()),
        file_name,
        mime_type,
        size,
    })
}

fn folder_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{:?} is not a directory", dir);
    }
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_image_file())
        .collect();
    images.sort();
    Ok(images)
}

/// Read commands from stdin until EOF or `quit`, all in one chat.
pub async fn run(workflow: &Workflow<ConsoleTransport>, chat: ChatId) -> Result<()> {
    let http = &workflow.transport().http;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Console ready, type `start` or `image <path>`");

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(command) = parse_command(&line) else {
            continue;
        };
        match command {
            Command::Start => workflow.greet(chat).await,
            Command::Quit => break,
            Command::Image { source, name } => match describe(http, &source, name).await {
                Ok(upload) => workflow.handle_image(chat, upload, Instant::now()).await,
                Err(err) => error!("{:#}", err),
            },
            Command::Folder(dir) => match folder_images(&dir) {
                Ok(paths) => {
                    info!("Uploading {} image(s) from {:?}", paths.len(), dir);
                    for path in paths {
                        let source = path.to_string_lossy().into_owned();
                        match describe(http, &source, None).await {
                            Ok(upload) => workflow.handle_image(chat, upload, Instant::now()).await,
                            Err(err) => error!("{:#}", err),
                        }
                    }
                }
                Err(err) => error!("{:#}", err),
            },
            Command::Press(index) => match workflow.transport().pressed(chat, index) {
                Some((token, origin)) => {
                    workflow.handle_selection(chat, &token, Some(origin)).await
                }
                None => warn!("No button {} on the last prompt", index),
            },
            Command::Token(token) => workflow.handle_selection(chat, &token, None).await,
        }
    }

    workflow.cleanup(chat);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Button;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("start"), Some(Command::Start));
        assert_eq!(
            parse_command("image ./a b.jpg  cover.png"),
            Some(Command::Image {
                source: "./a".into(),
                name: Some("b.jpg  cover.png".into())
            })
        );
        assert_eq!(parse_command("folder /tmp/in"), Some(Command::Folder("/tmp/in".into())));
        assert_eq!(parse_command("2"), Some(Command::Press(2)));
        assert_eq!(
            parse_command("crop:keep:abc"),
            Some(Command::Token("crop:keep:abc".into()))
        );
        assert_eq!(parse_command("image"), Some(Command::Token("image".into())));
    }

    #[test]
    fn usage_states_heif_support() {
        let text = usage();
        assert!(text.contains("image <path-or-url> [name]"));
        assert!(text.contains("STAMP_LOGO_DIR"));
        let supported = text.contains("HEIC/HEIF input: supported");
        assert_eq!(supported, cfg!(feature = "heic"));
        assert_eq!(text.contains("--features heic"), !cfg!(feature = "heic"));
    }

    #[tokio::test]
    async fn describes_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("Cover.JPG");
        std::fs::write(&photo, [0u8; 10]).unwrap();
        let http = reqwest::Client::new();
        let upload = describe(&http, photo.to_str().unwrap(), None).await.unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("Cover.JPG"));
        assert_eq!(upload.size, 10);
        assert!(upload.is_image());

        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"hi").unwrap();
        let described = describe(&http, notes.to_str().unwrap(), None).await.unwrap();
        assert!(!described.is_image());
    }

    #[tokio::test]
    async fn remote_uploads_report_served_size() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let read = socket.read(&mut request).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 31457281\r\n\
                      Content-Type: image/jpeg\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            String::from_utf8_lossy(&request[..read]).into_owned()
        });

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let url = format!("http://{addr}/big.bin");
        let upload = describe(&http, &url, None).await.unwrap();
        assert_eq!(upload.size, 31 * 1024 * 1024 + 1);
        assert_eq!(upload.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(upload.file_name.as_deref(), Some("big.bin"));
        assert!(server.await.unwrap().starts_with("HEAD /big.bin"));
    }

    #[tokio::test]
    async fn numbered_press_resolves_last_prompt() {
        let transport = ConsoleTransport::new(std::env::temp_dir());
        let prompt = Prompt {
            text: "pick".into(),
            buttons: vec![
                Button { label: "a".into(), token: "crop:square:g".into() },
                Button { label: "b".into(), token: "crop:keep:g".into() },
            ],
        };
        let id = transport.send_prompt(5, &prompt).await.unwrap();
        assert_eq!(transport.pressed(5, 2), Some(("crop:keep:g".to_string(), id)));
        assert_eq!(transport.pressed(5, 0), None);
        assert_eq!(transport.pressed(5, 3), None);
        assert_eq!(transport.pressed(6, 1), None);
    }

    #[tokio::test]
    async fn documents_land_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("0001_photo_edit.jpg");
        std::fs::write(&produced, b"jpeg").unwrap();
        let transport = ConsoleTransport::new(dir.path().join("out"));
        transport.send_document(1, &produced, "photo_edit.jpg").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("out/photo_edit.jpg")).unwrap(), b"jpeg");
    }

    #[test]
    fn folder_lists_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "skip.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let images = folder_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.jpg", "b.png"]);
    }
}

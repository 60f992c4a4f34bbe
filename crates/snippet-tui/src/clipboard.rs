use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard through whichever platform copy utility is installed.
#[derive(Debug, Default)]
pub struct SystemClipboard;

const COPY_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip.exe", &[]),
];

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        for (program, args) in COPY_COMMANDS {
            let Ok(mut child) = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            else {
                continue;
            };

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(text.as_bytes())
                    .with_context(|| format!("writing to {}", program))?;
            }
            let status = child.wait().with_context(|| format!("waiting for {}", program))?;
            if status.success() {
                debug!(program, bytes = text.len(), "copied to clipboard");
                return Ok(());
            }
        }

        Err(anyhow!("no clipboard utility available"))
    }
}

/// Keeps every write in memory.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub writes: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.writes
            .lock()
            .map_err(|_| anyhow!("clipboard lock poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}

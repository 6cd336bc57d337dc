//! Command implementations.
//!
//! Each command reads from `input` and writes its result to `out`, so the
//! binary wires them to stdin/stdout and tests to in-memory buffers.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use common::protocol::{ErrorResponse, SealedNote};
use serde_json::json;
use textcipher::{CipherKey, Note, NoteContent, NoteSealer, TextCipher};
use tracing::info;

use crate::cli::Command;

/// Run `command`. `cipher` must be present for every command that
/// [needs a key](Command::needs_key).
pub fn dispatch<R: Read, W: Write>(
    command: Command,
    cipher: Option<&TextCipher>,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let keyed = || cipher.context("FERNET_KEY is required for this command");
    match command {
        Command::Keygen => keygen(out),
        Command::Encrypt { text } => {
            let cipher = keyed()?;
            let text = match text {
                Some(t) => t,
                None => strip_newline(read_all(input)?),
            };
            writeln!(out, "{}", cipher.encrypt(&text)?)?;
            Ok(())
        }
        Command::Decrypt { token } => {
            let cipher = keyed()?;
            let token = arg_or_input(token, input)?;
            writeln!(out, "{}", cipher.decrypt(&token)?)?;
            Ok(())
        }
        Command::Inspect { token } => {
            let cipher = keyed()?;
            let token = arg_or_input(token, input)?;
            let info = cipher.inspect(&token)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
            Ok(())
        }
        Command::Seal => seal(keyed()?, input, out),
        Command::Open => open(keyed()?, input, out),
    }
}

fn keygen<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", CipherKey::generate().to_base64())?;
    info!("generated new key");
    Ok(())
}

fn seal<R: Read, W: Write>(cipher: &TextCipher, input: &mut R, out: &mut W) -> Result<()> {
    let note: Note =
        serde_json::from_str(&read_all(input)?).context("stdin is not a valid note")?;
    let sealed = NoteSealer::new(cipher.clone()).seal(&note)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&sealed)?)?;
    info!(note_id = %sealed.id, "note sealed");
    Ok(())
}

fn open<R: Read, W: Write>(cipher: &TextCipher, input: &mut R, out: &mut W) -> Result<()> {
    let sealed: SealedNote =
        serde_json::from_str(&read_all(input)?).context("stdin is not a valid sealed note")?;
    let opened = NoteSealer::new(cipher.clone()).open(&sealed);

    let mut view = json!({
        "id": opened.id.to_string(),
        "title": opened.title,
        "tags": opened.tags,
    });
    match &opened.content {
        NoteContent::Readable(text) => {
            view["status"] = json!("readable");
            view["content"] = json!(text);
        }
        NoteContent::Unavailable(e) => {
            view["status"] = json!("unavailable");
            view["error"] = serde_json::to_value(ErrorResponse::from(e))?;
        }
    }
    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
    Ok(())
}

fn read_all<R: Read>(input: &mut R) -> Result<String> {
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn arg_or_input<R: Read>(arg: Option<String>, input: &mut R) -> Result<String> {
    match arg {
        Some(a) => Ok(a.trim().to_owned()),
        None => Ok(read_all(input)?.trim().to_owned()),
    }
}

fn strip_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

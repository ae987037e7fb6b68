//! Per-connection session protocol: send the `start` banner, then read a
//! line, dispatch on its command word, write a response, repeat until the
//! client disconnects.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use phrasedex_core::{search_phrase, CoreError, SearchResults};

use crate::error::ServerError;
use crate::indexer::Indexer;

/// Handle one connection end to end. Errors writing back to the client end
/// the session; they are not propagated, since one bad connection must
/// never affect any other (`ClientIo`, §7).
pub fn handle(stream: TcpStream, indexer: Arc<Indexer>) {
    let peer = stream.peer_addr().ok();
    if let Err(err) = serve(stream, &indexer) {
        let err = ServerError::ClientIo(err);
        tracing::debug!(?peer, error = %err, "session ended with I/O error");
    }
}

fn serve(stream: TcpStream, indexer: &Indexer) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    writer.write_all(b"start\n")?;
    writer.flush()?;

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(());
        }

        let command = line.trim_matches(|c: char| matches!(c, ' ' | '\r' | '\n' | '\t'));
        respond(&mut writer, command, indexer)?;
        writer.flush()?;
    }
}

fn respond(writer: &mut impl Write, command: &str, indexer: &Indexer) -> std::io::Result<()> {
    if command == "ping" {
        return writer.write_all(b"pong\n");
    }

    if let Some(phrase) = command.strip_prefix("search ") {
        return respond_search(writer, phrase, indexer);
    }

    writer.write_all(b"[!] Unknown command\n")
}

fn respond_search(writer: &mut impl Write, phrase: &str, indexer: &Indexer) -> std::io::Result<()> {
    if !indexer.is_ready() {
        return writer.write_all(b"in process\n");
    }

    let matches = match search_phrase(indexer.store(), phrase) {
        Ok(matches) => matches,
        // An empty tokenized phrase is not an error the client sees: it is
        // simply zero matches (§7, `QueryEmpty` -> `OK 0`).
        Err(CoreError::EmptyQuery) => SearchResults::new(),
    };

    writeln!(writer, "OK {}", matches.len())?;
    for (path, postings) in &matches {
        let csv = postings
            .iter()
            .map(|p| p.char_offset.to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{path}\t{csv}")?;
    }
    Ok(())
}

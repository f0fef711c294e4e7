use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::errors::AppError;

/// Extracts paragraph text from a DOCX archive held in memory.
pub(super) fn extract_docx(bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Extraction(format!("Failed to open DOCX: {e}")))?;

    let xml = read_document_xml(&mut archive)?;
    parse_document_xml(&xml)
}

fn read_document_xml<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<String, AppError> {
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| AppError::Extraction(format!("DOCX has no word/document.xml: {e}")))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Extraction(format!("Failed to read document.xml: {e}")))?;
    Ok(xml)
}

/// Concatenates `w:t` runs, one line per `w:p` paragraph. Runs split words
/// arbitrarily, so no separator is inserted between them. `w:tab` becomes a
/// tab and `w:br`/`w:cr` a line break, but only inside a `w:r` run: the
/// paragraph properties carry `w:tab` stop definitions too.
fn parse_document_xml(xml: &str) -> Result<String, AppError> {
    // Whitespace is significant inside `xml:space="preserve"` runs, so text is not trimmed.
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_run = false;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if in_run => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let decoded = e
                    .decode()
                    .map_err(|e| AppError::Extraction(format!("DOCX text is not valid UTF-8: {e}")))?;
                text.push_str(&decoded);
            }
            // Entity and character references arrive as their own events.
            Ok(Event::GeneralRef(r)) if in_text_run => {
                if let Ok(Some(ch)) = r.resolve_char_ref() {
                    text.push(ch);
                } else if let Some(resolved) =
                    r.decode().ok().and_then(|name| predefined_entity(&name))
                {
                    text.push_str(resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::Extraction(format!("DOCX XML parsing error: {e}")));
            }
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

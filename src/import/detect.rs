use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

use super::error::ImportError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    DelimitedText { delimiter: u8 },
    Spreadsheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    Zip,
    Ole2,
    Unknown,
}

/// Pick a parser for an upload. The suffix selects the format; the leading
/// bytes must agree with it, since the filename is whatever the client sent.
/// The stream is rewound before returning.
pub(crate) fn detect_format<R: Read + Seek>(
    filename: &str,
    content: &mut R,
) -> Result<Format, ImportError> {
    let Some(claimed) = format_for_name(filename) else {
        debug!(filename, "unrecognised statement suffix");
        return Err(ImportError::UnsupportedFormat);
    };
    let signature = sniff(content)?;

    match (claimed, signature) {
        (Format::Spreadsheet, Signature::Zip)
        | (Format::DelimitedText { .. }, Signature::Unknown) => Ok(claimed),
        _ => {
            debug!(filename, ?claimed, ?signature, "statement content does not match suffix");
            Err(ImportError::UnsupportedFormat)
        }
    }
}

fn format_for_name(filename: &str) -> Option<Format> {
    let ext = Path::new(filename.trim())
        .extension()?
        .to_str()?
        .to_lowercase();
    match ext.as_str() {
        "csv" => Some(Format::DelimitedText { delimiter: b',' }),
        "tsv" => Some(Format::DelimitedText { delimiter: b'\t' }),
        "xlsx" => Some(Format::Spreadsheet),
        _ => None,
    }
}

fn sniff<R: Read + Seek>(content: &mut R) -> Result<Signature, ImportError> {
    let mut head = [0u8; 8];
    let mut filled = 0;
    while filled < head.len() {
        let n = content
            .read(&mut head[filled..])
            .map_err(|e| ImportError::parse(None, e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    content
        .seek(SeekFrom::Start(0))
        .map_err(|e| ImportError::parse(None, e))?;

    let head = &head[..filled];
    Ok(if head.starts_with(ZIP_MAGIC) {
        Signature::Zip
    } else if head.starts_with(OLE2_MAGIC) {
        Signature::Ole2
    } else {
        Signature::Unknown
    })
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;

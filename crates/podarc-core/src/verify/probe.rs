//! Shallow readability probe: enough bytes to recognise an audio container.

use std::fs::File;
use std::io::Read;
use std::path::Path;

const HEADER_LEN: usize = 12;

/// Recognises ID3, raw MPEG frames, MP4 (`ftyp`), Ogg, RIFF/WAVE and FLAC.
pub fn looks_like_audio(header: &[u8]) -> bool {
    header.starts_with(b"ID3")
        || (header.len() >= 2 && header[0] == 0xFF && header[1] & 0xE0 == 0xE0)
        || (header.len() >= 8 && &header[4..8] == b"ftyp")
        || header.starts_with(b"OggS")
        || header.starts_with(b"RIFF")
        || header.starts_with(b"fLaC")
}

/// Opens `path` and checks it is non-empty and starts like an audio file.
/// `Err` carries the reason shown to the operator.
pub fn probe_audio(path: &Path) -> Result<u64, String> {
    let mut f = File::open(path).map_err(|e| format!("cannot open: {}", e))?;
    let len = f
        .metadata()
        .map_err(|e| format!("cannot stat: {}", e))?
        .len();
    if len == 0 {
        return Err("file is empty".to_string());
    }
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match f.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => return Err(format!("cannot read: {}", e)),
        }
    }
    if !looks_like_audio(&header[..filled]) {
        return Err("no recognizable audio header".to_string());
    }
    Ok(len)
}

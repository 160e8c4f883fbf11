//! Zlib stream helpers shared by the pack and loose read paths.

use std::io::Read;

use flate2::bufread::ZlibDecoder;

/// Inflate exactly `expected` bytes from the start of `input`.
///
/// The compressed payload may be followed by unrelated bytes (the next pack
/// entry); the decoder stops once the declared length is produced. A stream
/// that ends short of `expected` is an error.
pub fn inflate_exact(input: &[u8], expected: usize) -> std::io::Result<Vec<u8>> {
    let mut out = vec![0u8; expected];
    let mut decoder = ZlibDecoder::new(input);
    decoder.read_exact(&mut out)?;
    Ok(out)
}

/// Inflate the whole stream (loose object files).
pub fn inflate_all(input: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = ZlibDecoder::new(input);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Inflate up to `window` bytes, tolerating streams that end earlier.
///
/// Used by the type probe, which only needs the first few decompressed bytes.
pub fn inflate_window(input: &[u8], window: usize) -> std::io::Result<Vec<u8>> {
    let mut out = vec![0u8; window];
    let mut decoder = ZlibDecoder::new(input);
    let mut filled = 0;
    while filled < window {
        let n = decoder.read(&mut out[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    out.truncate(filled);
    Ok(out)
}

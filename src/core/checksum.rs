/*!
 * SHA-256 checksums over files as written to disk
 */

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Calculate the uppercase hex SHA-256 of a file's exact bytes
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let mut file = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024]; // 64KB buffer

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}

/// Uppercase hex SHA-256 of an in-memory buffer
pub fn checksum_bytes(data: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(data))
}

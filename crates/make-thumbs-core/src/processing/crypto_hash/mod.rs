//! Computes the content fingerprint of a file using SHA-256.
//!
//! The file is streamed through the hasher in fixed-size chunks, so memory use does
//! not depend on file size. The result depends only on the bytes, never on the name
//! or location of the file.
//!
//! # Errors
//!
//! Returns an error if the file cannot be opened or read. Callers skip the file and
//! carry on with the walk.
use crate::error::Result;
use crate::types::ContentFingerprint;
use sha2::{Digest, Sha256};

use std::{fs::File, io::Read, path::Path};

/// Size of the read buffer used while hashing
pub const HASH_BUFFER_SIZE: usize = 128 * 1024;

/// Compute the SHA-256 fingerprint of a file
pub fn compute_fingerprint<P: AsRef<Path>>(path: P) -> Result<ContentFingerprint> {
    // Open the file with explicit scope to ensure it's closed promptly
    let digest = {
        let mut file = File::open(&path)?;

        let mut hasher = Sha256::new();

        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        hasher.finalize()
    };

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Ok(ContentFingerprint(bytes))
}

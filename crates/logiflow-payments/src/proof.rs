//! Proof-of-Payment Storage
//!
//! Stores uploaded bytes and hands back an opaque handle that is recorded on
//! the payment request. Content is not inspected.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{PaymentError, Result};

/// Proof storage trait
pub trait ProofStorage: Send + Sync {
    /// Store an uploaded file, returning its handle
    fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String>;
}

/// Keep a short alphanumeric extension from the client's file name
fn sanitized_extension(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?;
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

fn fresh_handle(original_name: Option<&str>) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    match sanitized_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}

/// Proofs written as files into a local directory
pub struct LocalProofStorage {
    dir: PathBuf,
}

impl LocalProofStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProofStorage for LocalProofStorage {
    fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let handle = fresh_handle(original_name);
        std::fs::write(self.dir.join(&handle), bytes)?;

        tracing::info!(
            handle = %handle,
            bytes = bytes.len(),
            "Stored proof of payment"
        );
        Ok(handle)
    }
}

/// In-memory proof storage (for tests)
#[derive(Default)]
pub struct MemoryProofStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryProofStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `handle`
    pub fn get(&self, handle: &str) -> Option<Vec<u8>> {
        self.files.read().ok()?.get(handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProofStorage for MemoryProofStorage {
    fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        let handle = fresh_handle(original_name);
        self.files
            .write()
            .map_err(|_| PaymentError::Storage("proof storage lock poisoned".into()))?
            .insert(handle.clone(), bytes.to_vec());
        Ok(handle)
    }
}

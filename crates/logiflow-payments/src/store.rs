//! Payment Request Storage
//!
//! Keyed access to payment requests. Mutations go through [`PaymentStore::update`],
//! which runs the caller's change under the store's write lock so two requests
//! touching the same collection cannot overwrite each other.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::model::{PaymentRequest, Reference};

/// Change applied to a stored record inside [`PaymentStore::update`]
pub type RecordUpdate<'a> = &'a mut dyn FnMut(&mut PaymentRequest) -> Result<()>;

/// Payment request storage trait
pub trait PaymentStore: Send + Sync {
    /// Get a request by reference
    fn get(&self, reference: &Reference) -> Result<Option<PaymentRequest>>;

    /// All requests, in insertion order
    fn list(&self) -> Result<Vec<PaymentRequest>>;

    /// Insert a new request; fails with `Conflict` if the reference is taken
    fn insert(&self, request: PaymentRequest) -> Result<()>;

    /// Apply `apply` to the stored request and persist the result
    ///
    /// Returns `Ok(None)` if no request has this reference. If `apply` fails
    /// the stored request is left untouched.
    fn update(
        &self,
        reference: &Reference,
        apply: RecordUpdate<'_>,
    ) -> Result<Option<PaymentRequest>>;
}

fn duplicate(reference: &Reference) -> PaymentError {
    PaymentError::Conflict(format!("Reference already exists: {reference}"))
}

fn poisoned<T>(_: T) -> PaymentError {
    PaymentError::Storage("store lock poisoned".into())
}

/// Apply an update to a copy so a failed change leaves the collection intact
fn apply_in_place(
    payments: &mut [PaymentRequest],
    reference: &Reference,
    apply: RecordUpdate<'_>,
) -> Result<Option<PaymentRequest>> {
    let Some(slot) = payments.iter_mut().find(|p| &p.reference == reference) else {
        return Ok(None);
    };
    let mut updated = slot.clone();
    apply(&mut updated)?;
    *slot = updated.clone();
    Ok(Some(updated))
}

/// In-memory payment store (for development and tests)
#[derive(Default)]
pub struct MemoryPaymentStore {
    payments: RwLock<Vec<PaymentRequest>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for MemoryPaymentStore {
    fn get(&self, reference: &Reference) -> Result<Option<PaymentRequest>> {
        let payments = self.payments.read().map_err(poisoned)?;
        Ok(payments.iter().find(|p| &p.reference == reference).cloned())
    }

    fn list(&self) -> Result<Vec<PaymentRequest>> {
        Ok(self.payments.read().map_err(poisoned)?.clone())
    }

    fn insert(&self, request: PaymentRequest) -> Result<()> {
        let mut payments = self.payments.write().map_err(poisoned)?;
        if payments.iter().any(|p| p.reference == request.reference) {
            return Err(duplicate(&request.reference));
        }
        payments.push(request);
        Ok(())
    }

    fn update(
        &self,
        reference: &Reference,
        apply: RecordUpdate<'_>,
    ) -> Result<Option<PaymentRequest>> {
        let mut payments = self.payments.write().map_err(poisoned)?;
        apply_in_place(&mut payments, reference, apply)
    }
}

/// On-disk document layout: `{ "payments": [...] }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct PaymentDocument {
    #[serde(default)]
    payments: Vec<PaymentRequest>,
}

/// Payment store backed by a single JSON document
///
/// Every call reads the whole document and every mutation rewrites it. The
/// mutex serializes read-modify-write cycles inside this process; separate
/// processes sharing the file are not coordinated.
pub struct JsonFilePaymentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePaymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(poisoned)
    }

    /// Read the document; a missing or unparseable file reads as empty
    fn read_document(&self) -> Result<PaymentDocument> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PaymentDocument::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Payment data unreadable, treating as empty"
                );
                Ok(PaymentDocument::default())
            }
        }
    }

    /// Replace the document: write a sibling temp file, then rename over
    fn write_document(&self, document: &PaymentDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            records = document.payments.len(),
            "Wrote payment data"
        );
        Ok(())
    }
}

impl PaymentStore for JsonFilePaymentStore {
    fn get(&self, reference: &Reference) -> Result<Option<PaymentRequest>> {
        let _guard = self.guard()?;
        let document = self.read_document()?;
        Ok(document
            .payments
            .into_iter()
            .find(|p| &p.reference == reference))
    }

    fn list(&self) -> Result<Vec<PaymentRequest>> {
        let _guard = self.guard()?;
        Ok(self.read_document()?.payments)
    }

    fn insert(&self, request: PaymentRequest) -> Result<()> {
        let _guard = self.guard()?;
        let mut document = self.read_document()?;
        if document
            .payments
            .iter()
            .any(|p| p.reference == request.reference)
        {
            return Err(duplicate(&request.reference));
        }
        document.payments.push(request);
        self.write_document(&document)
    }

    fn update(
        &self,
        reference: &Reference,
        apply: RecordUpdate<'_>,
    ) -> Result<Option<PaymentRequest>> {
        let _guard = self.guard()?;
        let mut document = self.read_document()?;
        let updated = apply_in_place(&mut document.payments, reference, apply)?;
        if updated.is_some() {
            self.write_document(&document)?;
        }
        Ok(updated)
    }
}

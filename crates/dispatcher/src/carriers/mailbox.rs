//! Mailbox - in-memory carrier collecting delivered payloads

use contracts::{Carrier, ContractError, PrintDocument};
use std::borrow::Borrow;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Separator placed between merged print documents
pub const PAGE_BREAK: char = '\u{0C}';

/// Carrier that keeps every payload it receives
///
/// Shared through an `Arc`: strategies deliver into it, the caller drains it
/// after the batch.
pub struct Mailbox<T> {
    name: String,
    box_: Mutex<Vec<T>>,
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            box_: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // A poisoned box still holds valid payloads.
        self.box_.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True if the mailbox contains mail
    pub fn has_mail(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Number of stored payloads
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the most recently delivered payload
    pub fn fetch(&self) -> Option<T> {
        self.lock().pop()
    }

    /// Remove and return all payloads in delivery order
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }
}

impl<T: Clone> Mailbox<T> {
    /// Copy of the stored payloads, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}

impl Mailbox<PrintDocument> {
    /// Drain all documents, merged into one printable body
    ///
    /// Returns `None` when the mailbox is empty.
    pub fn fetch_all(&self) -> Option<String> {
        let docs = self.drain();
        if docs.is_empty() {
            return None;
        }
        let sep = PAGE_BREAK.to_string();
        Some(
            docs.iter()
                .map(|d| d.body.as_str())
                .collect::<Vec<_>>()
                .join(&sep),
        )
    }
}

impl<P, T> Carrier<P> for Mailbox<T>
where
    P: ToOwned<Owned = T> + ?Sized,
    T: Borrow<P> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, payload: &P, _address: Option<&str>) -> Result<(), ContractError> {
        let mut box_ = self.lock();
        box_.push(payload.to_owned());
        debug!(carrier = %self.name, stored = box_.len(), "Stored in mailbox");
        Ok(())
    }
}

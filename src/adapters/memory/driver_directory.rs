//! Static driver directory.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, DriverId, VendorId};
use crate::ports::DriverDirectory;

/// Directory with a fixed pool of available drivers.
///
/// Hands out drivers in insertion order; an empty pool means no driver
/// is available, which callers treat as a normal condition.
#[derive(Default)]
pub struct StaticDriverDirectory {
    available: Mutex<Vec<DriverId>>,
}

impl StaticDriverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that always answers with the given drivers.
    pub fn with_drivers(drivers: Vec<DriverId>) -> Self {
        Self {
            available: Mutex::new(drivers),
        }
    }

    /// Makes one more driver available.
    pub fn add_driver(&self, driver: DriverId) {
        self.available
            .lock()
            .expect("directory lock poisoned")
            .push(driver);
    }
}

#[async_trait]
impl DriverDirectory for StaticDriverDirectory {
    async fn nearest_available(
        &self,
        _vendor: VendorId,
    ) -> Result<Option<DriverId>, DomainError> {
        let mut available = self.available.lock().expect("directory lock poisoned");
        if available.is_empty() {
            Ok(None)
        } else {
            Ok(Some(available.remove(0)))
        }
    }
}

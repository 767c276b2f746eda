//! DriverDirectory port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, DriverId, VendorId};

/// Port for locating a driver to assign to a ready order.
///
/// Lookup is best-effort: `None` means no driver is currently available
/// near the vendor, which is a normal, retryable condition rather than
/// an error.
#[async_trait]
pub trait DriverDirectory: Send + Sync {
    /// Finds the nearest available driver for a vendor's location.
    async fn nearest_available(&self, vendor: VendorId)
        -> Result<Option<DriverId>, DomainError>;
}

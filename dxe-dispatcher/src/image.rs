//! Driver images
//!
//! The dispatcher does not know how a driver is loaded or what its entry
//! point does. It only drives the two steps through [`DriverImage`].

use dxe_api::Result;
use dxe_protocol_db::ProtocolDatabase;

/// A loadable driver
pub trait DriverImage {
    /// Load the image
    ///
    /// A `SecurityViolation` parks the driver as untrusted until it is
    /// explicitly trusted. Any other error removes it from dispatch for good.
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run the entry point; typically installs protocols into `db`
    fn start(&mut self, db: &ProtocolDatabase) -> Result<()>;
}

/// Entry-point closures are drivers that always load
impl<F> DriverImage for F
where
    F: FnMut(&ProtocolDatabase) -> Result<()>,
{
    fn start(&mut self, db: &ProtocolDatabase) -> Result<()> {
        self(db)
    }
}

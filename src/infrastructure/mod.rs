// Adapters for external collaborators
// Key-value storage, location sensor, place and generation providers

pub mod api;
pub mod sensor;
pub mod storage;

#[cfg(not(target_arch = "wasm32"))]
pub mod cache;

/// Thread-safety bound that only applies off the browser.
///
/// Browser handles (`Storage`, `Geolocation`, fetch futures) are `!Send`, while
/// the native server shares services across tokio tasks.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

//! Authentication seam.
//!
//! The controller asks a single question of the outside world: is this token
//! allowed to power this equipment? Implementations may call a remote service
//! or a local store. Any `Err` is treated by the controller exactly like a
//! denial.

use crate::{EquipmentId, Result, Token};
use std::future::Future;

/// Answers whether a token may use a piece of equipment.
///
/// The returned future is `Send` so the controller tick loop can run on a
/// multi-threaded runtime; implementations may still be written as `async fn`.
///
/// # Examples
///
/// ```
/// use rpac_core::{Authenticator, EquipmentId, Result, Token};
///
/// struct AllowOne(Token);
///
/// impl Authenticator for AllowOne {
///     async fn authenticate(&self, _equipment: EquipmentId, token: &Token) -> Result<bool> {
///         Ok(*token == self.0)
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync {
    /// Return `Ok(true)` when the token is authorized on the equipment.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthService` when the backing service cannot answer.
    fn authenticate(
        &self,
        equipment: EquipmentId,
        token: &Token,
    ) -> impl Future<Output = Result<bool>> + Send;
}

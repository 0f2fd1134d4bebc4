//! Admin Gate: restricts configuration calls to the single stored owner.

use crate::error::{MarketplaceError, Result};
use crate::types::{Address, MarketplaceState};

/// Check that `caller` is the marketplace owner.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for any other caller.
pub fn authorize(state: &MarketplaceState, caller: &Address) -> Result<()> {
    if state.owner == *caller {
        Ok(())
    } else {
        Err(MarketplaceError::Unauthorized { caller: *caller })
    }
}

/// Replace the owner. The caller must already have been authorized.
///
/// Returns the previous owner.
pub fn transfer_ownership(state: &mut MarketplaceState, new_owner: Address) -> Address {
    std::mem::replace(&mut state.owner, new_owner)
}

/// Replace the token-rail address. The caller must already have been authorized.
pub fn set_token_rail(state: &mut MarketplaceState, token: Address) {
    state.token_rail = token;
}

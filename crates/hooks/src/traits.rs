//! Ante decorator trait

use crate::error::HookResult;
use crate::msgs::Tx;
use lockup_store::Context;

/// Pre-execution check over a whole transaction
///
/// Runs before any message executes. An error rejects the transaction and
/// nothing it contains is applied.
pub trait AnteDecorator: Send + Sync {
    /// Hook name for logging
    fn name(&self) -> &str;

    /// Priority (lower = runs first)
    fn priority(&self) -> u32 {
        100
    }

    fn ante_handle(&self, ctx: &Context<'_>, tx: &Tx) -> HookResult<()>;
}

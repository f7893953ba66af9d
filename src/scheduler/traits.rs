/*!
 * Scheduler Traits
 * Interface implemented by scheduling policies
 */

use super::policy::Dispatch;
use super::types::DispatchOutcome;
use crate::config::PolicyKind;

/// A scheduling policy decides how long one dispatch runs
pub trait DispatchPolicy: Send + Sync {
    /// Drive `dispatch` until the policy releases the core
    fn dispatch(&self, dispatch: &mut Dispatch<'_>) -> DispatchOutcome;

    /// Policy discriminant
    fn kind(&self) -> PolicyKind;
}

//! Controller-only gating for administrative operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gamevault_protocol::Address;

/// Errors raised by the controller check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller is not the current controller.
    #[error("caller {caller} is not the controller")]
    NotController {
        /// Rejected caller.
        caller: Address,
    },

    /// The proposed controller is the null address.
    #[error("controller is the null address")]
    InvalidController,
}

/// Holds the single privileged account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    controller: Address,
}

impl AccessControl {
    /// Installs `controller`. The null address is rejected.
    pub fn new(controller: Address) -> Result<Self, AccessError> {
        if controller.is_zero() {
            return Err(AccessError::InvalidController);
        }
        Ok(Self { controller })
    }

    /// The current controller.
    pub fn controller(&self) -> Address {
        self.controller
    }

    /// Fails unless `caller` is the controller.
    pub fn require_controller(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller != self.controller {
            return Err(AccessError::NotController { caller: *caller });
        }
        Ok(())
    }

    /// Hands control to `new_controller`. Returns the previous controller.
    ///
    /// Authorization is checked before the argument, so a non-controller
    /// passing the null address sees `NotController`.
    pub fn set_controller(
        &mut self,
        caller: &Address,
        new_controller: Address,
    ) -> Result<Address, AccessError> {
        self.require_controller(caller)?;
        if new_controller.is_zero() {
            return Err(AccessError::InvalidController);
        }
        Ok(std::mem::replace(&mut self.controller, new_controller))
    }
}

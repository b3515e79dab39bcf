use quartermaster_engine::LedgerError;
use thiserror::Error;

use crate::actuator::ActuatorError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Could not initialize the dispatcher. {0}")]
    InitializeError(String),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Actuator fault: {0}")]
    Actuator(#[from] ActuatorError),
}

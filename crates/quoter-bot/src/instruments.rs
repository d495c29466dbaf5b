//! Instrument lookup by composed name.

use std::collections::HashMap;

use quoter_core::ContractId;
use quoter_mm::{InstrumentInfo, StartupError};
use tracing::debug;

use crate::config::{InstrumentConfig, InstrumentEntry};

/// Known instruments keyed by composed name.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    by_name: HashMap<String, InstrumentInfo>,
}

impl InstrumentRegistry {
    pub fn new(entries: &[InstrumentEntry]) -> Self {
        let by_name = entries
            .iter()
            .map(|e| {
                let info = InstrumentInfo {
                    contract_id: ContractId::new(e.contract_id),
                    name: e.name.clone(),
                    lot_size: e.lot_size,
                };
                (e.name.clone(), info)
            })
            .collect();
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Resolve the configured instrument.
    pub fn resolve(&self, instrument: &InstrumentConfig) -> Result<InstrumentInfo, StartupError> {
        let name = instrument.composed_name();
        let info = self
            .by_name
            .get(&name)
            .cloned()
            .ok_or(StartupError::InstrumentNotFound(name))?;
        debug!(
            name = %info.name,
            contract = %info.contract_id,
            lot_size = info.lot_size,
            "Instrument resolved"
        );
        Ok(info)
    }
}

//! Adapter construction by source short_name, grounded on the teacher's
//! `rootsignal_domains::scraping::adapters::build_ingestor` factory-function
//! dispatch (spec §4.1/§6: `create(config, logger) -> adapter`).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use airweave_common::AirweaveError;

use crate::adapter::SourceAdapter;

pub type AdapterFactory =
    Arc<dyn Fn(BTreeMap<String, Value>, Value) -> Result<Arc<dyn SourceAdapter>, AirweaveError> + Send + Sync>;

#[derive(Default)]
pub struct SourceAdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl SourceAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, short_name: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(short_name.into(), factory);
    }

    /// Constructs a fresh adapter instance for one job. `credentials` is the
    /// decrypted map from the credential store (C10); `config` is the
    /// per-source-connection config struct, opaque to the registry.
    pub fn create(
        &self,
        short_name: &str,
        credentials: BTreeMap<String, Value>,
        config: Value,
    ) -> Result<Arc<dyn SourceAdapter>, AirweaveError> {
        let factory = self
            .factories
            .get(short_name)
            .ok_or_else(|| AirweaveError::Config(format!("no source adapter registered for {short_name}")))?;
        factory(credentials, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSourceAdapter;

    #[test]
    fn creates_a_registered_adapter_by_short_name() {
        let mut registry = SourceAdapterRegistry::new();
        registry.register(
            "mock",
            Arc::new(|_creds, _config| Ok(Arc::new(MockSourceAdapter::new("mock", vec![])) as Arc<dyn SourceAdapter>)),
        );

        let adapter = registry.create("mock", BTreeMap::new(), Value::Null).unwrap();
        assert_eq!(adapter.name(), "mock");
    }

    #[test]
    fn unregistered_short_name_is_a_config_error() {
        let registry = SourceAdapterRegistry::new();
        let result = registry.create("unknown", BTreeMap::new(), Value::Null);
        assert!(matches!(result, Err(AirweaveError::Config(_))));
    }
}

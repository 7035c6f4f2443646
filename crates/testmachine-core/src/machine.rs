//! TestMachine: the registration surface over catalog and driver.
use rand::RngCore;
use std::sync::Arc;

use crate::catalog::{OperationCatalog, OperationId};
use crate::config::SearchConfig;
use crate::driver::SearchDriver;
use crate::error::ConfigurationError;
use crate::operation::{Check, Generator, Operation};
use crate::outcome::RunResult;
use crate::reporter::Reporter;
use crate::tag::TypeTag;
use crate::value::Value;

/// Collects generators, operations and checks, then runs the search.
///
/// Registration is only possible before [`TestMachine::run`]; afterwards
/// every `add_*` call returns [`ConfigurationError::RegistrationClosed`].
pub struct TestMachine {
    catalog: OperationCatalog,
    config: SearchConfig,
    reporter: Option<Box<dyn Reporter>>,
    started: bool,
}

impl TestMachine {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            catalog: OperationCatalog::new(),
            config,
            reporter: None,
            started: false,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfig {
        &mut self.config
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    pub fn set_reporter(&mut self, reporter: impl Reporter + 'static) {
        self.reporter = Some(Box::new(reporter));
    }

    /// Register one operation. A generator whose name is already taken gets
    /// a numeric suffix (`generate_floats_2`); any other clash is a
    /// [`ConfigurationError::DuplicateOperation`].
    pub fn add_operation(&mut self, operation: impl Into<Operation>) -> Result<OperationId, ConfigurationError> {
        let operation = operation.into();
        if self.started {
            return Err(ConfigurationError::RegistrationClosed(
                operation.name().to_string(),
            ));
        }
        let operation = match operation {
            Operation::Generator(generator) if self.catalog.find(generator.name()).is_some() => {
                let name = self.unused_name(generator.name());
                Operation::Generator(generator.with_name(name))
            }
            other => other,
        };
        self.catalog.register(operation)
    }

    /// Register a batch, e.g. one of the stock catalogs. Stops at the first
    /// error; operations before it stay registered.
    pub fn add<I>(&mut self, operations: I) -> Result<(), ConfigurationError>
    where
        I: IntoIterator,
        I::Item: Into<Operation>,
    {
        for operation in operations {
            self.add_operation(operation)?;
        }
        Ok(())
    }

    /// Register a generator named after its tag (`generate_floats`, then
    /// `generate_floats_2`, ...).
    pub fn add_generator<F>(&mut self, tag: TypeTag, draw: F) -> Result<OperationId, ConfigurationError>
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        let name = format!("generate_{}", tag.name());
        self.add_operation(Generator::new(name, tag, draw))
    }

    fn unused_name(&self, base: &str) -> String {
        let mut n = 2;
        let mut name = format!("{}_{}", base, n);
        while self.catalog.find(&name).is_some() {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        name
    }

    pub fn add_check<F>(
        &mut self,
        tags: Vec<TypeTag>,
        predicate: F,
        name: impl Into<String>,
    ) -> Result<OperationId, ConfigurationError>
    where
        F: Fn(&[Value]) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.add_operation(Check::new(name, tags, predicate))
    }

    /// Close registration and search. Runs at most once.
    pub fn run(&mut self) -> Result<RunResult, ConfigurationError> {
        if self.started {
            return Err(ConfigurationError::NotIdle("finished".to_string()));
        }
        let mut driver = SearchDriver::new(Arc::new(self.catalog.clone()), self.config.clone())?;
        self.started = true;
        if let Some(reporter) = self.reporter.take() {
            driver = driver.with_reporter(reporter);
        }
        driver.run()
    }

    /// A driver over the current catalog, for replaying reported failures.
    pub fn driver(&self) -> Result<SearchDriver, ConfigurationError> {
        SearchDriver::new(Arc::new(self.catalog.clone()), self.config.clone())
    }
}

impl Default for TestMachine {
    fn default() -> Self {
        Self::new()
    }
}

//! Fluent Given-When-Then harness for registry operations.

#![allow(clippy::module_name_repetitions)]

use inviteme_core::environment::RegistryEnvironment;
use inviteme_core::error::RegistryError;
use inviteme_core::registry::InviteRegistry;
use inviteme_core::types::RegistryConfig;

type Setup = Box<dyn FnOnce(&mut InviteRegistry)>;
type Operation<T> = Box<dyn FnOnce(&mut InviteRegistry) -> Result<T, RegistryError>>;
type ValueAssertion<T> = Box<dyn FnOnce(T)>;
type ErrorAssertion = Box<dyn FnOnce(&RegistryError)>;
type StateAssertion = Box<dyn FnOnce(&InviteRegistry)>;

/// Readable Given-When-Then syntax for exercising one registry operation.
///
/// # Example
///
/// ```ignore
/// ScenarioTest::new(env)
///     .given(|registry| { fixtures::birthday_party(registry); })
///     .when(|registry| registry.mint_invite(&host(), EventId::new(1), &guest(), "ipfs://1"))
///     .then_ok(|token_id| assert_eq!(token_id, TokenId::new(1)))
///     .then_state(|registry| assert_eq!(registry.event(EventId::new(1)).unwrap().minted_count, 1))
///     .run();
/// ```
pub struct ScenarioTest<T> {
    registry: InviteRegistry,
    setups: Vec<Setup>,
    operation: Option<Operation<T>>,
    value_assertion: Option<ValueAssertion<T>>,
    error_assertion: Option<ErrorAssertion>,
    state_assertions: Vec<StateAssertion>,
}

impl<T> ScenarioTest<T> {
    /// Starts a scenario on a fresh registry with the default configuration
    #[must_use]
    pub fn new(env: RegistryEnvironment) -> Self {
        Self::with_registry(InviteRegistry::new(env))
    }

    /// Starts a scenario on a fresh registry with an explicit configuration
    #[must_use]
    pub fn with_config(env: RegistryEnvironment, config: RegistryConfig) -> Self {
        Self::with_registry(InviteRegistry::with_config(env, config))
    }

    /// Starts a scenario on a pre-built registry
    #[must_use]
    pub fn with_registry(registry: InviteRegistry) -> Self {
        Self {
            registry,
            setups: Vec::new(),
            operation: None,
            value_assertion: None,
            error_assertion: None,
            state_assertions: Vec::new(),
        }
    }

    /// Arrange step; may be chained, runs in order (Given)
    #[must_use]
    pub fn given<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut InviteRegistry) + 'static,
    {
        self.setups.push(Box::new(setup));
        self
    }

    /// The operation under test (When)
    #[must_use]
    pub fn when<F>(mut self, operation: F) -> Self
    where
        F: FnOnce(&mut InviteRegistry) -> Result<T, RegistryError> + 'static,
    {
        self.operation = Some(Box::new(operation));
        self
    }

    /// Assert the operation succeeded, with access to its value (Then)
    #[must_use]
    pub fn then_ok<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(T) + 'static,
    {
        self.value_assertion = Some(Box::new(assertion));
        self
    }

    /// Assert the operation failed, with access to the error (Then)
    #[must_use]
    pub fn then_err<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&RegistryError) + 'static,
    {
        self.error_assertion = Some(Box::new(assertion));
        self
    }

    /// Assert on the registry after the operation ran (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&InviteRegistry) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Run the scenario and execute all assertions.
    ///
    /// # Panics
    ///
    /// Panics if no operation was set, if the outcome (ok/err) contradicts
    /// the registered assertion, or if any assertion fails.
    #[allow(clippy::panic, clippy::expect_used)]
    pub fn run(mut self)
    where
        T: std::fmt::Debug,
    {
        for setup in self.setups {
            setup(&mut self.registry);
        }

        let operation = self.operation.expect("operation must be set with when()");
        let outcome = operation(&mut self.registry);

        match outcome {
            Ok(value) => {
                assert!(
                    self.error_assertion.is_none(),
                    "expected an error, but the operation succeeded with {value:?}",
                );
                if let Some(assertion) = self.value_assertion {
                    assertion(value);
                }
            }
            Err(error) => {
                assert!(
                    self.value_assertion.is_none(),
                    "expected success, but the operation failed with {error}",
                );
                match self.error_assertion {
                    Some(assertion) => assertion(&error),
                    None => panic!("operation failed unexpectedly: {error}"),
                }
            }
        }

        for assertion in self.state_assertions {
            assertion(&self.registry);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{fixtures, mocks};
    use inviteme_core::types::EventId;

    #[test]
    fn runs_setups_operation_and_assertions_in_order() {
        ScenarioTest::new(mocks::test_env().0)
            .given(|registry| {
                fixtures::birthday_party(registry);
            })
            .when(|registry| registry.event(EventId::new(1)).map(|event| event.id))
            .then_ok(|id| assert_eq!(id, EventId::new(1)))
            .then_state(|registry| assert_eq!(registry.event_count(), 1))
            .run();
    }

    #[test]
    #[should_panic(expected = "operation failed unexpectedly")]
    fn unexpected_failure_panics() {
        ScenarioTest::new(mocks::test_env().0)
            .when(|registry| registry.event(EventId::new(42)).map(|event| event.id))
            .run();
    }
}

//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use ticket_marketplace_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Type alias for error assertion functions
type ErrorAssertion<Err> = Box<dyn FnOnce(&Err)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// A test either expects the action to be accepted (`then_state`,
/// `then_effects`) or rejected (`then_error`). Mixing both panics in `run`.
///
/// # Example
///
/// ```ignore
/// use ticket_marketplace_testing::ReducerTest;
///
/// ReducerTest::new(MarketplaceReducer::new())
///     .with_env(env)
///     .given_state(MarketplaceState::new(ADMIN, TOKEN))
///     .when_action(Call::new(ADMIN, MarketplaceAction::CreateEvent {
///         max_tickets: 100,
///         price_native: Amount::new(10),
///         price_token: Amount::new(5),
///     }))
///     .then_state(|state| assert_eq!(state.event_count(), 1))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E, Err>
where
    R: Reducer<State = S, Action = A, Environment = E, Error = Err>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion<Err>>,
}

impl<R, S, A, E, Err> ReducerTest<R, S, A, E, Err>
where
    R: Reducer<State = S, Action = A, Environment = E, Error = Err>,
    Err: std::fmt::Debug,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the action to be rejected and check the error (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Err) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// if the outcome is not the one asserted on, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let expects_error = !self.error_assertions.is_empty();
        assert!(
            !(expects_error
                && (!self.state_assertions.is_empty() || !self.effect_assertions.is_empty())),
            "then_error() cannot be combined with then_state() or then_effects()"
        );

        match self.reducer.reduce(&mut state, action, &env) {
            Ok(effects) => {
                assert!(!expects_error, "Expected the action to be rejected, got {} effects", effects.len());
                for assertion in self.state_assertions {
                    assertion(&state);
                }
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(expects_error, "Expected the action to be accepted, got {error:?}");
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use ticket_marketplace_core::effect::Effect;
    use ticket_marketplace_core::Notification;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that no effect touches a collaborator
    ///
    /// # Panics
    ///
    /// Panics if a `PullTokens` or `Issue` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_external_effects(effects: &[Effect]) {
        assert!(
            !effects.iter().any(Effect::is_external),
            "Expected no external effects, but found {effects:?}"
        );
    }

    /// Assert that exactly one notification is published and return it
    ///
    /// # Panics
    ///
    /// Panics if the effects carry zero or several notifications.
    #[allow(clippy::panic)] // Test assertion
    #[must_use]
    pub fn single_notification(effects: &[Effect]) -> &Notification {
        let notifications: Vec<&Notification> = effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect();
        assert_eq!(
            notifications.len(),
            1,
            "Expected exactly one notification, found {notifications:?}"
        );
        notifications[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;
    use ticket_marketplace_core::{Address, Notification};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Decrement,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Underflow;

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;
        type Error = Underflow;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Result<SmallVec<[Effect; 4]>, Underflow> {
            match action {
                TestAction::Increment => state.count += 1,
                TestAction::Decrement if state.count == 0 => return Err(Underflow),
                TestAction::Decrement => state.count -= 1,
            }
            Ok(SmallVec::new())
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_rejection() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Decrement)
            .then_error(|error| {
                assert_eq!(*error, Underflow);
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "Expected the action to be accepted")]
    fn test_unexpected_rejection_panics() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Decrement)
            .then_state(|_| {})
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        let notify = Effect::Notify(Notification::TokenRailUpdated {
            token: Address::repeat_byte(7),
        });
        assertions::assert_effects_count(std::slice::from_ref(&notify), 1);
        assertions::assert_effects_count(&[], 0);
        assertions::assert_no_external_effects(std::slice::from_ref(&notify));
        assert_eq!(
            assertions::single_notification(std::slice::from_ref(&notify)),
            &Notification::TokenRailUpdated {
                token: Address::repeat_byte(7),
            }
        );
    }
}

//! Failure classification for circuit breaker decisions.

use std::sync::Arc;

/// Determines whether a service call result should count toward a circuit
/// breaker's consecutive-failure counter.
pub trait FailureClassifier<Res, Err>: Send + Sync {
    /// Returns `true` if the result should count as a failure.
    fn classify(&self, result: &Result<Res, Err>) -> bool;
}

/// Default failure classifier: every `Err` counts, every `Ok` resets the
/// streak.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<Res, Err> FailureClassifier<Res, Err> for DefaultClassifier {
    fn classify(&self, result: &Result<Res, Err>) -> bool {
        result.is_err()
    }
}

/// A failure classifier backed by a closure, for cases where not every
/// `Err` should count toward the breaker (e.g. provider rate limits).
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: Arc<F>,
}

impl<F> FnClassifier<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F, Res, Err> FailureClassifier<Res, Err> for FnClassifier<F>
where
    F: Fn(&Result<Res, Err>) -> bool + Send + Sync,
{
    fn classify(&self, result: &Result<Res, Err>) -> bool {
        (self.f)(result)
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier").field("f", &"<closure>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classifier_treats_errors_as_failures() {
        let classifier = DefaultClassifier;
        assert!(!FailureClassifier::<(), ()>::classify(&classifier, &Ok(())));
        assert!(FailureClassifier::<(), ()>::classify(&classifier, &Err(())));
    }

    #[test]
    fn fn_classifier_can_exclude_rate_limits() {
        #[derive(Debug)]
        enum FakeErr {
            RateLimited,
            Network,
        }
        let classifier = FnClassifier::new(|result: &Result<(), FakeErr>| {
            !matches!(result, Err(FakeErr::RateLimited))
        });

        assert!(!classifier.classify(&Ok(())));
        assert!(!classifier.classify(&Err(FakeErr::RateLimited)));
        assert!(classifier.classify(&Err(FakeErr::Network)));
    }
}

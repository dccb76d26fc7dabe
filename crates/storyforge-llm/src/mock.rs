//! Mock provider for deterministic testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use storyforge_domain::{ModelClient, ModelError};

/// Scripted behaviour for prompts containing a pattern
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(ModelError),
    FailTimes {
        error: ModelError,
        remaining: usize,
        then: String,
    },
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: Reply,
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock model provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Rules match when the prompt contains their pattern; the first matching
/// rule wins, otherwise the default response is returned. Clones share
/// rules and counters.
///
/// # Examples
///
/// ```
/// use storyforge_llm::MockProvider;
/// use storyforge_domain::ModelClient;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("login", "response1");
/// provider.add_error("checkout");
/// assert_eq!(provider.invoke("the login page").unwrap(), "response1");
/// assert!(provider.invoke("checkout flow").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<Rule>>>,
    delays: Arc<Mutex<Vec<(String, Duration)>>>,
    latency: Duration,
    counters: Arc<Counters>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            delays: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Sleep this long on every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Respond with `response` to prompts containing `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.push_rule(pattern.into(), Reply::Text(response.into()));
    }

    /// Fail permanently for prompts containing `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>) {
        self.push_rule(
            pattern.into(),
            Reply::Fail(ModelError::Permanent("Mock error".to_string())),
        );
    }

    /// Fail transiently `times` times for `pattern`, then respond with `then`
    pub fn add_transient_failures(
        &mut self,
        pattern: impl Into<String>,
        times: usize,
        then: impl Into<String>,
    ) {
        self.push_rule(
            pattern.into(),
            Reply::FailTimes {
                error: ModelError::Transient("Mock overload".to_string()),
                remaining: times,
                then: then.into(),
            },
        );
    }

    /// Sleep for `delay` before answering prompts containing `pattern`
    pub fn add_delay(&mut self, pattern: impl Into<String>, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pattern.into(), delay));
    }

    /// Get the number of times invoke was called
    pub fn call_count(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent invocations observed
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.counters.calls.store(0, Ordering::SeqCst);
    }

    fn push_rule(&mut self, pattern: String, reply: Reply) {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule { pattern, reply });
    }

    fn delay_for(&self, prompt: &str) -> Duration {
        let delays = self.delays.lock().unwrap_or_else(PoisonError::into_inner);
        let scripted = delays
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, d)| *d)
            .unwrap_or(Duration::ZERO);
        self.latency + scripted
    }

    fn answer(&self, prompt: &str) -> Result<String, ModelError> {
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(rule) = rules.iter_mut().find(|r| prompt.contains(r.pattern.as_str())) else {
            return Ok(self.default_response.clone());
        };

        match &mut rule.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(error) => Err(error.clone()),
            Reply::FailTimes { error, remaining, then } => {
                if *remaining > 0 {
                    *remaining -= 1;
                    Err(error.clone())
                } else {
                    Ok(then.clone())
                }
            }
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl ModelClient for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delay_for(prompt);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let result = self.answer(prompt);

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

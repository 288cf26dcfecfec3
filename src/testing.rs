//! Helpers for driving a [`ProviderService`] the way a provider runtime
//! would: plan, apply, then read back.
//!
//! ```ignore
//! let tester = ProviderTester::new(GocdProvider::new());
//! tester.configure(json!({"baseurl": server.uri()})).await?;
//!
//! let state = tester
//!     .apply_create("gocd_pipeline", json!({"name": "build", "group": "ops"}))
//!     .await?;
//! assert_eq!(state["version"], "v1");
//! ```

use serde_json::Value;

use crate::error::Error;
use crate::provider::ProviderService;
use crate::schema::Diagnostic;
use crate::types::PlanResult;

pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider, for single operations such as `exists` or `delete`.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Configure the provider; error diagnostics become [`TestError::Rejected`].
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        reject_errors(self.provider.configure(config).await?)
    }

    pub async fn validate(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        reject_errors(self.provider.validate_resource_config(resource_type, config).await?)
    }

    pub async fn plan_create(&self, resource_type: &str, config: Value) -> Result<PlanResult, Error> {
        self.provider.plan(resource_type, None, config).await
    }

    pub async fn plan_update(&self, resource_type: &str, prior: Value, config: Value) -> Result<PlanResult, Error> {
        self.provider.plan(resource_type, Some(prior), config).await
    }

    /// Plan and create `config`, returning the state read back afterwards.
    pub async fn apply_create(&self, resource_type: &str, config: Value) -> Result<Value, Error> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.provider.create(resource_type, plan.planned_state).await?;
        self.read_back(resource_type, created).await
    }

    /// Plan and apply `config` over `prior`, returning the state read back afterwards.
    pub async fn apply_update(&self, resource_type: &str, prior: Value, config: Value) -> Result<Value, Error> {
        let plan = self.plan_update(resource_type, prior.clone(), config).await?;
        let updated = self
            .provider
            .update(resource_type, prior, plan.planned_state)
            .await?;
        self.read_back(resource_type, updated).await
    }

    async fn read_back(&self, resource_type: &str, state: Value) -> Result<Value, Error> {
        let name = state["name"].as_str().unwrap_or_default().to_string();
        self.provider
            .read(resource_type, state)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} '{}' vanished after apply", resource_type, name)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("rejected with {}", describe(.0))]
    Rejected(Vec<Diagnostic>),
    #[error(transparent)]
    Provider(#[from] Error),
}

fn describe(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attribute) => format!("{}: {}", attribute, d.summary),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn reject_errors(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Rejected(errors))
    }
}

/// Panics unless `plan` is a create: changes present, no replacement.
pub fn assert_creates(plan: &PlanResult) {
    assert!(!plan.is_empty(), "plan has no changes to create");
    assert!(!plan.requires_replace, "a create plan can not require replacement");
}

pub fn assert_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "plan updates in place: {:?}", plan.changes);
}

pub fn assert_updates_in_place(plan: &PlanResult) {
    assert!(!plan.requires_replace, "plan requires replacement: {:?}", plan.changes);
}

/// Panics unless `plan` reports a change to the top-level `attribute`.
pub fn assert_changes(plan: &PlanResult, attribute: &str) {
    let changed: Vec<_> = plan.changes.iter().map(|c| c.attribute.as_str()).collect();
    assert!(changed.contains(&attribute), "'{}' not among changed attributes {:?}", attribute, changed);
}

/// Panics unless some error diagnostic mentions `text` in its summary or detail.
pub fn assert_diagnostic(diagnostics: &[Diagnostic], text: &str) {
    let found = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .any(|d| d.summary.contains(text) || d.detail.as_deref().is_some_and(|detail| detail.contains(text)));
    assert!(found, "no error mentions '{}': {}", text, describe(diagnostics));
}

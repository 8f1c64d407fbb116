use super::{EntityType, Severity, Tag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Echo of the execution request inside an assessment result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequestInfo {
    /// Bundle display name
    #[serde(default)]
    pub name: Option<String>,

    /// Bundle description
    #[serde(default)]
    pub description: Option<String>,
}

/// A compliance rule as echoed in the result set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule display name
    pub name: String,

    /// Stable rule identifier, used for deep links into rule documentation
    #[serde(default)]
    pub rule_id: Option<String>,

    /// Rule severity
    pub severity: Severity,

    /// Rule description
    #[serde(default)]
    pub description: String,

    /// Compliance-section tag the rule belongs to
    #[serde(default)]
    pub compliance_tag: Option<String>,
}

/// Reference from an entity evaluation into the companion entity table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestObj {
    /// Entity type, the key into [`AssessmentResult::test_entities`]
    pub entity_type: EntityType,

    /// Position in the companion table; negative means "not applicable"
    #[serde(default = "not_applicable")]
    pub entity_index: i64,

    /// Entity id when the backend inlines it directly
    #[serde(default)]
    pub id: Option<String>,
}

const fn not_applicable() -> i64 {
    -1
}

/// Outcome of evaluating one entity under one rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResult {
    /// Whether the rule applies to this entity at all
    #[serde(default)]
    pub is_relevant: bool,

    /// Whether the entity passed the rule
    #[serde(default)]
    pub is_valid: bool,

    /// Reference to the evaluated entity
    pub test_obj: TestObj,
}

/// One rule execution inside an assessment result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTest {
    /// The rule that ran
    pub rule: Rule,

    /// Whether every relevant entity passed
    #[serde(default)]
    pub test_passed: bool,

    /// Per-entity evaluation outcomes
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
}

/// A full entity record from the companion lookup table.
///
/// Every identity field is independently optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestEntity {
    /// Entity id (e.g. `sg-123`)
    #[serde(default)]
    pub id: Option<String>,

    /// Full resource ARN
    #[serde(default)]
    pub arn: Option<String>,

    /// Entity name
    #[serde(default)]
    pub name: Option<String>,

    /// Tags, when the entity carries any
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

/// Raw result of one rule-bundle execution.
///
/// Immutable snapshot once returned; the correlator reads it, never
/// mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Assessment result id, used for deep links into the result console
    #[serde(default)]
    pub id: Option<i64>,

    /// Echo of the execution request
    #[serde(default)]
    pub request: AssessmentRequestInfo,

    /// Per-rule executions
    #[serde(default)]
    pub tests: Vec<RuleTest>,

    /// Companion lookup table: entity type to full entity records,
    /// indexed by [`TestObj::entity_index`]
    #[serde(default)]
    pub test_entities: HashMap<EntityType, Vec<TestEntity>>,

    /// Set when the execution itself failed server-side
    #[serde(default)]
    pub error_message: Option<String>,
}

impl AssessmentResult {
    /// The server-side evaluation error, if the response carries one
    #[must_use]
    pub fn evaluation_error(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Resolve an entity reference against the companion table.
    ///
    /// Negative indices are the backend's "not applicable" sentinel and
    /// resolve to `None`.
    #[must_use]
    pub fn resolve_entity(&self, obj: &TestObj) -> Option<&TestEntity> {
        let idx = usize::try_from(obj.entity_index).ok()?;
        self.test_entities.get(&obj.entity_type)?.get(idx)
    }
}

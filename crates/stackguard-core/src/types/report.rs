use super::{EntityType, Severity, Tag};
use serde::{Deserialize, Serialize};

/// A failing entity resolved out of an assessment result.
///
/// Identity fields are copied from the raw entity only when present; the
/// correlator's fallback chain decides which of them ties the entity to a
/// stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEntity {
    /// Entity type in the backend's vocabulary
    pub entity_type: EntityType,

    /// Entity id (e.g. `sg-123`)
    #[serde(default)]
    pub entity_id: Option<String>,

    /// Full resource ARN
    #[serde(default)]
    pub arn: Option<String>,

    /// Entity name
    #[serde(default)]
    pub name: Option<String>,

    /// Tags carried by the entity
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl FailedEntity {
    /// Short human-readable form: `SecurityGroup - web(sg-123)`
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} - {}({})",
            self.entity_type,
            self.name.as_deref().unwrap_or("?"),
            self.entity_id.as_deref().unwrap_or("?")
        )
    }
}

/// A failed rule execution together with the entities attributable to it.
///
/// This is the gate's top-level output record. A plain list of these is the
/// whole report; rules are identified by `rule_id`, never by object
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTest {
    /// Rule display name
    pub rule_name: String,

    /// Stable rule identifier
    #[serde(default)]
    pub rule_id: Option<String>,

    /// Rule severity
    pub severity: Severity,

    /// Rule description
    #[serde(default)]
    pub description: String,

    /// Assessment result id this finding came from
    #[serde(default)]
    pub assessment_id: Option<i64>,

    /// Failing entities attributed to this rule
    pub entities: Vec<FailedEntity>,
}

impl FailedTest {
    /// Deep link into the rule documentation, when the rule id is known
    #[must_use]
    pub fn rule_link(&self) -> Option<String> {
        self.rule_id
            .as_ref()
            .map(|id| format!("https://gsl.dome9.com/{id}.html"))
    }

    /// Deep link into the assessment result console
    #[must_use]
    pub fn result_link(&self) -> Option<String> {
        self.assessment_id
            .map(|id| format!("https://secure.dome9.com/v2/compliance-engine/result/{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_fills_missing_identity_fields() {
        let entity = FailedEntity {
            entity_type: "SecurityGroup".into(),
            entity_id: Some("sg-123".into()),
            arn: None,
            name: None,
            tags: Vec::new(),
        };
        assert_eq!(entity.describe(), "SecurityGroup - ?(sg-123)");
    }

    #[test]
    fn links_require_ids() {
        let test = FailedTest {
            rule_name: "r".into(),
            rule_id: None,
            severity: Severity::Low,
            description: String::new(),
            assessment_id: Some(7),
            entities: Vec::new(),
        };
        assert!(test.rule_link().is_none());
        assert_eq!(
            test.result_link().unwrap(),
            "https://secure.dome9.com/v2/compliance-engine/result/7"
        );
    }
}

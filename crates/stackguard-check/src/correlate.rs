//! Failure-to-stack correlation.
//!
//! Extracts the failing entities out of a raw assessment result and, in
//! stack-scoped mode, decides which of them are actually traceable to the
//! deployed stack. A failing entity rarely names its stack directly, so
//! attribution falls back through an ordered chain of identity signals:
//! stack-name tag, then id, then name, then arn. The chain is evaluated per
//! entity and the first matching tier wins; signals are never mixed across
//! tiers.

use crate::inventory::StackResourceInventory;
use stackguard_core::{AssessmentResult, FailedEntity, FailedTest};
use tracing::debug;

/// Tag key CloudFormation stamps on resources it owns
pub const STACK_NAME_TAG: &str = "aws:cloudformation:stack-name";

/// Which tier of the fallback chain attributed an entity to the stack.
///
/// Order here is the evaluation order and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// `aws:cloudformation:stack-name` tag equals the stack name
    Tag,
    /// Entity id is one of the stack's physical ids
    Id,
    /// Entity name is one of the stack's physical ids
    Name,
    /// Entity arn is one of the stack's physical ids
    Arn,
}

/// Reduce a raw assessment result to the failed tests attributable to the
/// stack.
///
/// With no inventory (full-account mode) every extracted failed test passes
/// through. Pure function of its inputs; calling it twice on the same pair
/// yields identical output.
#[must_use]
pub fn analyze(
    result: &AssessmentResult,
    inventory: Option<&StackResourceInventory>,
) -> Vec<FailedTest> {
    let extracted = extract_failed_tests(result);
    match inventory {
        None => extracted,
        Some(inventory) => correlate(extracted, inventory),
    }
}

/// Build a [`FailedTest`] for every failing rule, resolving each failing,
/// relevant entity through the companion lookup table.
fn extract_failed_tests(result: &AssessmentResult) -> Vec<FailedTest> {
    result
        .tests
        .iter()
        .filter(|test| !test.test_passed)
        .map(|test| FailedTest {
            rule_name: test.rule.name.clone(),
            rule_id: test.rule.rule_id.clone(),
            severity: test.rule.severity,
            description: test.rule.description.clone(),
            assessment_id: result.id,
            entities: test
                .entity_results
                .iter()
                .filter(|er| er.is_relevant && !er.is_valid)
                .filter_map(|er| {
                    // negative entity indices are "not applicable"
                    result.resolve_entity(&er.test_obj).map(|entity| FailedEntity {
                        entity_type: er.test_obj.entity_type.clone(),
                        entity_id: entity.id.clone(),
                        arn: entity.arn.clone(),
                        name: entity.name.clone(),
                        tags: entity.tags.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        })
        .collect()
}

/// Keep only entities attributable to the stack; drop tests left empty
fn correlate(tests: Vec<FailedTest>, inventory: &StackResourceInventory) -> Vec<FailedTest> {
    tests
        .into_iter()
        .filter_map(|mut test| {
            test.entities.retain(|entity| {
                let tier = match_tier(entity, inventory);
                if tier.is_none() {
                    debug!(entity = %entity.describe(), "entity not traceable to stack; dropped");
                }
                tier.is_some()
            });
            if test.entities.is_empty() {
                None
            } else {
                Some(test)
            }
        })
        .collect()
}

/// First tier of the fallback chain that ties an entity to the stack
#[must_use]
pub fn match_tier(
    entity: &FailedEntity,
    inventory: &StackResourceInventory,
) -> Option<MatchTier> {
    if entity
        .tags
        .iter()
        .any(|tag| tag.key == STACK_NAME_TAG && tag.value == inventory.stack_name())
    {
        return Some(MatchTier::Tag);
    }
    if entity
        .entity_id
        .as_deref()
        .is_some_and(|id| inventory.contains(id))
    {
        return Some(MatchTier::Id);
    }
    if entity
        .name
        .as_deref()
        .is_some_and(|name| inventory.contains(name))
    {
        return Some(MatchTier::Name);
    }
    if entity
        .arn
        .as_deref()
        .is_some_and(|arn| inventory.contains(arn))
    {
        return Some(MatchTier::Arn);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ResourceTypeMapper;
    use crate::inventory::StackResource;
    use stackguard_core::{Severity, Tag};

    fn result_with_failing_entity() -> AssessmentResult {
        serde_json::from_str(
            r#"{
                "id": 11,
                "request": {"name": "baseline"},
                "tests": [
                    {
                        "rule": {"name": "No open SSH", "severity": "High", "description": "d"},
                        "testPassed": false,
                        "entityResults": [
                            {"isRelevant": true, "isValid": false, "testObj": {"entityType": "SecurityGroup", "entityIndex": 0}},
                            {"isRelevant": true, "isValid": true, "testObj": {"entityType": "SecurityGroup", "entityIndex": 1}},
                            {"isRelevant": false, "isValid": false, "testObj": {"entityType": "SecurityGroup", "entityIndex": 1}},
                            {"isRelevant": true, "isValid": false, "testObj": {"entityType": "SecurityGroup", "entityIndex": -1}}
                        ]
                    },
                    {
                        "rule": {"name": "Passing rule", "severity": "Low", "description": "d"},
                        "testPassed": true,
                        "entityResults": []
                    }
                ],
                "testEntities": {
                    "SecurityGroup": [
                        {"id": "sg-123", "name": "web"},
                        {"id": "sg-456", "name": "db"}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    fn inventory_with(ids: &[&str]) -> StackResourceInventory {
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let resources: Vec<StackResource> = ids
            .iter()
            .map(|id| StackResource {
                resource_type: "AWS::EC2::SecurityGroup".to_string(),
                physical_id: (*id).to_string(),
            })
            .collect();
        StackResourceInventory::from_resources(&mapper, "web-stack", &resources)
    }

    fn entity(
        id: Option<&str>,
        name: Option<&str>,
        arn: Option<&str>,
        tags: Vec<Tag>,
    ) -> FailedEntity {
        FailedEntity {
            entity_type: "SecurityGroup".into(),
            entity_id: id.map(String::from),
            arn: arn.map(String::from),
            name: name.map(String::from),
            tags,
        }
    }

    fn stack_tag(value: &str) -> Tag {
        Tag {
            key: STACK_NAME_TAG.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn extraction_keeps_only_relevant_invalid_entities() {
        let result = result_with_failing_entity();
        let tests = analyze(&result, None);

        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].rule_name, "No open SSH");
        assert_eq!(tests[0].severity, Severity::High);
        assert_eq!(tests[0].assessment_id, Some(11));
        // one passing, one irrelevant and one sentinel-index result skipped
        assert_eq!(tests[0].entities.len(), 1);
        assert_eq!(tests[0].entities[0].entity_id.as_deref(), Some("sg-123"));
    }

    #[test]
    fn id_match_retains_entity() {
        // inventory contains the failing id
        let result = result_with_failing_entity();
        let inventory = inventory_with(&["sg-123"]);
        let tests = analyze(&result, Some(&inventory));

        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].entities[0].entity_id.as_deref(), Some("sg-123"));
    }

    #[test]
    fn unmatched_entity_drops_the_whole_test() {
        // inventory does not contain the failing id and the entity carries
        // no other identity signals
        let result = result_with_failing_entity();
        let inventory = inventory_with(&["sg-999"]);
        let tests = analyze(&result, Some(&inventory));

        assert!(tests.is_empty());
    }

    #[test]
    fn tag_tier_wins_over_id_tier() {
        // the tag names the analyzed stack even though the id would also
        // match; the tag tier must fire first
        let inventory = inventory_with(&["sg-123"]);
        let tagged = entity(Some("sg-123"), None, None, vec![stack_tag("web-stack")]);
        assert_eq!(match_tier(&tagged, &inventory), Some(MatchTier::Tag));

        // a tag naming a different stack is not a match; the chain falls
        // through to the id tier instead of mixing signals
        let foreign_tag = entity(Some("sg-123"), None, None, vec![stack_tag("other-stack")]);
        assert_eq!(match_tier(&foreign_tag, &inventory), Some(MatchTier::Id));
    }

    #[test]
    fn name_and_arn_tiers_fall_back_in_order() {
        let inventory = inventory_with(&["web", "arn:aws:ec2:sg/1"]);

        let by_name = entity(Some("sg-000"), Some("web"), None, Vec::new());
        assert_eq!(match_tier(&by_name, &inventory), Some(MatchTier::Name));

        let by_arn = entity(Some("sg-000"), Some("db"), Some("arn:aws:ec2:sg/1"), Vec::new());
        assert_eq!(match_tier(&by_arn, &inventory), Some(MatchTier::Arn));

        let no_match = entity(Some("sg-000"), Some("db"), Some("arn:other"), Vec::new());
        assert_eq!(match_tier(&no_match, &inventory), None);
    }

    #[test]
    fn entities_matching_different_tiers_are_both_retained() {
        let mut result = result_with_failing_entity();
        // second entity fails too, matched by name rather than id
        result.tests[0].entity_results[1].is_valid = false;
        let inventory = inventory_with(&["sg-123", "db"]);

        let tests = analyze(&result, Some(&inventory));
        assert_eq!(tests[0].entities.len(), 2);
    }

    #[test]
    fn analyze_is_idempotent() {
        let result = result_with_failing_entity();
        let inventory = inventory_with(&["sg-123"]);

        let first = analyze(&result, Some(&inventory));
        let second = analyze(&result, Some(&inventory));
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

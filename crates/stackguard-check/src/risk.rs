//! Risk scoring over correlated failures.

use serde::{Deserialize, Serialize};
use stackguard_core::{FailedTest, Severity};

/// How a set of failed tests reduces to a risk score.
///
/// The default tiered policy keeps the Medium/Low distinction; the flat
/// policy treats any failure as maximal risk and exists for callers that
/// only gate on pass/fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskPolicy {
    /// Worst observed severity: High is 100, Medium 50, anything else 20
    #[default]
    SeverityTiered,
    /// Any failure at all scores 100
    FlatOnAnyFailure,
}

impl RiskPolicy {
    /// Score a correlated failure set; 0 when it is empty
    #[must_use]
    pub fn score(&self, tests: &[FailedTest]) -> u8 {
        if tests.is_empty() {
            return 0;
        }

        match self {
            Self::FlatOnAnyFailure => 100,
            Self::SeverityTiered => {
                let worst = tests
                    .iter()
                    .map(|t| t.severity)
                    .max()
                    .unwrap_or(Severity::Unknown);
                match worst {
                    Severity::High => 100,
                    Severity::Medium => 50,
                    Severity::Low | Severity::Unknown => 20,
                }
            }
        }
    }
}

impl std::str::FromStr for RiskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiered" | "severity-tiered" => Ok(Self::SeverityTiered),
            "flat" | "flat-on-any-failure" => Ok(Self::FlatOnAnyFailure),
            _ => Err(format!("unknown risk policy: {s} (expected tiered or flat)")),
        }
    }
}

/// Whether any failed test reaches the given minimum severity.
///
/// This is the pipeline's fail gate: a tripped gate maps to a failing exit
/// code, independent of the numeric risk score.
#[must_use]
pub fn severity_gate_tripped(tests: &[FailedTest], minimum: Severity) -> bool {
    tests.iter().any(|t| t.severity >= minimum)
}

//! Lenient inspection of the model's "Step N: ..." answer.
//!
//! The response is always displayed verbatim. This scan only reports how far
//! the answer drifted from the requested format so callers can warn about it.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::KillChainStage;

fn step_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?mi)^[ \t]*(?:[*_#>\-][ \t]*)*step[ \t]+(\d+)[ \t]*\**[ \t]*[:.)\-][ \t]*\**[ \t]*(.*?)[ \t]*$")
            .expect("step pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLine {
    pub number: usize,
    pub stage: Option<KillChainStage>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBreakdown {
    pub steps: Vec<StepLine>,
    /// Step numbers in 1..=7 that never appeared.
    pub missing: Vec<usize>,
    /// Step numbers outside 1..=7.
    pub unexpected: Vec<usize>,
}

impl StepBreakdown {
    pub fn inspect(text: &str) -> Self {
        let mut seen = BTreeSet::new();
        let mut steps = Vec::new();
        let mut unexpected = Vec::new();

        for caps in step_pattern().captures_iter(text) {
            let Some(number) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
                continue;
            };
            let description = caps
                .get(2)
                .map(|m| m.as_str().trim_end_matches('*').trim().to_string())
                .unwrap_or_default();

            if !(1..=KillChainStage::COUNT).contains(&number) {
                unexpected.push(number);
                continue;
            }
            // first occurrence wins
            if !seen.insert(number) {
                continue;
            }

            steps.push(StepLine {
                number,
                stage: KillChainStage::ALL.get(number - 1).copied(),
                description,
            });
        }

        let missing = (1..=KillChainStage::COUNT)
            .filter(|n| !seen.contains(n))
            .collect();

        Self {
            steps,
            missing,
            unexpected,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.missing.is_empty()
            && self.unexpected.is_empty()
            && self.steps.iter().all(|step| !step.description.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Step 1: Scans for exposed JNDI lookups.\n\
        Step 2: Crafts a malicious LDAP payload.\n\
        Step 3: Sends the payload in a User-Agent header.\n\
        Step 4: Log4j evaluates the lookup.\n\
        Step 5: Drops a Java class loader.\n\
        Step 6: Beacons to the attacker's LDAP server.\n\
        Step 7: Deploys a coin miner.";

    #[test]
    fn test_well_formed_answer() {
        let breakdown = StepBreakdown::inspect(WELL_FORMED);
        assert!(breakdown.is_well_formed());
        assert_eq!(breakdown.steps.len(), 7);
        assert_eq!(breakdown.steps[5].stage, Some(KillChainStage::C2));
        assert_eq!(breakdown.steps[0].description, "Scans for exposed JNDI lookups.");
    }

    #[test]
    fn test_markdown_bold_is_tolerated() {
        let breakdown = StepBreakdown::inspect("**Step 1:** Recon happens\n- **Step 2**: Tooling");
        assert_eq!(breakdown.steps.len(), 2);
        assert_eq!(breakdown.steps[0].description, "Recon happens");
        assert_eq!(breakdown.steps[1].description, "Tooling");
    }

    #[test]
    fn test_missing_and_unexpected_steps_are_reported() {
        let breakdown = StepBreakdown::inspect("Step 1: a\nStep 3: c\nStep 9: extra");
        assert!(!breakdown.is_well_formed());
        assert_eq!(breakdown.missing, vec![2, 4, 5, 6, 7]);
        assert_eq!(breakdown.unexpected, vec![9]);
    }

    #[test]
    fn test_free_text_yields_no_steps() {
        let breakdown = StepBreakdown::inspect("I cannot help with that.");
        assert!(breakdown.steps.is_empty());
        assert_eq!(breakdown.missing.len(), 7);
        assert!(!StepBreakdown::inspect("").is_well_formed());
    }
}

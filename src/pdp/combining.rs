use super::evaluator::{EvalError, Evaluation};
use crate::models::{Decision, Effect, Status};
use serde::{Deserialize, Serialize};

const RULE_ALGORITHM_PREFIXES: [&str; 2] = [
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:",
    "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:",
];
const POLICY_ALGORITHM_PREFIXES: [&str; 2] = [
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:",
    "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:",
];

/// How the decisions of several rules or policies are merged into one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombiningAlgorithm {
    DenyOverrides,
    PermitOverrides,
    FirstApplicable,
    #[default]
    OnlyOneApplicable,
}

/// Whether rules or policies are being combined; only the indeterminate
/// handling of the overrides algorithms differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CombiningLevel {
    Rule,
    Policy,
}

impl CombiningAlgorithm {
    /// Parses a `RuleCombiningAlgId`. Ordered variants map onto their
    /// unordered counterparts since evaluation is always in document order.
    pub fn from_rule_id(id: &str) -> Option<Self> {
        let name = RULE_ALGORITHM_PREFIXES
            .iter()
            .find_map(|prefix| id.strip_prefix(prefix))?;
        match name {
            "only-one-applicable" => None,
            other => Self::from_name(other),
        }
    }

    /// Parses a `PolicyCombiningAlgId`.
    pub fn from_policy_id(id: &str) -> Option<Self> {
        let name = POLICY_ALGORITHM_PREFIXES
            .iter()
            .find_map(|prefix| id.strip_prefix(prefix))?;
        Self::from_name(name)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "deny-overrides" | "ordered-deny-overrides" => Some(CombiningAlgorithm::DenyOverrides),
            "permit-overrides" | "ordered-permit-overrides" => {
                Some(CombiningAlgorithm::PermitOverrides)
            }
            "first-applicable" => Some(CombiningAlgorithm::FirstApplicable),
            "only-one-applicable" => Some(CombiningAlgorithm::OnlyOneApplicable),
            _ => None,
        }
    }

    /// Combines `candidates`, evaluating each one lazily with `evaluate`; the
    /// overrides and first-applicable algorithms stop as soon as the outcome
    /// is fixed.
    ///
    /// Only-one-applicable decides on `applicable` (target matching) before
    /// anything is evaluated, then evaluates the single applicable candidate.
    pub(crate) fn combine<T, I, A, E>(
        self,
        level: CombiningLevel,
        candidates: I,
        applicable: A,
        mut evaluate: E,
    ) -> Evaluation
    where
        I: IntoIterator<Item = T>,
        A: FnMut(&T) -> Result<bool, EvalError>,
        E: FnMut(T) -> Evaluation,
    {
        let winner = match self {
            CombiningAlgorithm::DenyOverrides => Effect::Deny,
            CombiningAlgorithm::PermitOverrides => Effect::Permit,
            CombiningAlgorithm::FirstApplicable => {
                let mut seen = Vec::new();
                let outcome = first_applicable(candidates.into_iter().map(evaluate), &mut seen);
                return outcome.into_evaluation(&seen);
            }
            CombiningAlgorithm::OnlyOneApplicable => {
                return match select_only_one(candidates, applicable) {
                    Ok(Some(candidate)) => evaluate(candidate),
                    Ok(None) => Evaluation::not_applicable(),
                    Err(err) => Evaluation::indeterminate(err),
                };
            }
        };
        let mut seen = Vec::new();
        let outcome = overrides(winner, level, candidates.into_iter().map(&mut evaluate), &mut seen);
        outcome.into_evaluation(&seen)
    }
}

struct Outcome {
    decision: Decision,
    status: Option<Status>,
}

impl Outcome {
    fn decided(decision: Decision) -> Self {
        Self {
            decision,
            status: None,
        }
    }

    fn indeterminate(status: Option<Status>) -> Self {
        Self {
            decision: Decision::Indeterminate,
            status: Some(status.unwrap_or_else(|| {
                EvalError::processing("combined evaluation failed").status()
            })),
        }
    }

    /// Final evaluation carrying the obligations of the children that agree with it.
    fn into_evaluation(self, seen: &[Evaluation]) -> Evaluation {
        let obligations = match self.decision {
            Decision::Permit | Decision::Deny => seen
                .iter()
                .filter(|evaluation| evaluation.decision == self.decision)
                .flat_map(|evaluation| evaluation.obligations.iter().cloned())
                .collect(),
            Decision::Indeterminate | Decision::NotApplicable => Vec::new(),
        };
        Evaluation {
            decision: self.decision,
            status: self.status.unwrap_or_default(),
            obligations,
            effect: None,
        }
    }
}

fn overrides<I>(winner: Effect, level: CombiningLevel, evaluations: I, seen: &mut Vec<Evaluation>) -> Outcome
where
    I: IntoIterator<Item = Evaluation>,
{
    let winning = winner.decision();
    let mut loser_seen = false;
    let mut potential_winner = false;
    let mut error: Option<Status> = None;
    for evaluation in evaluations {
        match evaluation.decision {
            decision if decision == winning => {
                seen.push(evaluation);
                return Outcome::decided(winning);
            }
            Decision::Indeterminate => {
                // an erroring policy under policy deny-overrides counts as a deny
                if level == CombiningLevel::Policy && winner == Effect::Deny {
                    return Outcome::decided(Decision::Deny);
                }
                if evaluation.effect == Some(winner) {
                    potential_winner = true;
                }
                error.get_or_insert_with(|| evaluation.status.clone());
            }
            Decision::NotApplicable => {}
            _ => loser_seen = true,
        }
        seen.push(evaluation);
    }
    if potential_winner {
        return Outcome::indeterminate(error);
    }
    if loser_seen {
        let losing = match winner {
            Effect::Deny => Decision::Permit,
            Effect::Permit => Decision::Deny,
        };
        return Outcome::decided(losing);
    }
    if error.is_some() {
        return Outcome::indeterminate(error);
    }
    Outcome::decided(Decision::NotApplicable)
}

fn first_applicable<I>(evaluations: I, seen: &mut Vec<Evaluation>) -> Outcome
where
    I: IntoIterator<Item = Evaluation>,
{
    for evaluation in evaluations {
        match evaluation.decision {
            Decision::NotApplicable => continue,
            Decision::Indeterminate => return Outcome::indeterminate(Some(evaluation.status)),
            decision => {
                seen.push(evaluation);
                return Outcome::decided(decision);
            }
        }
    }
    Outcome::decided(Decision::NotApplicable)
}

fn more_than_one() -> EvalError {
    EvalError::processing("more than one policy is applicable")
}

/// Only-one-applicable selection on targets: returns the single candidate
/// whose target applies, `None` when none does, and an error when several
/// apply or an applicability check fails.
fn select_only_one<T, I, F>(candidates: I, mut applicable: F) -> Result<Option<T>, EvalError>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Result<bool, EvalError>,
{
    let mut selected = None;
    for candidate in candidates {
        if !applicable(&candidate)? {
            continue;
        }
        if selected.is_some() {
            return Err(more_than_one());
        }
        selected = Some(candidate);
    }
    Ok(selected)
}

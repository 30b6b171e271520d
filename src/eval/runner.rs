//! Run dataset cases through an agent and judge the responses.

use agecalc_tools::Clock;
use serde_json::Value;
use tracing::instrument;

use super::case::{Case, Expectation};
use super::report::{Outcome, RunRecord};
use crate::agent::{Agent, AgentResponse, ModelClient};

/// Report classname prefix; the category is appended.
pub const CLASSNAME_PREFIX: &str = "agecalc.eval";

/// Judge one response against its case.
///
/// - refusal: passes iff no capability was invoked;
/// - tool expectation: the first call names the expected capability, every
///   expected argument matches, every fragment appears in the text;
/// - plain response: no capability invoked and every fragment present.
#[must_use]
pub fn judge(case: &Case, response: &AgentResponse) -> Outcome {
    let fragments_present = || {
        case.expected_response_contains()
            .iter()
            .all(|f| response.text.contains(f.as_str()))
    };
    let ok = match case.expectation() {
        Expectation::Refuse => response.tool_calls.is_empty(),
        Expectation::Invoke { tool, parameters } => {
            response.tool_calls.first().is_some_and(|call| {
                call.name == tool.name()
                    && parameters.iter().all(|(k, v)| {
                        call.arguments.get(k).and_then(Value::as_str) == Some(v.as_str())
                    })
            }) && fragments_present()
        }
        Expectation::Respond => response.tool_calls.is_empty() && fragments_present(),
    };
    if ok { Outcome::Passed } else { Outcome::Failed }
}

/// The report classname for `case`.
#[must_use]
pub fn classname(case: &Case) -> String {
    format!("{CLASSNAME_PREFIX}.{}", case.category())
}

/// Invoke the agent on every case and judge each answer.
///
/// Agent failures become [`Outcome::Errored`] records rather than aborting
/// the run.
#[instrument(skip_all, fields(cases = cases.len()))]
pub fn run_cases<M: ModelClient, C: Clock>(agent: &Agent<M, C>, cases: &[Case]) -> Vec<RunRecord> {
    cases
        .iter()
        .map(|case| {
            let outcome = match agent.invoke(case.user_input()) {
                Ok(response) => judge(case, &response),
                Err(e) => {
                    tracing::warn!(case = %case.id(), error = %e, "agent failed");
                    Outcome::Errored
                }
            };
            tracing::debug!(case = %case.id(), ?outcome, "judged");
            RunRecord {
                classname: classname(case),
                name: case.id().to_string(),
                outcome,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolCall;
    use crate::eval::ground_truth::Dataset;
    use serde_json::{Map, json};

    fn response(text: &str, calls: &[(&str, Value)]) -> AgentResponse {
        AgentResponse {
            text: text.to_owned(),
            tool_calls: calls
                .iter()
                .map(|(name, args)| ToolCall {
                    name: (*name).to_owned(),
                    arguments: match args {
                        Value::Object(m) => m.clone(),
                        _ => Map::new(),
                    },
                    output: None,
                    error: None,
                })
                .collect(),
        }
    }

    fn case(id: &str) -> Case {
        Dataset::ground_truth().unwrap().get(id).unwrap().clone()
    }

    #[test]
    fn refusal_passes_without_tool_calls() {
        let c = case("TC-040");
        assert_eq!(judge(&c, &response("I can only help with ages.", &[])), Outcome::Passed);
        assert_eq!(
            judge(&c, &response("", &[("get_current_date", json!({}))])),
            Outcome::Failed
        );
    }

    #[test]
    fn tool_case_checks_first_call_arguments_and_text() {
        let c = case("TC-010");
        let args = json!({"start_date": "1990-01-01", "end_date": "2000-01-01"});
        assert_eq!(
            judge(&c, &response("That is 3652 days.", &[("calculate_days_between", args.clone())])),
            Outcome::Passed
        );
        assert_eq!(
            judge(&c, &response("That is 3653 days.", &[("calculate_days_between", args)])),
            Outcome::Failed
        );
        let wrong = json!({"start_date": "1990-01-02", "end_date": "2000-01-01"});
        assert_eq!(
            judge(&c, &response("3652", &[("calculate_days_between", wrong)])),
            Outcome::Failed
        );
        assert_eq!(judge(&c, &response("3652", &[])), Outcome::Failed);
    }

    #[test]
    fn only_the_first_call_is_judged() {
        let c = case("TC-001");
        let out = response(
            "You are 12345 days old.",
            &[
                ("calculate_days_between", json!({})),
                ("get_current_date", json!({})),
            ],
        );
        assert_eq!(judge(&c, &out), Outcome::Failed);
    }

    #[test]
    fn classname_uses_category() {
        assert_eq!(classname(&case("TC-055")), "agecalc.eval.adversarial");
    }
}

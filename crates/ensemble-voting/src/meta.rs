//! The meta-voting tie-break strategy: hands the tied candidates to an
//! external evaluator and expects a strict JSON verdict back.

use serde::Deserialize;

/// Maximum characters of each candidate response sent to the evaluator.
const TRUNCATE_AT: usize = 500;

/// Injected evaluator hook. Takes the prompt and `(role, truncated
/// response)` pairs for the tied candidates, returns raw text that should
/// be strict JSON matching [`MetaVoteResponse`]'s shape.
pub type MetaEvaluator<'a> = &'a dyn Fn(&str, &[(String, String)]) -> String;

#[derive(Debug, Deserialize)]
struct MetaVoteResponse {
    winner: String,
    confidence: f64,
    ranking: Vec<String>,
    reasoning: String,
    scores: std::collections::HashMap<String, f64>,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
}

/// What the meta-voting step decided, kept for explainability even when it
/// fell back.
#[derive(Debug, Clone)]
pub struct MetaVoteOutcome {
    pub winner: String,
    pub confidence: f64,
    pub ranking: Vec<String>,
    pub reasoning: String,
    pub fell_back: bool,
}

fn truncate(text: &str, at: usize) -> String {
    if text.len() <= at {
        text.to_string()
    } else {
        text.chars().take(at).collect()
    }
}

/// Invokes `evaluator` over `candidates` and parses its response. Any
/// parse failure, or a `winner` that isn't among `candidates`, is treated
/// as a schema violation and reported as a fallback rather than a panic.
pub fn invoke(prompt: &str, candidates: &[(String, String)], evaluator: MetaEvaluator<'_>) -> MetaVoteOutcome {
    let truncated: Vec<(String, String)> = candidates.iter().map(|(role, response)| (role.clone(), truncate(response, TRUNCATE_AT))).collect();

    let raw = evaluator(prompt, &truncated);

    match serde_json::from_str::<MetaVoteResponse>(&raw) {
        Ok(parsed) if candidates.iter().any(|(role, _)| *role == parsed.winner) && (0.0..=1.0).contains(&parsed.confidence) => MetaVoteOutcome {
            winner: parsed.winner,
            confidence: parsed.confidence,
            ranking: parsed.ranking,
            reasoning: parsed.reasoning,
            fell_back: false,
        },
        _ => MetaVoteOutcome {
            winner: String::new(),
            confidence: 0.0,
            ranking: Vec::new(),
            reasoning: String::new(),
            fell_back: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<(String, String)> {
        vec![("a".into(), "response a".into()), ("b".into(), "response b".into())]
    }

    #[test]
    fn well_formed_json_is_accepted() {
        let evaluator: MetaEvaluator = &|_prompt, _candidates| {
            serde_json::json!({
                "winner": "a",
                "confidence": 0.8,
                "ranking": ["a", "b"],
                "reasoning": "a is more precise",
                "scores": {"a": 0.8, "b": 0.4},
                "strengths": ["precise"],
                "weaknesses": []
            })
            .to_string()
        };
        let outcome = invoke("prompt", &candidates(), evaluator);
        assert!(!outcome.fell_back);
        assert_eq!(outcome.winner, "a");
    }

    #[test]
    fn malformed_json_falls_back() {
        let evaluator: MetaEvaluator = &|_, _| "not json".to_string();
        let outcome = invoke("prompt", &candidates(), evaluator);
        assert!(outcome.fell_back);
    }

    #[test]
    fn winner_outside_candidate_set_falls_back() {
        let evaluator: MetaEvaluator = &|_, _| {
            serde_json::json!({
                "winner": "nonexistent",
                "confidence": 0.9,
                "ranking": [],
                "reasoning": "",
                "scores": {},
                "strengths": [],
                "weaknesses": []
            })
            .to_string()
        };
        let outcome = invoke("prompt", &candidates(), evaluator);
        assert!(outcome.fell_back);
    }

    #[test]
    fn confidence_out_of_range_falls_back() {
        let evaluator: MetaEvaluator = &|_, _| {
            serde_json::json!({
                "winner": "a",
                "confidence": 1.5,
                "ranking": [],
                "reasoning": "",
                "scores": {},
                "strengths": [],
                "weaknesses": []
            })
            .to_string()
        };
        let outcome = invoke("prompt", &candidates(), evaluator);
        assert!(outcome.fell_back);
    }
}

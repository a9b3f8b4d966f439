//! Quality scoring for a synthesized answer: the figure used to choose a
//! cache TTL band, reused so scoring only happens once per request.

use ensemble_voting::ConsensusLevel;

/// Consensus bonus tiers from `ConsensusLevel::classify`'s five bands map
/// onto the two named in the scoring formula (`strong`, `moderate`).
/// `VeryStrong` is folded into the `strong` bonus: a clearer consensus
/// than "strong" should never score lower than "strong" does.
fn consensus_bonus(consensus: ConsensusLevel) -> f64 {
    match consensus {
        ConsensusLevel::VeryStrong | ConsensusLevel::Strong => 0.1,
        ConsensusLevel::Moderate => 0.05,
        ConsensusLevel::Weak | ConsensusLevel::VeryWeak => 0.0,
    }
}

/// Computes the `[0, 1]` quality score for one synthesized response.
#[allow(clippy::too_many_arguments)]
pub fn compute_quality_score(content_len: usize, synth_confidence: f64, validation_score: f64, consensus: ConsensusLevel, successful_roles: usize, total_roles: usize) -> f64 {
    let mut score = 0.5;

    if (500..3000).contains(&content_len) {
        score += 0.1;
    }

    score += synth_confidence * 0.2;
    score += validation_score * 0.2;
    score += consensus_bonus(consensus);

    if total_roles > 0 {
        score += (successful_roles as f64 / total_roles as f64) * 0.1;
    }

    score.clamp(0.0, 1.0)
}

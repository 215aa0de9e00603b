//! Deterministic thought fusion and contradiction detection.
//!
//! Pure functions over the two round vectors. No generation calls, no I/O —
//! given the same thoughts in the same order the outcome is identical.

use noesis_core::AgentThought;

/// Confidence gap below which two differing thoughts count as a
/// contradiction: close calls are surfaced, clear winners are not.
const CONTRADICTION_BAND: f64 = 0.2;

#[derive(Clone, Debug)]
pub struct FusionOutcome {
    /// Content of the highest-confidence round-2 thought, first wins ties.
    pub primary: String,
    /// Human-readable revision and contradiction notes. Descriptive only.
    pub diagnostics: String,
    /// The round-2 thoughts, in dispatch order.
    pub thoughts: Vec<AgentThought>,
}

/// Unordered contradiction pairs among `thoughts`: content differs after
/// trimming and the confidence gap is strictly inside the band. Each pair
/// is reported once, in dispatch order.
pub fn detect_contradictions(thoughts: &[AgentThought]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, a) in thoughts.iter().enumerate() {
        for b in &thoughts[i + 1..] {
            if a.content.trim() != b.content.trim()
                && (a.confidence() - b.confidence()).abs() < CONTRADICTION_BAND
            {
                pairs.push((a.agent_name.clone(), b.agent_name.clone()));
            }
        }
    }
    pairs
}

/// Fuse the two rounds into a single primary output plus diagnostics.
/// Returns `None` when round 2 produced nothing to fuse.
pub fn fuse(round1: &[AgentThought], round2: &[AgentThought]) -> Option<FusionOutcome> {
    let best = round2.iter().fold(None::<&AgentThought>, |best, t| {
        match best {
            // Strictly greater replaces, so the first encountered wins ties.
            Some(b) if t.confidence() > b.confidence() => Some(t),
            Some(b) => Some(b),
            None => Some(t),
        }
    })?;

    let revised: Vec<&str> = round2
        .iter()
        .filter(|t2| {
            round1
                .iter()
                .find(|t1| t1.agent_name == t2.agent_name)
                .is_some_and(|t1| t1.content != t2.content)
        })
        .map(|t| t.agent_name.as_str())
        .collect();

    let contradictions = detect_contradictions(round2);

    let mut notes = Vec::new();
    if !revised.is_empty() {
        notes.push(format!("Revised by: {}", revised.join(", ")));
    }
    for (a, b) in &contradictions {
        notes.push(format!("{} vs {} — conflicting views", a, b));
    }

    Some(FusionOutcome {
        primary: best.content.trim().to_string(),
        diagnostics: notes.join("\n"),
        thoughts: round2.to_vec(),
    })
}

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical step identifier type used throughout the crate.
pub type StepId = String;

/// What the engine does with a step whose dependency ended in failure.
///
/// - `Run`: the step is still dispatched once its wave is reached; its input
///   view only contains outputs that actually made it into the store
///   (default behaviour).
/// - `Skip`: the step is not dispatched. It is recorded as skipped, reported
///   through a `step-error` event, and the skip propagates to its own
///   dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyFailurePolicy {
    #[default]
    Run,
    Skip,
}

impl FromStr for DependencyFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(DependencyFailurePolicy::Run),
            "skip" => Ok(DependencyFailurePolicy::Skip),
            other => Err(format!(
                "invalid on_dependency_failure: {other} (expected \"run\" or \"skip\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

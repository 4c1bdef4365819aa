//! Screen-time trajectory projection
//!
//! Builds the age-by-age chart comparing the national average curve with the
//! child's projected daily screen time if current habits continue.

use crate::config::TrajectoryConfig;
use crate::reference::ReferenceData;
use crate::types::{ChartPoint, ComparisonData, NormalizedInput};

/// Projections never exceed a full day
const MAX_PROJECTED_HOURS: f64 = 24.0;

/// Projector for the comparison chart
pub struct TrajectoryProjector;

impl TrajectoryProjector {
    /// Project the child's screen time against the national average
    ///
    /// The child keeps their current position relative to the average:
    ///
    /// ```text
    /// enfant(age) = current_hours × average(age) / average(current_age)
    /// ```
    ///
    /// `enfant` is null for ages before the child's current age.
    pub fn project(
        input: &NormalizedInput,
        reference: &ReferenceData,
        config: &TrajectoryConfig,
    ) -> ComparisonData {
        let current_age = input.child_age;
        let current_hours = input.screen.total_hours();
        let average_now = reference.average_hours_at(current_age);

        let chart_data = (config.min_age..=config.max_age)
            .map(|age| {
                let average = reference.average_hours_at(age);
                let enfant = if age < current_age {
                    None
                } else if age == current_age {
                    Some(round_hours(current_hours.min(MAX_PROJECTED_HOURS)))
                } else {
                    Some(round_hours(project_hours(current_hours, average_now, average)))
                };
                ChartPoint {
                    age,
                    moyenne: round_hours(average),
                    enfant,
                }
            })
            .collect();

        ComparisonData {
            chart_data,
            marker_age: current_age,
        }
    }

    /// Whether the child's daily screen time does not exceed the age average
    pub fn at_or_below_average(input: &NormalizedInput, reference: &ReferenceData) -> bool {
        input.screen.total_hours() <= reference.average_hours_at(input.child_age)
    }
}

fn project_hours(current_hours: f64, average_now: f64, average_then: f64) -> f64 {
    // A zero average gives no ratio to follow; hold the current level
    let projected = if average_now > 0.0 {
        current_hours * average_then / average_now
    } else {
        current_hours
    };
    projected.clamp(0.0, MAX_PROJECTED_HOURS)
}

/// One decimal, as displayed on the chart
fn round_hours(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

//! Current contribution streak.

use chrono::NaiveDate;
use readmepulse_shared::{ContributionDay, FetchResult, UnavailableReason};
use readmepulse_sources::Source;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Which source produced a streak value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakSource {
    Calendar,
    Svg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakEstimate {
    pub days: u32,
    pub source: StreakSource,
}

/// Count consecutive active days ending today or yesterday.
///
/// Today is skipped only when it has no contributions yet. Counting stops at
/// the first zero day or the first missing date. Days after `today` are
/// ignored. An empty calendar is `Unavailable(NoData)`, not a zero.
pub fn current_streak(days: &[ContributionDay], today: NaiveDate) -> FetchResult<u32> {
    if days.is_empty() {
        return FetchResult::Unavailable(UnavailableReason::NoData);
    }

    let mut sorted: Vec<&ContributionDay> = days.iter().filter(|d| d.date <= today).collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut walk = sorted.into_iter().peekable();
    if walk.peek().is_some_and(|d| d.date == today && d.count == 0) {
        walk.next();
    }

    let yesterday = today.pred_opt().unwrap_or(today);
    let mut streak = 0;
    let mut expected: Option<NaiveDate> = None;

    for day in walk {
        if day.count == 0 {
            break;
        }
        match expected {
            None if day.date < yesterday => break,
            Some(date) if day.date != date => break,
            _ => {}
        }
        streak += 1;
        expected = day.date.pred_opt();
    }

    FetchResult::Success(streak)
}

/// Calendar first, rendered SVG second.
///
/// An empty or unavailable calendar falls through to the SVG. When both fail
/// the result is `Unavailable` with the SVG's reason.
#[instrument(skip_all, fields(%today))]
pub async fn estimate<C, S>(calendar: &C, svg: &S, today: NaiveDate) -> FetchResult<StreakEstimate>
where
    C: Source<Output = Vec<ContributionDay>>,
    S: Source<Output = u32>,
{
    let from_calendar = calendar
        .fetch()
        .await
        .and_then(|days| current_streak(&days, today));

    match from_calendar {
        FetchResult::Success(days) => {
            info!(days, source = calendar.name(), "streak computed from calendar");
            return FetchResult::Success(StreakEstimate {
                days,
                source: StreakSource::Calendar,
            });
        }
        FetchResult::Unavailable(reason) => {
            warn!(%reason, "calendar streak unavailable, trying SVG renderers");
        }
    }

    match svg.fetch().await {
        FetchResult::Success(days) => {
            info!(days, source = svg.name(), "streak scraped from SVG");
            FetchResult::Success(StreakEstimate {
                days,
                source: StreakSource::Svg,
            })
        }
        FetchResult::Unavailable(reason) => {
            warn!(%reason, "no streak source available, badge left as is");
            FetchResult::Unavailable(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 12).unwrap()
    }

    /// Counts from today backwards.
    fn run(counts: &[u32]) -> Vec<ContributionDay> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                ContributionDay::new(today() - chrono::Days::new(i as u64), c)
            })
            .collect()
    }

    #[test]
    fn zero_today_is_skipped() {
        assert_eq!(current_streak(&run(&[0, 3, 2, 0]), today()), FetchResult::Success(2));
    }

    #[test]
    fn active_today_counts() {
        assert_eq!(current_streak(&run(&[5, 0]), today()), FetchResult::Success(1));
    }

    #[test]
    fn empty_calendar_is_unavailable() {
        assert_eq!(
            current_streak(&[], today()),
            FetchResult::Unavailable(UnavailableReason::NoData)
        );
    }

    #[test]
    fn all_zero_is_a_computed_zero() {
        assert_eq!(current_streak(&run(&[0, 0, 0]), today()), FetchResult::Success(0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut days = run(&[1, 4, 4, 0, 9]);
        days.reverse();
        assert_eq!(current_streak(&days, today()), FetchResult::Success(3));
    }

    #[test]
    fn date_gap_ends_streak() {
        let days = vec![
            ContributionDay::new(today(), 2),
            ContributionDay::new(today() - chrono::Days::new(1), 2),
            ContributionDay::new(today() - chrono::Days::new(3), 2),
        ];
        assert_eq!(current_streak(&days, today()), FetchResult::Success(2));
    }

    #[test]
    fn stale_calendar_is_zero() {
        let days = vec![
            ContributionDay::new(today() - chrono::Days::new(3), 5),
            ContributionDay::new(today() - chrono::Days::new(4), 5),
        ];
        assert_eq!(current_streak(&days, today()), FetchResult::Success(0));
    }

    #[test]
    fn future_days_are_ignored() {
        let mut days = run(&[2, 2]);
        days.push(ContributionDay::new(today() + chrono::Days::new(1), 0));
        assert_eq!(current_streak(&days, today()), FetchResult::Success(2));
    }

    struct Fixed<T>(FetchResult<T>);

    impl<T: Clone + Send + Sync> Source for Fixed<T> {
        type Output = T;

        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self) -> FetchResult<T> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn calendar_wins_when_available() {
        let calendar = Fixed(FetchResult::Success(run(&[1, 1, 1])));
        let svg = Fixed(FetchResult::Success(99u32));
        let estimate = estimate(&calendar, &svg, today()).await;
        assert_eq!(
            estimate,
            FetchResult::Success(StreakEstimate {
                days: 3,
                source: StreakSource::Calendar
            })
        );
    }

    #[tokio::test]
    async fn empty_calendar_falls_back_to_svg() {
        let calendar = Fixed(FetchResult::Success(Vec::new()));
        let svg = Fixed(FetchResult::Success(108u32));
        let estimate = estimate(&calendar, &svg, today()).await;
        assert_eq!(
            estimate,
            FetchResult::Success(StreakEstimate {
                days: 108,
                source: StreakSource::Svg
            })
        );
    }

    #[tokio::test]
    async fn both_failing_is_unavailable() {
        let calendar: Fixed<Vec<ContributionDay>> =
            Fixed(FetchResult::Unavailable(UnavailableReason::MissingCredentials));
        let svg: Fixed<u32> = Fixed(FetchResult::Unavailable(UnavailableReason::Status(503)));
        let estimate = estimate(&calendar, &svg, today()).await;
        assert_eq!(
            estimate,
            FetchResult::Unavailable(UnavailableReason::Status(503))
        );
    }
}

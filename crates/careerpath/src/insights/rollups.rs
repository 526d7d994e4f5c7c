//! Read-side statistical rollups over persisted results.
//!
//! Everything here is pure: slices in, owned aggregates out, no storage access
//! and no mutation. Calendar bucketing uses UTC as the fixed reference
//! timezone so bucket keys sort lexicographically.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::progress::domain::TestResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Submissions per calendar day, ascending by day.
pub fn daily_counts(results: &[TestResult]) -> Vec<DailyCount> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for result in results {
        *buckets.entry(result.created_at.date_naive()).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPerformance {
    pub date: NaiveDate,
    pub attempts: usize,
    pub average_score: i64,
    pub average_time: i64,
}

/// Per-day attempt counts with rounded score/time averages, ascending by day.
pub fn daily_performance(results: &[TestResult]) -> Vec<DailyPerformance> {
    let mut buckets: BTreeMap<NaiveDate, (usize, i64, i64)> = BTreeMap::new();
    for result in results {
        let entry = buckets
            .entry(result.created_at.date_naive())
            .or_insert((0, 0, 0));
        entry.0 += 1;
        entry.1 += result.total_score;
        entry.2 += result.time_taken_secs as i64;
    }
    buckets
        .into_iter()
        .map(|(date, (attempts, score_sum, time_sum))| DailyPerformance {
            date,
            attempts,
            average_score: rounded_mean(score_sum, attempts),
            average_time: rounded_mean(time_sum, attempts),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub attempts: usize,
    pub average_score: i64,
}

/// Per-month attempt counts with rounded score averages, ascending by month
/// (`YYYY-MM` keys sort correctly as strings).
pub fn monthly_trends(results: &[TestResult]) -> Vec<MonthlyTrend> {
    let mut buckets: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for result in results {
        let key = format!(
            "{:04}-{:02}",
            result.created_at.year(),
            result.created_at.month()
        );
        let entry = buckets.entry(key).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += result.total_score;
    }
    buckets
        .into_iter()
        .map(|(month, (attempts, score_sum))| MonthlyTrend {
            month,
            attempts,
            average_score: rounded_mean(score_sum, attempts),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentileStanding {
    pub percentile: u8,
    pub participants: usize,
}

/// Share of the population at or below the target score, rounded.
///
/// An empty population is the no-comparison-data case and reads as 100.
pub fn percentile(score: i64, population: &[i64]) -> PercentileStanding {
    let participants = population.len();
    if participants == 0 {
        return PercentileStanding {
            percentile: 100,
            participants: 0,
        };
    }

    let better = population.iter().filter(|&&p| p > score).count();
    let percentile =
        ((participants - better) as f64 / participants as f64 * 100.0).round() as u8;
    PercentileStanding {
        percentile,
        participants,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub score: i64,
    pub time_taken_secs: u64,
    pub completed_at: DateTime<Utc>,
}

/// Shared results ranked by score, faster time breaking ties. Ranks are dense
/// 1-based positions in the sorted order, so equal scores separated by time
/// still receive distinct consecutive ranks.
pub fn leaderboard(results: &[TestResult], limit: usize) -> Vec<LeaderboardEntry> {
    let mut shared: Vec<&TestResult> = results.iter().filter(|r| r.is_shared).collect();
    shared.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.time_taken_secs.cmp(&b.time_taken_secs))
    });

    shared
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, result)| LeaderboardEntry {
            rank: index + 1,
            user_id: result.user_id.clone(),
            score: result.total_score,
            time_taken_secs: result.time_taken_secs,
            completed_at: result.created_at,
        })
        .collect()
}

/// Most frequently attempted test category; ties go to the category first
/// encountered walking the history in creation order.
pub fn favorite_category(results: &[TestResult]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for result in by_creation_order(results) {
        if result.test_category.is_empty() {
            continue;
        }
        match counts
            .iter_mut()
            .find(|(category, _)| *category == result.test_category)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((result.test_category.clone(), 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(category, _)| category)
}

/// Skill category with the highest mean score; ties go to the skill first
/// encountered walking the history in creation order.
pub fn strongest_skill(results: &[TestResult]) -> Option<String> {
    let mut sums: Vec<(String, i64, usize)> = Vec::new();
    for result in by_creation_order(results) {
        for (category, score) in &result.category_scores {
            match sums.iter_mut().find(|(name, _, _)| name == category) {
                Some((_, sum, count)) => {
                    *sum += score;
                    *count += 1;
                }
                None => sums.push((category.clone(), *score, 1)),
            }
        }
    }

    let mut best: Option<(String, f64)> = None;
    for (category, sum, count) in sums {
        let mean = sum as f64 / count as f64;
        match &best {
            Some((_, best_mean)) if mean <= *best_mean => {}
            _ => best = Some((category, mean)),
        }
    }
    best.map(|(category, _)| category)
}

/// Mean score per skill category across the supplied history.
pub fn skill_averages(results: &[TestResult]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for result in results {
        for (category, score) in &result.category_scores {
            let entry = sums.entry(category.clone()).or_insert((0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(category, (sum, count))| (category, sum as f64 / count as f64))
        .collect()
}

/// Attempts as a percentage of the test's completion counter. A zero counter
/// counts as 1 so the ratio stays defined.
pub fn completion_rate(attempts: usize, completed_count: u64) -> u32 {
    let denominator = completed_count.max(1);
    ((attempts as f64 / denominator as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBucket {
    pub range: String,
    pub count: usize,
}

/// Histogram of total scores in 10-wide buckets, ascending by bucket start.
pub fn score_distribution(results: &[TestResult]) -> Vec<ScoreBucket> {
    let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
    for result in results {
        let start = result.total_score.div_euclid(10) * 10;
        *buckets.entry(start).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(start, count)| ScoreBucket {
            range: format!("{start}-{}", start + 9),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub test_title: String,
    pub score: i64,
    pub completed_at: DateTime<Utc>,
}

/// Per-user dashboard rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub tests_completed: usize,
    pub average_score: i64,
    pub total_time_minutes: i64,
    pub favorite_category: Option<String>,
    pub strongest_skill: Option<String>,
    pub improvement_areas: Vec<String>,
    pub recent_activity: Vec<RecentActivity>,
    pub skill_breakdown: BTreeMap<String, f64>,
}

/// Aggregate a user's history into the dashboard shape; an empty history is a
/// fully zeroed report, not an error.
pub fn user_stats(results: &[TestResult]) -> UserStats {
    if results.is_empty() {
        return UserStats {
            tests_completed: 0,
            average_score: 0,
            total_time_minutes: 0,
            favorite_category: None,
            strongest_skill: None,
            improvement_areas: Vec::new(),
            recent_activity: Vec::new(),
            skill_breakdown: BTreeMap::new(),
        };
    }

    let score_sum: i64 = results.iter().map(|r| r.total_score).sum();
    let time_sum: i64 = results.iter().map(|r| r.time_taken_secs as i64).sum();

    let averages = skill_averages(results);
    let mut improvement_areas: Vec<(String, f64)> = averages
        .iter()
        .filter(|(_, mean)| **mean < 3.0)
        .map(|(category, mean)| (category.clone(), *mean))
        .collect();
    improvement_areas.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut newest_first: Vec<&TestResult> = results.iter().collect();
    newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_activity = newest_first
        .iter()
        .take(5)
        .map(|result| RecentActivity {
            test_title: result.test_title.clone(),
            score: result.total_score,
            completed_at: result.created_at,
        })
        .collect();

    UserStats {
        tests_completed: results.len(),
        average_score: rounded_mean(score_sum, results.len()),
        total_time_minutes: (time_sum as f64 / 60.0).round() as i64,
        favorite_category: favorite_category(results),
        strongest_skill: strongest_skill(results),
        improvement_areas: improvement_areas
            .into_iter()
            .take(3)
            .map(|(category, _)| category)
            .collect(),
        recent_activity,
        skill_breakdown: averages,
    }
}

fn by_creation_order(results: &[TestResult]) -> Vec<&TestResult> {
    let mut ordered: Vec<&TestResult> = results.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    ordered
}

fn rounded_mean(sum: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::TestId;
    use crate::progress::domain::ResultId;
    use chrono::TimeZone;

    fn result_at(
        id: &str,
        day: u32,
        score: i64,
        time: u64,
        shared: bool,
        category: &str,
    ) -> TestResult {
        TestResult {
            id: ResultId(id.to_string()),
            user_id: format!("user-{id}"),
            test_id: TestId("sample".to_string()),
            test_title: "Sample".to_string(),
            test_category: category.to_string(),
            total_score: score,
            category_scores: BTreeMap::from([(category.to_string(), score)]),
            answers: Default::default(),
            time_taken_secs: time,
            is_shared: shared,
            created_at: Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn daily_counts_sort_ascending() {
        let results = vec![
            result_at("a", 3, 10, 60, false, "orientation"),
            result_at("b", 1, 20, 60, false, "orientation"),
            result_at("c", 3, 30, 60, false, "orientation"),
        ];
        let buckets = daily_counts(&results);
        assert_eq!(buckets.len(), 2);
        assert!(buckets[0].date < buckets[1].date);
        assert_eq!(buckets[1].count, 2);
    }

    #[test]
    fn percentile_of_the_top_scorer_is_100() {
        let standing = percentile(42, &[10, 25, 42, 30]);
        assert_eq!(standing.percentile, 100);
        assert_eq!(standing.participants, 4);
    }

    #[test]
    fn percentile_with_no_population_is_100_without_comparison() {
        let standing = percentile(42, &[]);
        assert_eq!(standing.percentile, 100);
        assert_eq!(standing.participants, 0);
    }

    #[test]
    fn percentile_counts_only_strictly_better_scores() {
        // Two of four strictly above 20: (4 - 2) / 4 = 50%.
        assert_eq!(percentile(20, &[10, 20, 30, 40]).percentile, 50);
    }

    #[test]
    fn leaderboard_ranks_are_contiguous_and_never_score_inverted() {
        let results = vec![
            result_at("a", 1, 50, 300, true, "orientation"),
            result_at("b", 2, 70, 200, true, "orientation"),
            result_at("c", 3, 70, 100, true, "orientation"),
            result_at("d", 4, 90, 500, false, "orientation"), // not shared
            result_at("e", 5, 10, 50, true, "orientation"),
        ];
        let entries = leaderboard(&results, 10);

        let ranks: Vec<_> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        // tie at 70 broken by the faster time
        assert_eq!(entries[0].time_taken_secs, 100);
        assert_eq!(entries[1].time_taken_secs, 200);
        for pair in entries.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn leaderboard_truncates_to_the_limit() {
        let results = vec![
            result_at("a", 1, 50, 300, true, "orientation"),
            result_at("b", 2, 70, 200, true, "orientation"),
            result_at("c", 3, 60, 100, true, "orientation"),
        ];
        let entries = leaderboard(&results, 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.last().map(|e| e.rank), Some(2));
    }

    #[test]
    fn favorite_category_ties_break_on_first_encounter() {
        let results = vec![
            result_at("a", 1, 10, 60, false, "skills"),
            result_at("b", 2, 10, 60, false, "orientation"),
            result_at("c", 3, 10, 60, false, "orientation"),
            result_at("d", 4, 10, 60, false, "skills"),
        ];
        // both categories occur twice; "skills" was created first
        assert_eq!(favorite_category(&results).as_deref(), Some("skills"));
    }

    #[test]
    fn strongest_skill_uses_the_mean_not_the_sum() {
        let mut frequent_low = result_at("a", 1, 2, 60, false, "orientation");
        frequent_low.category_scores =
            BTreeMap::from([("social".to_string(), 2), ("technical".to_string(), 5)]);
        let mut second = result_at("b", 2, 2, 60, false, "orientation");
        second.category_scores = BTreeMap::from([("social".to_string(), 2)]);

        // social: mean 2 over two observations; technical: mean 5 over one.
        assert_eq!(
            strongest_skill(&[frequent_low, second]).as_deref(),
            Some("technical")
        );
    }

    #[test]
    fn completion_rate_guards_division_by_zero() {
        assert_eq!(completion_rate(3, 0), 300);
        assert_eq!(completion_rate(5, 10), 50);
    }

    #[test]
    fn score_distribution_buckets_by_ten() {
        let results = vec![
            result_at("a", 1, 5, 60, false, "orientation"),
            result_at("b", 2, 9, 60, false, "orientation"),
            result_at("c", 3, 17, 60, false, "orientation"),
        ];
        let buckets = score_distribution(&results);
        assert_eq!(
            buckets,
            vec![
                ScoreBucket {
                    range: "0-9".to_string(),
                    count: 2
                },
                ScoreBucket {
                    range: "10-19".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn user_stats_for_empty_history_is_zeroed() {
        let stats = user_stats(&[]);
        assert_eq!(stats.tests_completed, 0);
        assert_eq!(stats.average_score, 0);
        assert!(stats.favorite_category.is_none());
        assert!(stats.recent_activity.is_empty());
    }

    #[test]
    fn user_stats_aggregates_scores_and_times() {
        let results = vec![
            result_at("a", 1, 10, 90, false, "orientation"),
            result_at("b", 2, 20, 30, false, "orientation"),
        ];
        let stats = user_stats(&results);
        assert_eq!(stats.tests_completed, 2);
        assert_eq!(stats.average_score, 15);
        assert_eq!(stats.total_time_minutes, 2);
        assert_eq!(stats.recent_activity.len(), 2);
        // newest first
        assert_eq!(stats.recent_activity[0].score, 20);
    }
}

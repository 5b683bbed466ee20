use time::OffsetDateTime;
use crate::models::check_in::CheckInSummary;
use crate::models::stats::UserStats;

pub fn summarize_check_ins(
    check_ins: &[CheckInSummary],
    now: OffsetDateTime,
) -> UserStats {
    let places_visited = check_ins.len();

    let average_rating = if places_visited == 0 {
        0.0
    } else {
        let total: f64 = check_ins
            .iter()
            .map(|check_in| f64::from(check_in.rating.unwrap_or(0)))
            .sum();
        (total / places_visited as f64 * 10.0).round() / 10.0
    };

    let this_month = check_ins
        .iter()
        .filter(|check_in| {
            check_in.visited_at.year() == now.year() && check_in.visited_at.month() == now.month()
        })
        .count();

    UserStats {
        places_visited,
        average_rating,
        this_month,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use super::*;

    #[test]
    fn no_check_ins_is_an_empty_summary() {
        let stats = summarize_check_ins(&[], datetime!(2024-05-20 12:00 UTC));
        assert_eq!(
            stats,
            UserStats {
                places_visited: 0,
                average_rating: 0.0,
                this_month: 0,
            }
        );
    }

    #[test]
    fn averages_with_unrated_visits_counted_as_zero() {
        let check_ins = [
            CheckInSummary { rating: Some(5), visited_at: datetime!(2024-05-01 19:00 UTC) },
            CheckInSummary { rating: Some(4), visited_at: datetime!(2024-04-30 19:00 UTC) },
            CheckInSummary { rating: None, visited_at: datetime!(2023-05-10 19:00 UTC) },
        ];

        let stats = summarize_check_ins(&check_ins, datetime!(2024-05-20 12:00 UTC));
        assert_eq!(stats.places_visited, 3);
        assert_eq!(stats.average_rating, 3.0);
        assert_eq!(stats.this_month, 1);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let check_ins = [
            CheckInSummary { rating: Some(5), visited_at: datetime!(2024-05-01 19:00 UTC) },
            CheckInSummary { rating: Some(4), visited_at: datetime!(2024-05-02 19:00 UTC) },
            CheckInSummary { rating: Some(4), visited_at: datetime!(2024-05-03 19:00 UTC) },
        ];

        let stats = summarize_check_ins(&check_ins, datetime!(2024-05-20 12:00 UTC));
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.this_month, 3);
    }
}

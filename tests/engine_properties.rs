// Engine guarantees exercised through the public API

#[cfg(test)]
mod tests {
    use nba_parlay::engine::assembler::is_high_confidence;
    use nba_parlay::engine::eligibility::{check, Window};
    use nba_parlay::engine::generators;
    use nba_parlay::engine::legs::{Direction, Matchup, Qualification, Selection, TeamRef};
    use nba_parlay::engine::odds::{american_to_decimal, combine};
    use nba_parlay::engine::projection::{select, select_spread, team_total_qualification};
    use nba_parlay::feed::types::{GameRecord, PricedLine};
    use nba_parlay::ParlayError;

    fn matchup() -> Matchup {
        Matchup {
            game_id: "2026-03-01-MIA-BOS".to_string(),
            home: TeamRef { id: 1, name: "Boston Celtics".to_string() },
            away: TeamRef { id: 2, name: "Miami Heat".to_string() },
        }
    }

    fn records(team_id: u32, scores: &[(u32, u32)]) -> Vec<GameRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &(team_score, opponent_score))| GameRecord {
                game_id: format!("{team_id}-{i}"),
                date: chrono::NaiveDate::from_ymd_opt(2026, 2, 27).unwrap() - chrono::Duration::days(2 * i as i64),
                team_id,
                opponent_id: 9,
                team_score,
                opponent_score,
                is_home: false,
            })
            .collect()
    }

    #[test]
    fn test_ladder_boundaries() {
        for (window, reject, accept) in [(5, 2, 3), (10, 6, 7), (15, 9, 10)] {
            assert!(!check(reject, window).unwrap().is_eligible());
            assert!(check(accept, window).unwrap().is_eligible());
        }
        assert_eq!(check(3, 8), Err(ParlayError::UnsupportedWindow(8)));
    }

    #[test]
    fn test_odds_conversion_and_product() {
        assert!((american_to_decimal(-110).unwrap() - 1.909).abs() < 0.001);
        assert!((american_to_decimal(120).unwrap() - 2.2).abs() < 1e-12);
        assert!(matches!(american_to_decimal(0), Err(ParlayError::InvalidOdds(_))));

        let combined = combine(&[-110, 120], 10.0).unwrap();
        let product = american_to_decimal(-110).unwrap() * american_to_decimal(120).unwrap();
        assert_eq!(combined.decimal, product);
    }

    #[test]
    fn test_projection_prefers_consistent_line() {
        let values = [26.0, 23.0, 20.0, 25.0, 30.0, 26.0, 23.0, 20.0, 25.0, 30.0];
        let result = select(&values, &[20.5, 22.5, 24.5, 26.5], Direction::Over)
            .unwrap()
            .unwrap();
        assert_eq!(result.line, 22.5);
        let deciding = result.windows.last().unwrap();
        assert_eq!((deciding.window, deciding.hits), (Window::L10, 8));
    }

    #[test]
    fn test_spread_cover_example() {
        let margins = [10.0, -3.0, 8.0, 2.0, 12.0];
        let result = select_spread(&margins, &[-7.5]).unwrap().unwrap();
        assert_eq!(result.windows[0].hits, 3);
    }

    #[test]
    fn test_partial_team_total_is_not_high_confidence() {
        let q = team_total_qualification(
            &[118.0, 112.0, 121.0, 109.0, 115.0],
            &[104.0, 108.0, 101.0, 110.0, 107.0],
            112.5,
            Direction::Over,
            Window::L5,
        )
        .unwrap();
        assert_eq!(q.status(), Qualification::Partial);

        // 5/5 over the line, opponent still allows too little
        let team = records(1, &[(118, 100), (114, 100), (121, 100), (113, 100), (116, 100)]);
        let opponent = records(2, &[(100, 104), (100, 108), (100, 101), (100, 110), (100, 107)]);
        let candidate = generators::team_total(
            &matchup(),
            &matchup().home,
            Direction::Over,
            PricedLine { line: 112.5, odds: -115 },
            &team,
            &opponent,
            Window::L5,
        )
        .unwrap()
        .unwrap();
        assert_eq!(candidate.leg.percentage(), 100.0);
        assert!(matches!(
            candidate.leg.selection,
            Selection::TeamTotal { qualification: Some(q), .. } if q.status() == Qualification::Partial
        ));
        assert!(!is_high_confidence(&candidate.leg, 80.0));
    }

    #[test]
    fn test_rejected_subject_never_becomes_a_leg() {
        let team = records(1, &[(100, 110), (101, 104), (120, 100), (99, 100), (98, 102)]);
        let out = generators::moneyline(&matchup(), &matchup().home, -120, &team, &[], Window::L5).unwrap();
        assert!(out.is_none());
    }
}

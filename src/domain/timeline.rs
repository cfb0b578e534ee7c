use crate::domain::{PhaseKind, TimelineItem, WorkoutConfig};

/// Duration of the leading countdown phase in seconds.
pub const COUNTDOWN_SECONDS: f64 = 5.0;

/// Expand a workout configuration into the ordered phase sequence for one run.
///
/// Pure and deterministic: one countdown item first, then for every group in
/// declaration order and every round 1..=rounds one work item, followed by a
/// pause item only when the group has a non-zero rest duration.
pub fn build_timeline(config: &WorkoutConfig) -> Vec<TimelineItem> {
    let mut timeline = Vec::new();

    timeline.push(TimelineItem {
        kind: PhaseKind::Countdown,
        group_index: 0,
        round: 0,
        duration_seconds: COUNTDOWN_SECONDS,
    });

    for (group_index, group) in config.groups.iter().enumerate() {
        for round in 1..=group.rounds {
            timeline.push(TimelineItem {
                kind: PhaseKind::Work,
                group_index,
                round,
                duration_seconds: group.work_seconds,
            });
            if group.pause_seconds > 0.0 {
                timeline.push(TimelineItem {
                    kind: PhaseKind::Pause,
                    group_index,
                    round,
                    duration_seconds: group.pause_seconds,
                });
            }
        }
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoundGroup;

    fn config(groups: Vec<(u32, f64, f64)>) -> WorkoutConfig {
        WorkoutConfig {
            groups: groups
                .into_iter()
                .enumerate()
                .map(|(i, (rounds, work, pause))| RoundGroup {
                    id: format!("g{}", i),
                    rounds,
                    work_seconds: work,
                    pause_seconds: pause,
                })
                .collect(),
        }
    }

    #[test]
    fn test_single_group_with_pauses() {
        // 2 rounds x 30s work / 10s rest
        let timeline = build_timeline(&config(vec![(2, 30.0, 10.0)]));

        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline[0].kind, PhaseKind::Countdown);
        assert_eq!(timeline[0].duration_seconds, COUNTDOWN_SECONDS);
        assert_eq!(timeline[0].round, 0);

        assert_eq!(timeline[1].kind, PhaseKind::Work);
        assert_eq!(timeline[1].round, 1);
        assert_eq!(timeline[1].duration_seconds, 30.0);
        assert_eq!(timeline[2].kind, PhaseKind::Pause);
        assert_eq!(timeline[2].round, 1);
        assert_eq!(timeline[2].duration_seconds, 10.0);
        assert_eq!(timeline[3].kind, PhaseKind::Work);
        assert_eq!(timeline[3].round, 2);
        assert_eq!(timeline[4].kind, PhaseKind::Pause);
        assert_eq!(timeline[4].round, 2);
    }

    #[test]
    fn test_zero_pause_omits_rest_items() {
        let timeline = build_timeline(&config(vec![(1, 20.0, 0.0)]));

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].kind, PhaseKind::Countdown);
        assert_eq!(timeline[1].kind, PhaseKind::Work);
        assert_eq!(timeline[1].duration_seconds, 20.0);
    }

    #[test]
    fn test_empty_config_yields_only_countdown() {
        let timeline = build_timeline(&WorkoutConfig::default());
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].kind, PhaseKind::Countdown);
    }

    #[test]
    fn test_length_formula() {
        // len == 1 + sum(rounds + (pause > 0 ? rounds : 0))
        let cases = vec![
            config(vec![(3, 45.0, 15.0)]),
            config(vec![(2, 30.0, 0.0), (4, 60.0, 20.0)]),
            config(vec![(1, 10.0, 5.0), (1, 10.0, 0.0), (5, 20.0, 30.0)]),
        ];
        for cfg in cases {
            let expected: usize = 1 + cfg
                .groups
                .iter()
                .map(|g| {
                    g.rounds as usize * if g.pause_seconds > 0.0 { 2 } else { 1 }
                })
                .sum::<usize>();
            assert_eq!(build_timeline(&cfg).len(), expected);
        }
    }

    #[test]
    fn test_group_indices_follow_declaration_order() {
        let timeline = build_timeline(&config(vec![(1, 10.0, 0.0), (2, 20.0, 5.0)]));
        assert_eq!(timeline[1].group_index, 0);
        assert_eq!(timeline[2].group_index, 1);
        assert_eq!(timeline[2].round, 1);
        assert_eq!(timeline[4].group_index, 1);
        assert_eq!(timeline[4].round, 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let cfg = config(vec![(2, 30.0, 10.0), (3, 40.0, 0.0)]);
        assert_eq!(build_timeline(&cfg), build_timeline(&cfg));
    }
}

//! [`Arbitrator`] – winner-take-all selection over the active behaviours.
//!
//! Exactly one behaviour's command is dispatched per tick; commands are
//! heterogeneous tagged values (turn vs. drive vs. stop), so blending them
//! would need an ad hoc combination rule.  The winner is the maximal-weight
//! behaviour; equal weights resolve to the earliest behaviour in the
//! controller's ordering, reproducibly.
//!
//! The halt flag is monotonic: once any active behaviour requests a halt the
//! arbitrator stays halted for the rest of the run.

use tracing::debug;

use roam_types::MotorCommand;

use crate::behaviour::Behaviour;

/// Per-tick selection state.
#[derive(Default)]
pub struct Arbitrator {
    halt: bool,
    recommendation: Option<MotorCommand>,
    winner: Option<(String, f32)>,
}

impl Arbitrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select this tick's recommendation from the active behaviours, in
    /// controller order.
    ///
    /// An empty set produces no recommendation and leaves the halt flag
    /// unchanged.
    pub fn choose_action(&mut self, active: &[&Behaviour]) {
        if active.is_empty() {
            self.recommendation = None;
            self.winner = None;
            return;
        }

        if active.iter().any(|b| b.halt_requested()) {
            self.halt = true;
        }

        // Strictly-greater comparison keeps the earliest behaviour on ties.
        let mut winner = active[0];
        for behaviour in &active[1..] {
            if behaviour.weight() > winner.weight() {
                winner = behaviour;
            }
        }

        debug!(
            winner = winner.name(),
            weight = winner.weight(),
            halt = self.halt,
            "arbitration complete"
        );
        self.recommendation = winner.motor_recommendation().cloned();
        self.winner = Some((winner.name().to_string(), winner.weight()));
    }

    /// Fold an external interrupt into the monotonic halt.
    pub fn request_halt(&mut self) {
        self.halt = true;
    }

    /// `true` once any tick has requested a halt.
    pub fn halted(&self) -> bool {
        self.halt
    }

    /// The winning command of the most recent arbitration, if any.
    pub fn recommendation(&self) -> Option<&MotorCommand> {
        self.recommendation.as_ref()
    }

    /// Name and weight of the most recent winner, for telemetry.
    pub fn winner(&self) -> Option<(&str, f32)> {
        self.winner.as_ref().map(|(name, w)| (name.as_str(), *w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_types::{DriveDirection, TurnDirection};

    fn drive(speed: f32) -> MotorCommand {
        MotorCommand::Drive {
            direction: DriveDirection::Forward,
            speed,
        }
    }

    #[test]
    fn selects_the_maximal_weight_recommendation() {
        let low = Behaviour::scripted("low", 1.0, 0.2, Some(drive(0.1)), false);
        let high = Behaviour::scripted("high", 1.0, 0.9, Some(drive(0.9)), false);
        let mid = Behaviour::scripted("mid", 1.0, 0.5, Some(drive(0.5)), false);

        let mut arbitrator = Arbitrator::new();
        arbitrator.choose_action(&[&low, &high, &mid]);

        assert_eq!(arbitrator.recommendation(), Some(&drive(0.9)));
        assert_eq!(arbitrator.winner().map(|(n, _)| n), Some("high"));
    }

    #[test]
    fn priority_scales_the_weight() {
        // 0.4 × 5.0 beats 0.9 × 1.0.
        let weak = Behaviour::scripted("weak", 1.0, 0.9, Some(drive(0.9)), false);
        let strong = Behaviour::scripted("strong", 5.0, 0.4, Some(drive(0.4)), false);

        let mut arbitrator = Arbitrator::new();
        arbitrator.choose_action(&[&weak, &strong]);
        assert_eq!(arbitrator.winner().map(|(n, _)| n), Some("strong"));
    }

    #[test]
    fn ties_resolve_to_the_earliest_behaviour() {
        let first = Behaviour::scripted("first", 1.0, 0.5, Some(drive(0.1)), false);
        let second = Behaviour::scripted("second", 1.0, 0.5, Some(drive(0.2)), false);

        let mut arbitrator = Arbitrator::new();
        for _ in 0..10 {
            arbitrator.choose_action(&[&first, &second]);
            assert_eq!(arbitrator.recommendation(), Some(&drive(0.1)));
        }
    }

    #[test]
    fn halt_is_monotonic() {
        let quitter = Behaviour::scripted("quitter", 1.0, 0.5, None, true);
        let wanderer = Behaviour::scripted("wanderer", 1.0, 0.9, Some(drive(0.5)), false);

        let mut arbitrator = Arbitrator::new();
        arbitrator.choose_action(&[&quitter, &wanderer]);
        assert!(arbitrator.halted());

        // No behaviour requests a halt this time; the flag must hold.
        arbitrator.choose_action(&[&wanderer]);
        assert!(arbitrator.halted());
    }

    #[test]
    fn empty_set_produces_no_recommendation_and_keeps_halt() {
        let mut arbitrator = Arbitrator::new();
        arbitrator.choose_action(&[]);
        assert!(arbitrator.recommendation().is_none());
        assert!(!arbitrator.halted());

        arbitrator.request_halt();
        arbitrator.choose_action(&[]);
        assert!(arbitrator.halted());
        assert!(arbitrator.recommendation().is_none());
    }

    #[test]
    fn winner_command_kind_does_not_bias_selection() {
        let turner = Behaviour::scripted(
            "turner",
            1.0,
            0.8,
            Some(MotorCommand::Pivot {
                direction: TurnDirection::Left,
                angle_degrees: 45.0,
            }),
            false,
        );
        let driver = Behaviour::scripted("driver", 1.0, 0.3, Some(drive(0.5)), false);

        let mut arbitrator = Arbitrator::new();
        arbitrator.choose_action(&[&driver, &turner]);
        assert!(matches!(
            arbitrator.recommendation(),
            Some(MotorCommand::Pivot { .. })
        ));
    }
}

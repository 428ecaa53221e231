//! [`Controller`] – sequences the eight tick phases and owns the shared
//! sensor-registration set.
//!
//! One fixed-period tick executes, strictly in order:
//!
//! 1. Re-evaluate every behaviour's activation/deactivation predicate;
//!    transitions take effect immediately, within the same tick.
//! 2. Issue exactly one update to every registered sensor (at most one raw
//!    hardware read per sensor per tick, however many behaviours consult it).
//! 3. Let every active behaviour sense and act.
//! 4. Arbitrate over the active set.
//! 5. If halted: dispatch one stop to every motor adapter and terminate.
//! 6. Else dispatch the recommendation, if one was produced; an empty active
//!    set dispatches nothing and the motors hold their last command.
//! 7. Sleep for the tick period (a rate limiter, not a correctness
//!    mechanism).
//! 8. Reset every registered sensor, forcing a fresh read next tick.
//!
//! The registration set is mutated only here, via the transitions returned
//! by the behaviours: a sensor is added when the first behaviour needing it
//! activates, and removed only when, after a deactivation, no active
//! behaviour still references it — recomputed by scanning, so there is no
//! counter to drift.  Everything is single-threaded; phases run to
//! completion before the next begins.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use roam_hal::adapter::MotorAdapter;
use roam_perception::sensor::SensorRef;
use roam_types::{MotorCommand, RoamError, TickSummary};

use crate::arbitrator::Arbitrator;
use crate::behaviour::{Behaviour, Transition};

/// The control loop.  Behaviour order defines arbitration tie-break
/// priority.
pub struct Controller {
    behaviours: Vec<Behaviour>,
    /// Sensors currently registered for the per-tick update pass.
    sensors: Vec<SensorRef>,
    motors: Vec<MotorAdapter>,
    arbitrator: Arbitrator,
    tick_period: Duration,
    tick: u64,
    /// Terminal state: set after the halt tick's single stop dispatch.
    finished: bool,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Controller {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            behaviours: Vec::new(),
            sensors: Vec::new(),
            motors: Vec::new(),
            arbitrator: Arbitrator::new(),
            tick_period,
            tick: 0,
            finished: false,
            shutdown: None,
        }
    }

    /// Fold an external flag (e.g. an operator Ctrl-C) into the monotonic
    /// halt at the start of each tick.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Append a behaviour.  Sensors it references from construction are
    /// registered immediately; pooled sensors register on activation.
    pub fn add_behaviour(&mut self, behaviour: Behaviour) {
        for sensor in behaviour.referenced_sensors() {
            self.register_sensor(Rc::clone(sensor));
        }
        info!(behaviour = behaviour.name(), priority = behaviour.priority(), "behaviour added");
        self.behaviours.push(behaviour);
    }

    pub fn add_motor(&mut self, adapter: MotorAdapter) {
        self.motors.push(adapter);
    }

    /// Ids of the sensors currently registered for per-tick update.
    pub fn registered_sensor_ids(&self) -> Vec<String> {
        self.sensors
            .iter()
            .map(|s| s.borrow().id().to_string())
            .collect()
    }

    /// `true` once the loop has reached its terminal halted state.
    pub fn is_halted(&self) -> bool {
        self.finished
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run ticks until a halt is requested; returns the final summary.
    ///
    /// # Errors
    ///
    /// Propagates the first sensor or motor hardware fault; the loop does
    /// not retry (a failed hardware call invalidates the safety of
    /// continuing to command actuators).
    pub fn run(&mut self) -> Result<TickSummary, RoamError> {
        info!(
            behaviours = self.behaviours.len(),
            motors = self.motors.len(),
            tick_period_ms = self.tick_period.as_millis() as u64,
            "control loop starting"
        );
        loop {
            let summary = self.run_one_tick()?;
            if summary.halted {
                info!(tick = summary.tick, "control loop finished");
                return Ok(summary);
            }
        }
    }

    /// Run at most `n` ticks, stopping early on halt.
    ///
    /// # Errors
    ///
    /// Propagates hardware faults, as in [`Controller::run`].
    pub fn run_ticks(&mut self, n: u64) -> Result<Vec<TickSummary>, RoamError> {
        let mut summaries = Vec::new();
        for _ in 0..n {
            let summary = self.run_one_tick()?;
            let halted = summary.halted;
            summaries.push(summary);
            if halted {
                break;
            }
        }
        Ok(summaries)
    }

    /// Execute one tick of the eight-phase loop.
    ///
    /// After the terminal halt tick this is a no-op returning a halted
    /// summary: the single stop dispatch is never repeated.
    ///
    /// # Errors
    ///
    /// Propagates hardware faults from sensor updates and motor dispatches.
    pub fn run_one_tick(&mut self) -> Result<TickSummary, RoamError> {
        if self.finished {
            return Ok(self.summary(Some(MotorCommand::Stop)));
        }

        if let Some(flag) = &self.shutdown {
            if flag.load(Ordering::SeqCst) {
                info!("shutdown flag raised; folding into halt");
                self.arbitrator.request_halt();
            }
        }

        // Phase 1: state transitions, before any behaviour senses-and-acts.
        for i in 0..self.behaviours.len() {
            match self.behaviours[i].update_activity()? {
                Transition::None => {}
                Transition::Activated(added) => {
                    info!(behaviour = self.behaviours[i].name(), "behaviour activated");
                    for sensor in added {
                        self.register_sensor(sensor);
                    }
                }
                Transition::Deactivated(released) => {
                    info!(behaviour = self.behaviours[i].name(), "behaviour deactivated");
                    self.release_sensors(released);
                }
            }
        }

        // Phase 2: one update per registered sensor.
        for sensor in &self.sensors {
            sensor.borrow_mut().update()?;
        }

        // Phase 3: sense and act.
        for behaviour in self.behaviours.iter_mut().filter(|b| b.is_active()) {
            behaviour.sense_and_act()?;
        }

        // Phase 4: arbitration over the active set, in controller order.
        let active: Vec<&Behaviour> = self.behaviours.iter().filter(|b| b.is_active()).collect();
        self.arbitrator.choose_action(&active);

        // Phase 5: terminal halt — one stop dispatch, then no further ticks.
        if self.arbitrator.halted() {
            for motor in &mut self.motors {
                motor.dispatch(&MotorCommand::Stop)?;
            }
            self.finished = true;
            let summary = self.summary(Some(MotorCommand::Stop));
            self.tick += 1;
            return Ok(summary);
        }

        // Phase 6: dispatch the winning command, if any.
        let command = self.arbitrator.recommendation().cloned();
        if let Some(cmd) = &command {
            for motor in &mut self.motors {
                motor.dispatch(cmd)?;
            }
        }

        // Phase 7: rate limit.
        if !self.tick_period.is_zero() {
            thread::sleep(self.tick_period);
        }

        // Phase 8: clear memoized readings for the next tick.
        for sensor in &self.sensors {
            sensor.borrow_mut().reset();
        }

        let summary = self.summary(command);
        debug!(
            tick = summary.tick,
            winner = summary.winner.as_deref().unwrap_or("-"),
            command = summary.command.as_ref().map(|c| c.label()).unwrap_or("-"),
            "tick complete"
        );
        self.tick += 1;
        Ok(summary)
    }

    // ── Sensor registry ───────────────────────────────────────────────────

    fn register_sensor(&mut self, sensor: SensorRef) {
        let id = sensor.borrow().id().to_string();
        if !self.sensors.iter().any(|s| s.borrow().id() == id) {
            debug!(sensor = %id, "sensor registered");
            self.sensors.push(sensor);
        }
    }

    /// Deregister each released sensor unless some still-active behaviour
    /// references it.
    fn release_sensors(&mut self, released: Vec<SensorRef>) {
        for sensor in released {
            let id = sensor.borrow().id().to_string();
            let still_needed = self
                .behaviours
                .iter()
                .any(|b| b.is_active() && b.references_sensor(&id));
            if !still_needed {
                debug!(sensor = %id, "sensor deregistered");
                self.sensors.retain(|s| s.borrow().id() != id);
            }
        }
    }

    fn summary(&self, command: Option<MotorCommand>) -> TickSummary {
        let (winner, weight) = match self.arbitrator.winner() {
            Some((name, w)) => (Some(name.to_string()), Some(w)),
            None => (None, None),
        };
        TickSummary {
            tick: self.tick,
            timestamp: Utc::now(),
            winner,
            weight,
            command,
            halted: self.finished,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::behaviour_rng;

    use roam_hal::camera::CameraFrame;
    use roam_hal::sim::{MotorCall, SimCamera, SimMotors, SimRangeFinder};
    use roam_perception::color::ColorZoneSensor;
    use roam_perception::proximity::ProximitySensor;

    fn proximity(id: &str, script: Vec<f32>) -> Rc<RefCell<ProximitySensor>> {
        Rc::new(RefCell::new(ProximitySensor::new(SimRangeFinder::new(
            id, script,
        ))))
    }

    fn shared_camera(frames: Vec<CameraFrame>) -> Rc<RefCell<ColorZoneSensor>> {
        Rc::new(RefCell::new(
            ColorZoneSensor::new(SimCamera::new("camera_front", frames), "green").unwrap(),
        ))
    }

    #[test]
    fn explore_alone_recommends_every_tick_with_no_sensors() {
        let mut controller = Controller::new(Duration::ZERO);
        let motors = SimMotors::new("drive_base");
        let log = motors.recorder();
        controller.add_motor(MotorAdapter::new(motors));
        controller.add_behaviour(Behaviour::explore(0.25, behaviour_rng(3, 0)));

        let summaries = controller.run_ticks(5).unwrap();

        assert_eq!(summaries.len(), 5);
        for summary in &summaries {
            assert_eq!(summary.winner.as_deref(), Some("explore"));
            assert!(summary.command.is_some());
            assert!(!summary.halted);
        }
        // No sensor was ever registered, let alone updated.
        assert!(controller.registered_sensor_ids().is_empty());
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn halt_dispatches_exactly_one_stop_then_terminates() {
        let mut controller = Controller::new(Duration::ZERO);
        let motors = SimMotors::new("drive_base");
        let log = motors.recorder();
        controller.add_motor(MotorAdapter::new(motors));

        // Goal behaviour parked at a confirmed goal: halts on the first tick.
        let range = proximity("range_front", vec![1.5]);
        let cam = shared_camera(vec![CameraFrame::solid(9, 2, (0, 255, 0))]);
        controller.add_behaviour(Behaviour::goal_seeking(range, cam, 5.0));
        controller.add_behaviour(Behaviour::explore(0.25, behaviour_rng(3, 1)));

        let summaries = controller.run_ticks(4).unwrap();

        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].halted);
        assert_eq!(log.count_matching(|c| *c == MotorCall::Stop), 1);
        assert!(controller.is_halted());

        // The terminal state never repeats the stop dispatch.
        let again = controller.run_one_tick().unwrap();
        assert!(again.halted);
        assert_eq!(log.count_matching(|c| *c == MotorCall::Stop), 1);
    }

    #[test]
    fn shared_sensor_stays_registered_until_last_user_deactivates() {
        let mut controller = Controller::new(Duration::ZERO);

        // Two goal seekers share one camera; black frames keep them from
        // ever confirming a goal.
        let cam = shared_camera(vec![CameraFrame::solid(9, 2, (0, 0, 0))]);
        let range_a = proximity("range_a", vec![5.0, 5.0, 20.0]);
        let range_b = proximity("range_b", vec![5.0, 5.0, 5.0, 20.0]);
        controller.add_behaviour(Behaviour::goal_seeking(range_a, Rc::clone(&cam), 5.0));
        controller.add_behaviour(Behaviour::goal_seeking(range_b, cam, 5.0));

        // Tick 1: both activate; the shared camera registers once.
        controller.run_one_tick().unwrap();
        let ids = controller.registered_sensor_ids();
        assert_eq!(
            ids.iter().filter(|id| *id == "camera_front").count(),
            1,
            "shared sensor must register exactly once: {ids:?}"
        );

        // Tick 2: both still active.
        controller.run_one_tick().unwrap();
        assert!(controller.registered_sensor_ids().contains(&"camera_front".to_string()));

        // Tick 3: the first seeker deactivates; the second still references
        // the camera, so it stays registered.
        controller.run_one_tick().unwrap();
        assert!(controller.registered_sensor_ids().contains(&"camera_front".to_string()));

        // Tick 4: the second seeker deactivates too; now the camera goes.
        controller.run_one_tick().unwrap();
        assert!(!controller.registered_sensor_ids().contains(&"camera_front".to_string()));
    }

    #[test]
    fn empty_active_set_dispatches_nothing() {
        let mut controller = Controller::new(Duration::ZERO);
        let motors = SimMotors::new("drive_base");
        let log = motors.recorder();
        controller.add_motor(MotorAdapter::new(motors));

        // Too far to ever trigger: the goal seeker stays inactive.
        let range = proximity("range_front", vec![50.0]);
        let cam = shared_camera(vec![]);
        controller.add_behaviour(Behaviour::goal_seeking(range, cam, 5.0));

        let summaries = controller.run_ticks(3).unwrap();

        for summary in &summaries {
            assert!(summary.winner.is_none());
            assert!(summary.command.is_none());
        }
        // Motors hold whatever they were last commanded into: nothing.
        assert!(log.is_empty());
    }

    #[test]
    fn higher_weight_behaviour_wins_dispatch() {
        let mut controller = Controller::new(Duration::ZERO);
        let motors = SimMotors::new("drive_base");
        let log = motors.recorder();
        controller.add_motor(MotorAdapter::new(motors));

        // Crash prevention at full confidence (obstacle at 5 cm) against a
        // low-priority wanderer: the pivot must win every tick.
        let range = proximity("range_front", vec![5.0]);
        controller.add_behaviour(Behaviour::crash_prevention(range, 2.0, behaviour_rng(9, 0)));
        controller.add_behaviour(Behaviour::explore(0.25, behaviour_rng(9, 1)));

        let summaries = controller.run_ticks(3).unwrap();
        for summary in &summaries {
            assert_eq!(summary.winner.as_deref(), Some("crash_prevention"));
        }
        assert_eq!(
            log.count_matching(|c| matches!(c, MotorCall::Left { .. } | MotorCall::Right { .. })),
            3
        );
    }

    #[test]
    fn shutdown_flag_halts_with_a_single_stop() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut controller =
            Controller::new(Duration::ZERO).with_shutdown_flag(Arc::clone(&flag));
        let motors = SimMotors::new("drive_base");
        let log = motors.recorder();
        controller.add_motor(MotorAdapter::new(motors));
        controller.add_behaviour(Behaviour::explore(0.25, behaviour_rng(5, 0)));

        controller.run_one_tick().unwrap();
        assert!(!controller.is_halted());

        flag.store(true, Ordering::SeqCst);
        let summary = controller.run_one_tick().unwrap();
        assert!(summary.halted);
        assert_eq!(log.count_matching(|c| *c == MotorCall::Stop), 1);
    }

    #[test]
    fn tick_counter_advances_per_tick() {
        let mut controller = Controller::new(Duration::ZERO);
        controller.add_behaviour(Behaviour::explore(0.25, behaviour_rng(5, 0)));
        let summaries = controller.run_ticks(3).unwrap();
        let ticks: Vec<u64> = summaries.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }
}

//! [`Behaviour`] – the activation state machine and the closed set of
//! concrete strategies.
//!
//! A behaviour is either **Inactive** or **Active**.  Transitions are decided
//! by variant-specific predicates, evaluated for every behaviour before any
//! behaviour senses-and-acts in the same tick, so a behaviour that activates
//! this tick still gets to act this tick.  On activation a behaviour moves
//! its reserved sensors from its pool into its active-reference list and
//! returns them as a [`Transition`] intent; the controller applies the
//! registration centrally.  Behaviours never hold a reference back to the
//! controller.
//!
//! While active, a behaviour computes a match degree in `[0, 1]` (its own
//! confidence that its proposed command is currently right), a motor
//! recommendation, and optionally a halt request.  Its arbitration weight is
//! `match_degree × priority`.
//!
//! Activation predicates that need a sensor value call the adapter's
//! idempotent `update()` themselves; memoization keeps the tick at one raw
//! read per sensor no matter which phase touches the adapter first.
//!
//! The variant set is closed and matched exhaustively, the same way the
//! motor command vocabulary is: a new strategy is a new enum arm, visible to
//! every dispatch site at compile time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::rngs::SmallRng;

use roam_perception::color::ColorZoneSensor;
use roam_perception::line::LineBoundarySensor;
use roam_perception::proximity::ProximitySensor;
use roam_perception::sensor::{Sensor, SensorRef};
use roam_types::{DriveDirection, MotorCommand, RoamError, TurnDirection};

// ─────────────────────────────────────────────────────────────────────────────
// Transition intents
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one activation/deactivation evaluation, applied centrally by
/// the controller.
pub enum Transition {
    /// No state change this tick.
    None,
    /// Fired Inactive → Active; these sensors need registration.
    Activated(Vec<SensorRef>),
    /// Fired Active → Inactive; these sensors were released and may be
    /// deregistered if no other active behaviour still references them.
    Deactivated(Vec<SensorRef>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Behaviour
// ─────────────────────────────────────────────────────────────────────────────

/// One decision unit in the controller's ordered behaviour list.
pub struct Behaviour {
    name: &'static str,
    priority: f32,
    active: bool,
    match_degree: f32,
    motor_recommendation: Option<MotorCommand>,
    halt_request: bool,
    /// Sensors this behaviour currently references.  Sensors consulted by
    /// the activation predicate live here from construction; the rest start
    /// in `pool`.
    referenced: Vec<SensorRef>,
    /// Sensors reserved for this behaviour but not currently referenced.
    pool: Vec<SensorRef>,
    /// Ids of the sensors that participate in the pool ↔ referenced
    /// lifecycle, fixed at construction.
    pooled_ids: Vec<String>,
    kind: Kind,
}

/// Outcome of one variant-specific sense pass.
struct SenseOutcome {
    match_degree: f32,
    /// `Some` replaces the stored recommendation; `None` leaves it as-is.
    recommendation: Option<MotorCommand>,
    halt: bool,
}

impl Behaviour {
    // ── Constructors ──────────────────────────────────────────────────────

    /// Emergency obstacle avoidance.  Activates on its first evaluation and
    /// never deactivates; confidence rises as the obstacle closes in.
    pub fn crash_prevention(
        proximity: Rc<RefCell<ProximitySensor>>,
        priority: f32,
        rng: SmallRng,
    ) -> Self {
        let handle: SensorRef = proximity.clone();
        let pooled_ids = vec![handle.borrow().id().to_string()];
        Self {
            name: "crash_prevention",
            priority,
            active: false,
            match_degree: 0.0,
            motor_recommendation: None,
            halt_request: false,
            referenced: Vec::new(),
            pool: vec![handle],
            pooled_ids,
            kind: Kind::CrashPrevention(CrashPrevention {
                proximity,
                far: 30.0,
                close: 10.0,
                rng,
            }),
        }
    }

    /// Approach and stop at a colored goal.  Activates below the proximity
    /// trigger distance, deactivates above it; the camera is only referenced
    /// while active.
    pub fn goal_seeking(
        proximity: Rc<RefCell<ProximitySensor>>,
        color: Rc<RefCell<ColorZoneSensor>>,
        priority: f32,
    ) -> Self {
        let proximity_handle: SensorRef = proximity.clone();
        let color_handle: SensorRef = color.clone();
        let pooled_ids = vec![color_handle.borrow().id().to_string()];
        Self {
            name: "goal_seeking",
            priority,
            active: false,
            match_degree: 0.0,
            motor_recommendation: None,
            halt_request: false,
            referenced: vec![proximity_handle],
            pool: vec![color_handle],
            pooled_ids,
            kind: Kind::GoalSeeking(GoalSeeking {
                proximity,
                color,
                trigger: 10.0,
                goal: 2.0,
                zone_threshold: 0.2,
                goal_threshold: 0.9,
                side_margin: 0.05,
            }),
        }
    }

    /// Follow a dark line on the floor.  Activates once a boundary reading
    /// exists and never deactivates.
    pub fn line_following(
        line: Rc<RefCell<LineBoundarySensor>>,
        priority: f32,
        rng: SmallRng,
    ) -> Self {
        Self::line_following_with_timeout(line, priority, rng, LOOP_TIMEOUT)
    }

    /// [`Behaviour::line_following`] with a custom loop-avoidance timeout.
    pub fn line_following_with_timeout(
        line: Rc<RefCell<LineBoundarySensor>>,
        priority: f32,
        rng: SmallRng,
        loop_timeout: Duration,
    ) -> Self {
        let handle: SensorRef = line.clone();
        Self {
            name: "line_following",
            priority,
            active: false,
            match_degree: 0.0,
            motor_recommendation: None,
            halt_request: false,
            referenced: vec![handle],
            pool: Vec::new(),
            pooled_ids: Vec::new(),
            kind: Kind::LineFollowing(LineFollowing {
                line,
                loop_timeout,
                tracking_since: None,
                rng,
            }),
        }
    }

    /// Sensorless wandering.  Always active, fixed full confidence, random
    /// small movements.
    pub fn explore(priority: f32, rng: SmallRng) -> Self {
        Self {
            name: "explore",
            priority,
            active: false,
            match_degree: 1.0,
            motor_recommendation: None,
            halt_request: false,
            referenced: Vec::new(),
            pool: Vec::new(),
            pooled_ids: Vec::new(),
            kind: Kind::Explore(Explore { rng }),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Self-assessed confidence, meaningful only while active.
    pub fn match_degree(&self) -> f32 {
        self.match_degree
    }

    /// Arbitration weight: match degree × priority.
    pub fn weight(&self) -> f32 {
        self.match_degree * self.priority
    }

    pub fn motor_recommendation(&self) -> Option<&MotorCommand> {
        self.motor_recommendation.as_ref()
    }

    pub fn halt_requested(&self) -> bool {
        self.halt_request
    }

    /// Sensors this behaviour currently references.
    pub fn referenced_sensors(&self) -> &[SensorRef] {
        &self.referenced
    }

    /// `true` if a currently-referenced sensor carries `id`.
    pub fn references_sensor(&self, id: &str) -> bool {
        self.referenced.iter().any(|s| s.borrow().id() == id)
    }

    // ── State machine ─────────────────────────────────────────────────────

    /// Evaluate the activation or deactivation predicate for this tick.
    ///
    /// # Errors
    ///
    /// Propagates sensor hardware faults from predicate reads.
    pub fn update_activity(&mut self) -> Result<Transition, RoamError> {
        if self.active {
            if self.should_deactivate()? {
                self.active = false;
                return Ok(Transition::Deactivated(self.release_pooled()));
            }
        } else if self.should_activate()? {
            self.active = true;
            let moved: Vec<SensorRef> = self.pool.drain(..).collect();
            self.referenced.extend(moved.iter().map(Rc::clone));
            return Ok(Transition::Activated(moved));
        }
        Ok(Transition::None)
    }

    /// Compute this tick's match degree, recommendation, and halt request.
    /// Call only while active, after the sensor-update phase.
    ///
    /// # Errors
    ///
    /// Propagates sensor hardware faults.
    pub fn sense_and_act(&mut self) -> Result<(), RoamError> {
        let outcome = match &mut self.kind {
            Kind::CrashPrevention(k) => k.sense()?,
            Kind::GoalSeeking(k) => k.sense()?,
            Kind::LineFollowing(k) => k.sense()?,
            Kind::Explore(k) => k.sense(),
        };
        self.match_degree = outcome.match_degree;
        if let Some(command) = outcome.recommendation {
            self.motor_recommendation = Some(command);
        }
        self.halt_request = self.halt_request || outcome.halt;
        Ok(())
    }

    fn should_activate(&mut self) -> Result<bool, RoamError> {
        match &mut self.kind {
            // Collision safety and wandering are wanted from the first tick.
            Kind::CrashPrevention(_) | Kind::Explore(_) => Ok(true),
            Kind::GoalSeeking(k) => {
                let mut proximity = k.proximity.borrow_mut();
                proximity.update()?;
                Ok(matches!(proximity.distance(), Some(d) if d < k.trigger))
            }
            Kind::LineFollowing(k) => {
                let mut line = k.line.borrow_mut();
                line.update()?;
                Ok(line.boundary().is_some())
            }
        }
    }

    fn should_deactivate(&mut self) -> Result<bool, RoamError> {
        match &mut self.kind {
            Kind::CrashPrevention(_) | Kind::Explore(_) | Kind::LineFollowing(_) => Ok(false),
            Kind::GoalSeeking(k) => {
                let mut proximity = k.proximity.borrow_mut();
                proximity.update()?;
                Ok(matches!(proximity.distance(), Some(d) if d > k.trigger))
            }
        }
    }

    /// Move the pooled sensors out of the referenced list, returning clones
    /// of the released handles.
    fn release_pooled(&mut self) -> Vec<SensorRef> {
        let mut released = Vec::new();
        let pooled_ids = &self.pooled_ids;
        self.referenced.retain(|s| {
            let pooled = pooled_ids.iter().any(|id| *id == s.borrow().id());
            if pooled {
                released.push(Rc::clone(s));
            }
            !pooled
        });
        self.pool.extend(released.iter().map(Rc::clone));
        released
    }

    /// Test-only behaviour with a fixed verdict, for arbitration tests.
    #[cfg(test)]
    pub(crate) fn scripted(
        name: &'static str,
        priority: f32,
        match_degree: f32,
        recommendation: Option<MotorCommand>,
        halt_request: bool,
    ) -> Self {
        use rand::SeedableRng;
        Self {
            name,
            priority,
            active: true,
            match_degree,
            motor_recommendation: recommendation,
            halt_request,
            referenced: Vec::new(),
            pool: Vec::new(),
            pooled_ids: Vec::new(),
            kind: Kind::Explore(Explore {
                rng: SmallRng::seed_from_u64(0),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Concrete variants
// ─────────────────────────────────────────────────────────────────────────────

/// How long one-directional line tracking may persist before a lateral nudge
/// breaks the potential loop.
const LOOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Speed of the loop-breaking lateral nudge.
const NUDGE_SPEED: f32 = 0.6;

/// Pivot angle when the line spans the whole bank (lost straight ahead).
const EDGE_PIVOT_DEGREES: f32 = 90.0;

/// Degrees of pivot per element of edge asymmetry.
const STEER_GAIN: f32 = 5.0;

/// Straight-ahead speed while centered on the line.
const CENTER_SPEED: f32 = 0.3;

enum Kind {
    CrashPrevention(CrashPrevention),
    GoalSeeking(GoalSeeking),
    LineFollowing(LineFollowing),
    Explore(Explore),
}

struct CrashPrevention {
    proximity: Rc<RefCell<ProximitySensor>>,
    /// Beyond this distance (cm) the behaviour reports zero confidence.
    far: f32,
    /// At or inside this distance (cm) the behaviour reports full confidence.
    close: f32,
    rng: SmallRng,
}

impl CrashPrevention {
    fn sense(&mut self) -> Result<SenseOutcome, RoamError> {
        let Some(dist) = self.proximity.borrow().distance() else {
            return Ok(SenseOutcome {
                match_degree: 0.0,
                recommendation: None,
                halt: false,
            });
        };
        let match_degree = if dist <= self.close {
            1.0
        } else if dist >= self.far {
            0.0
        } else {
            ((self.far - dist) / self.far * 2.0).min(1.0)
        };
        // Always propose the escape turn; weight decides whether it matters.
        let direction = random_turn(&mut self.rng);
        Ok(SenseOutcome {
            match_degree,
            recommendation: Some(MotorCommand::Pivot {
                direction,
                angle_degrees: 90.0,
            }),
            halt: false,
        })
    }
}

struct GoalSeeking {
    proximity: Rc<RefCell<ProximitySensor>>,
    color: Rc<RefCell<ColorZoneSensor>>,
    /// Activation/deactivation threshold distance (cm), hysteresis-free.
    trigger: f32,
    /// Distance (cm) at which a confirmed goal requests a halt.
    goal: f32,
    /// Minimum zone ratio for the goal to count as visible at all.
    zone_threshold: f32,
    /// Middle-zone ratio confirming the goal is dead ahead.
    goal_threshold: f32,
    /// How much a side zone must exceed the middle zone to steer that way.
    side_margin: f32,
}

impl GoalSeeking {
    fn sense(&mut self) -> Result<SenseOutcome, RoamError> {
        let dist = self.proximity.borrow().distance();
        let zones = self.color.borrow().zones();
        let (Some(dist), Some(zones)) = (dist, zones) else {
            return Ok(SenseOutcome {
                match_degree: 0.0,
                recommendation: None,
                halt: false,
            });
        };

        if zones.max() < self.zone_threshold {
            // No visible goal anywhere in the frame.
            return Ok(SenseOutcome {
                match_degree: 0.0,
                recommendation: None,
                halt: false,
            });
        }

        if dist <= self.goal && zones.middle >= self.goal_threshold {
            // Goal reached: request the halt, emit no steering.
            return Ok(SenseOutcome {
                match_degree: zones.middle,
                recommendation: None,
                halt: true,
            });
        }

        let outcome = if zones.left - zones.middle > self.side_margin {
            SenseOutcome {
                match_degree: zones.left,
                recommendation: Some(MotorCommand::Pivot {
                    direction: TurnDirection::Left,
                    angle_degrees: 10.0 * (dist / self.trigger),
                }),
                halt: false,
            }
        } else if zones.right - zones.middle > self.side_margin {
            SenseOutcome {
                match_degree: zones.right,
                recommendation: Some(MotorCommand::Pivot {
                    direction: TurnDirection::Right,
                    angle_degrees: 10.0 * (dist / self.trigger),
                }),
                halt: false,
            }
        } else {
            SenseOutcome {
                match_degree: zones.middle,
                recommendation: Some(MotorCommand::Drive {
                    direction: DriveDirection::Forward,
                    speed: 0.5 - (dist / self.trigger) / 4.0,
                }),
                halt: false,
            }
        };
        Ok(outcome)
    }
}

struct LineFollowing {
    line: Rc<RefCell<LineBoundarySensor>>,
    loop_timeout: Duration,
    /// When continuous boundary tracking began; cleared when the line is
    /// lost.
    tracking_since: Option<Instant>,
    rng: SmallRng,
}

impl LineFollowing {
    fn sense(&mut self) -> Result<SenseOutcome, RoamError> {
        let line = self.line.borrow();
        let Some(boundary) = line.boundary() else {
            drop(line);
            self.tracking_since = None;
            return Ok(SenseOutcome {
                match_degree: 0.0,
                recommendation: None,
                halt: false,
            });
        };
        let channels = line.channel_count();
        drop(line);

        let right_margin = channels - 1 - boundary.last;

        if let Some(started) = self.tracking_since {
            if started.elapsed() > self.loop_timeout {
                // Tracked one way for too long; nudge sideways to break a
                // potential circuit.
                let direction = if boundary.first > right_margin {
                    TurnDirection::Left
                } else {
                    TurnDirection::Right
                };
                return Ok(SenseOutcome {
                    match_degree: 1.0,
                    recommendation: Some(MotorCommand::SpinTurn {
                        direction,
                        drive: DriveDirection::Forward,
                        speed: NUDGE_SPEED,
                    }),
                    halt: false,
                });
            }
        } else {
            self.tracking_since = Some(Instant::now());
        }

        let recommendation = if boundary.first == 0 && boundary.last == channels - 1 {
            // Both edges triggered: the line is lost straight ahead.
            MotorCommand::Pivot {
                direction: random_turn(&mut self.rng),
                angle_degrees: EDGE_PIVOT_DEGREES,
            }
        } else if boundary.first > right_margin {
            MotorCommand::Pivot {
                direction: TurnDirection::Left,
                angle_degrees: STEER_GAIN * (boundary.first - right_margin) as f32,
            }
        } else if right_margin > boundary.first {
            MotorCommand::Pivot {
                direction: TurnDirection::Right,
                angle_degrees: STEER_GAIN * (right_margin - boundary.first) as f32,
            }
        } else {
            MotorCommand::Drive {
                direction: DriveDirection::Forward,
                speed: CENTER_SPEED,
            }
        };

        Ok(SenseOutcome {
            match_degree: 1.0,
            recommendation: Some(recommendation),
            halt: false,
        })
    }
}

struct Explore {
    rng: SmallRng,
}

impl Explore {
    fn sense(&mut self) -> SenseOutcome {
        let recommendation = match self.rng.gen_range(0..3) {
            0 => MotorCommand::Pivot {
                direction: random_turn(&mut self.rng),
                angle_degrees: self.rng.gen_range(1..=90) as f32,
            },
            1 => MotorCommand::SpinTurn {
                direction: random_turn(&mut self.rng),
                drive: random_drive(&mut self.rng),
                speed: 0.5,
            },
            _ => MotorCommand::Drive {
                direction: random_drive(&mut self.rng),
                speed: 0.5,
            },
        };
        SenseOutcome {
            match_degree: 1.0,
            recommendation: Some(recommendation),
            halt: false,
        }
    }
}

fn random_turn(rng: &mut SmallRng) -> TurnDirection {
    if rng.gen_range(0..2) == 0 {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    }
}

fn random_drive(rng: &mut SmallRng) -> DriveDirection {
    if rng.gen_range(0..2) == 0 {
        DriveDirection::Forward
    } else {
        DriveDirection::Backward
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

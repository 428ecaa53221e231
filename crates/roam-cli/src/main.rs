//! `roam-cli` – behaviour-based robot controller entry point.
//!
//! This binary is the ignition switch for the roam stack.  It:
//!
//! 1. Initialises structured logging (`RUST_LOG`, `ROAM_LOG_FORMAT=json`).
//! 2. Loads `~/.roam/config.toml`, writing defaults on first run.
//! 3. Installs a **Ctrl-C** handler that folds the interrupt into the
//!    controller's monotonic halt, so the loop still finishes with its
//!    single stop dispatch.
//! 4. Waits on the start gate, then drives the control loop over the
//!    simulated rig (real hardware drivers implement the `roam-hal` traits
//!    out of tree and slot into the same assembly).

mod config;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tracing::{error, info, warn};

use roam_control::{Behaviour, Controller, behaviour_rng};
use roam_hal::adapter::MotorAdapter;
use roam_hal::button::StartGate;
use roam_hal::camera::CameraFrame;
use roam_hal::reflectance::REFLECTANCE_CHANNELS;
use roam_hal::sim::{SimCamera, SimMotors, SimRangeFinder, SimReflectanceArray};
use roam_perception::color::ColorZoneSensor;
use roam_perception::line::LineBoundarySensor;
use roam_perception::proximity::ProximitySensor;
use roam_types::RoamError;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set ROAM_LOG_FORMAT=json to emit newline-delimited JSON logs suitable
    // for log aggregators.  User-facing output stays on println! for UX
    // consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ROAM_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // The flag is checked at the top of every tick; the loop then performs
    // its normal single stop dispatch and terminates.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – halting after the current tick …"
                .yellow()
                .bold()
        );
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; use the start gate terminal to stop");
    }

    if let Err(e) = run_robot(shutdown) {
        error!(error = %e, "fatal error");
        eprintln!("{}: {e}", "error".red().bold());
        std::process::exit(1);
    }
}

fn print_banner() {
    println!();
    println!("  {}", "roam – behaviour-based robot controller".bold());
    println!("  winner-take-all arbitration · fixed-period control loop");
    println!();
}

fn run_robot(shutdown: Arc<AtomicBool>) -> Result<(), RoamError> {
    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load()? {
        Some(cfg) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        None => {
            let cfg = config::Config::default();
            config::save(&cfg)?;
            println!(
                "  No config found – wrote defaults to {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
    };
    info!(?cfg, "effective configuration");

    let mut controller = build_sim_controller(&cfg)?.with_shutdown_flag(shutdown);

    // ── Start gate ────────────────────────────────────────────────────────
    let mut gate = ConsoleGate;
    gate.wait_for_start()?;

    // ── Control loop ──────────────────────────────────────────────────────
    let summary = if cfg.max_ticks > 0 {
        controller.run_ticks(cfg.max_ticks)?.pop()
    } else {
        Some(controller.run()?)
    };

    if let Some(summary) = summary {
        let status = if summary.halted {
            "halted".green().bold()
        } else {
            "tick limit reached".yellow().bold()
        };
        println!();
        println!(
            "  Run finished after tick {} ({}), last winner: {}",
            summary.tick,
            status,
            summary.winner.as_deref().unwrap_or("-").bold()
        );
    }
    Ok(())
}

/// Assemble a controller over the scripted simulated rig: the robot follows
/// a drifting line while an obstacle closes in, then a green goal fills the
/// camera frame and the goal seeker halts the run.
fn build_sim_controller(cfg: &config::Config) -> Result<Controller, RoamError> {
    let range_script = vec![
        100.0, 80.0, 60.0, 40.0, 30.0, 25.0, 20.0, 15.0, 12.0, 9.0, 7.0, 5.0, 3.0, 1.5,
    ];
    let line_script = vec![
        span(2, 3),
        span(2, 3),
        span(3, 4),
        span(3, 4),
        span(4, 5),
        span(4, 5),
        [0.0; REFLECTANCE_CHANNELS],
    ];
    let camera_script = vec![
        CameraFrame::solid(32, 24, (0, 0, 0)),
        CameraFrame::solid(32, 24, (0, 0, 0)),
        CameraFrame::solid(32, 24, (30, 220, 30)),
    ];

    let proximity = Rc::new(RefCell::new(ProximitySensor::new(SimRangeFinder::new(
        "range_front",
        range_script,
    ))));
    let line = Rc::new(RefCell::new(LineBoundarySensor::new(
        SimReflectanceArray::new("reflectance_bank", line_script),
    )));
    // An unknown goal color is an unrecoverable misconfiguration and
    // surfaces here, before the loop ever starts.
    let color = Rc::new(RefCell::new(ColorZoneSensor::new(
        SimCamera::new("camera_front", camera_script),
        &cfg.goal_color,
    )?));

    let mut controller = Controller::new(Duration::from_millis(cfg.tick_period_ms));
    controller.add_motor(MotorAdapter::new(SimMotors::new("drive_base")));
    controller.add_behaviour(Behaviour::crash_prevention(
        Rc::clone(&proximity),
        cfg.crash_priority,
        behaviour_rng(cfg.seed, 0),
    ));
    controller.add_behaviour(Behaviour::goal_seeking(
        proximity,
        color,
        cfg.goal_priority,
    ));
    controller.add_behaviour(Behaviour::line_following(
        line,
        cfg.line_priority,
        behaviour_rng(cfg.seed, 2),
    ));
    controller.add_behaviour(Behaviour::explore(
        cfg.explore_priority,
        behaviour_rng(cfg.seed, 3),
    ));
    Ok(controller)
}

fn span(first: usize, last: usize) -> [f32; REFLECTANCE_CHANNELS] {
    let mut values = [0.0; REFLECTANCE_CHANNELS];
    for v in &mut values[first..=last] {
        *v = 0.9;
    }
    values
}

/// Console-backed start gate: the operator confirms the run with ENTER.
struct ConsoleGate;

impl StartGate for ConsoleGate {
    fn wait_for_start(&mut self) -> Result<(), RoamError> {
        println!(
            "  Place the robot and press {} to launch …",
            "ENTER".bold()
        );
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(|e| RoamError::HardwareFault {
                component: "start_gate".to_string(),
                details: e.to_string(),
            })?;
        Ok(())
    }
}

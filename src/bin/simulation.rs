//! Hot-Car Telemetry Simulation
//!
//! Drives the escalation pipeline tick by tick the way the in-vehicle
//! dashboard does, and tracks the caller-side timers the pipeline expects:
//! - outside temperature rising 0.5°F per 5 s tick from 80°F to a 95°F cap
//! - child MOVING once the temperature reaches the alert gate, STILL before
//! - unacknowledged time accumulated while an alert is open
//! - public tier posted once, then auto-acknowledged
//! - timers reset whenever the pipeline answers SAFE
//!
//! # Usage
//! ```bash
//! # In-process pipeline, rapid-response public tier, no real-time delay
//! ./simulation --ticks 60 --rapid-response --speed 0
//!
//! # Against a running service
//! ./simulation --url http://localhost:8080 --speed 1
//! ```

use clap::Parser;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use safetrack::config::defaults::{
    RAPID_RESPONSE_SOCIAL_THRESHOLD_SECS, SIMULATION_MAX_TEMP_F, SIMULATION_START_TEMP_F,
    SIMULATION_TEMP_STEP_F, SIMULATION_TICK_SECS,
};
use safetrack::config::SafetyConfig;
use safetrack::types::{telemetry_keys as keys, Channel, Gps};
use safetrack::{build_generator, EscalationPlan, Orchestrator, RawTelemetry, RiskState, StepContent};

/// Reference cities the simulated vehicle is parked in.
const CITIES: [(&str, f64, f64); 5] = [
    ("Los Angeles, CA", 34.0522, -118.2437),
    ("Houston, TX", 29.7604, -95.3698),
    ("New York, NY", 40.7128, -74.0060),
    ("Chicago, IL", 41.8781, -87.6298),
    ("Miami, FL", 25.7617, -80.1918),
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "safetrack-simulation")]
#[command(about = "Hot-car telemetry simulation for SafeTrack testing")]
#[command(version = "1.0")]
struct Args {
    /// Number of 5-second ticks to simulate
    #[arg(short, long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=10_000))]
    ticks: u32,

    /// Time compression factor (1 = real-time, 0 = no delay)
    #[arg(short, long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=1000))]
    speed: u32,

    /// POST to a running service instead of the in-process pipeline
    #[arg(long, value_name = "BASE_URL")]
    url: Option<String>,

    /// Config file for the in-process pipeline
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the 30 s rapid-response public tier threshold
    #[arg(long)]
    rapid_response: bool,

    /// Caregiver acknowledges the alert at this tick
    #[arg(long)]
    ack_at: Option<u32>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress mission log (only output tick records)
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Simulation State
// ============================================================================

/// What the dashboard would show after one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "message", rename_all = "snake_case")]
enum TickEvent {
    /// SAFE answer, timers reset
    Quiet,
    /// New caregiver-facing alert
    Alert(String),
    /// Public post issued (auto-acknowledged afterwards)
    SocialPost(String),
    /// Alert open but acknowledged or already escalated
    Watching,
}

struct VehicleSim {
    city: &'static str,
    gps: Gps,
    elapsed_secs: f64,
    temp_f: f64,
    seconds_still: f64,
    seconds_unacknowledged: f64,
    alert_gate_f: f64,
    acked: bool,
    social_posted: bool,

    // Statistics
    alerts_raised: u32,
    social_posts: u32,
}

impl VehicleSim {
    fn new(rng: &mut StdRng, alert_gate_f: f64) -> Self {
        let (city, lat, lon) = CITIES[rng.gen_range(0..CITIES.len())];
        let jitter = |rng: &mut StdRng| (rng.gen::<f64>() - 0.5) * 0.02;
        let round6 = |v: f64| (v * 1e6).round() / 1e6;
        let gps = Gps {
            lat: round6(lat + jitter(rng)),
            lon: round6(lon + jitter(rng)),
        };

        Self {
            city,
            gps,
            elapsed_secs: 0.0,
            temp_f: SIMULATION_START_TEMP_F,
            seconds_still: 0.0,
            seconds_unacknowledged: 0.0,
            alert_gate_f,
            acked: false,
            social_posted: false,
            alerts_raised: 0,
            social_posts: 0,
        }
    }

    fn child_is_moving(&self) -> bool {
        self.temp_f >= self.alert_gate_f
    }

    /// Advance one tick and produce the telemetry reading for it.
    fn advance(&mut self) -> RawTelemetry {
        self.elapsed_secs += SIMULATION_TICK_SECS;
        self.temp_f = (self.temp_f + SIMULATION_TEMP_STEP_F).min(SIMULATION_MAX_TEMP_F);
        self.seconds_still = if self.child_is_moving() {
            0.0
        } else {
            self.seconds_still + SIMULATION_TICK_SECS
        };

        let motion = if self.child_is_moving() { keys::MOVING } else { "STILL" };
        let mut reading = RawTelemetry::new();
        reading.insert(keys::BUCKLE_STATE.into(), keys::BUCKLED.into());
        reading.insert(keys::MOTION_STATE.into(), motion.into());
        reading.insert(keys::OUTSIDE_TEMP_F.into(), self.temp_f.into());
        reading.insert(keys::SECONDS_STILL.into(), self.seconds_still.into());
        reading.insert(keys::SECONDS_UNACKNOWLEDGED.into(), self.seconds_unacknowledged.into());
        reading.insert(
            keys::GPS.into(),
            serde_json::json!({ "lat": self.gps.lat, "lon": self.gps.lon }),
        );
        reading.insert("seat_presence".into(), true.into());
        reading.insert("vehicle_moving".into(), false.into());
        reading.insert("t_buckled".into(), self.elapsed_secs.into());
        reading
    }

    /// Caregiver pressed acknowledge.
    fn acknowledge(&mut self) {
        self.acked = true;
        self.seconds_unacknowledged = 0.0;
    }

    /// Update caller-side timers from the pipeline's answer.
    fn observe(&mut self, plan: &EscalationPlan) -> TickEvent {
        if plan.state == RiskState::Safe {
            self.seconds_unacknowledged = 0.0;
            self.social_posted = false;
            self.acked = false;
            return TickEvent::Quiet;
        }

        let social = plan.steps.iter().find_map(|s| match (&s.channel, &s.content) {
            (Channel::Social, StepContent::Post { post }) if s.tier == 3 => Some(post.clone()),
            _ => None,
        });
        if let Some(post) = social {
            if !self.social_posted {
                self.social_posted = true;
                self.acked = true;
                self.social_posts += 1;
                return TickEvent::SocialPost(post);
            }
        }

        let event = if !self.acked && !self.social_posted {
            self.alerts_raised += 1;
            TickEvent::Alert(alert_message(plan))
        } else {
            TickEvent::Watching
        };

        if self.acked {
            self.seconds_unacknowledged = 0.0;
        } else {
            self.seconds_unacknowledged += SIMULATION_TICK_SECS;
        }
        event
    }
}

/// Dashboard text for a caregiver alert: "title: body" from tier 1.
fn alert_message(plan: &EscalationPlan) -> String {
    match plan.steps.first().map(|s| &s.content) {
        Some(StepContent::Notification(note)) => format!("{}: {}", note.title, note.body),
        _ => format!("{}: Check vehicle immediately", plan.state),
    }
}

// ============================================================================
// Pipeline access
// ============================================================================

enum Pipeline {
    InProcess(Orchestrator),
    Remote { http: reqwest::Client, url: String },
}

#[derive(Deserialize)]
struct RemoteResponse {
    plan: EscalationPlan,
}

impl Pipeline {
    async fn run(&self, telemetry: RawTelemetry, acked: bool) -> Result<EscalationPlan, Box<dyn std::error::Error>> {
        match self {
            Pipeline::InProcess(orchestrator) => Ok(orchestrator.run(telemetry, acked).await?.plan),
            Pipeline::Remote { http, url } => {
                let resp = http
                    .post(url)
                    .json(&serde_json::json!({ "telemetry": telemetry, "acked": acked }))
                    .send()
                    .await?;
                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(format!("Agent API error {status}: {body}").into());
                }
                Ok(resp.json::<RemoteResponse>().await?.plan)
            }
        }
    }
}

#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u32,
    elapsed_secs: f64,
    outside_temp_f: f64,
    motion_state: &'static str,
    seconds_still: f64,
    seconds_unacknowledged: f64,
    acked: bool,
    state: RiskState,
    tiers: Vec<u8>,
    #[serde(flatten)]
    event: &'a TickEvent,
}

// ============================================================================
// Mission Log
// ============================================================================

fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", minutes, secs)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => SafetyConfig::load_from_file(path)?,
        None => SafetyConfig::load(),
    };
    if args.rapid_response {
        config.escalation.social_threshold_secs = RAPID_RESPONSE_SOCIAL_THRESHOLD_SECS;
    }

    let pipeline = match &args.url {
        Some(base) => Pipeline::Remote {
            http: reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?,
            url: format!("{}/orchestrate", base.trim_end_matches('/')),
        },
        None => Pipeline::InProcess(Orchestrator::new(
            &config,
            build_generator(&config.generator),
        )),
    };

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut sim = VehicleSim::new(&mut rng, config.risk.temperature_threshold_f);
    let tick_interval = if args.speed == 0 {
        None
    } else {
        Some(Duration::from_secs_f64(SIMULATION_TICK_SECS / args.speed as f64))
    };

    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "SAFETRACK HOT-CAR SIMULATION", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, &format!("  Location: {} ({}, {})", sim.city, sim.gps.lat, sim.gps.lon), args.quiet);
    log_mission(0.0, &format!("  Temperature: {:.1}°F rising {:.1}°F per tick to {:.0}°F", SIMULATION_START_TEMP_F, SIMULATION_TEMP_STEP_F, SIMULATION_MAX_TEMP_F), args.quiet);
    log_mission(0.0, &format!("  Alert gate: {:.0}°F", config.risk.temperature_threshold_f), args.quiet);
    match &args.url {
        Some(url) => log_mission(0.0, &format!("  Pipeline: remote {}", url), args.quiet),
        None => log_mission(0.0, &format!("  Pipeline: in-process, public tier after {}s", config.escalation.social_threshold_secs), args.quiet),
    }
    log_mission(0.0, &format!("  Ticks: {} x {}s", args.ticks, SIMULATION_TICK_SECS), args.quiet);
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0.0, &"=".repeat(70), args.quiet);

    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    for tick in 1..=args.ticks {
        if args.ack_at == Some(tick) {
            log_mission(sim.elapsed_secs, ">>> Caregiver acknowledged", args.quiet);
            sim.acknowledge();
        }

        let telemetry = sim.advance();
        let plan = match pipeline.run(telemetry, sim.acked).await {
            Ok(plan) => plan,
            Err(e) => {
                log_mission(sim.elapsed_secs, &format!("Pipeline error: {e}"), args.quiet);
                continue;
            }
        };
        let unacked_sent = sim.seconds_unacknowledged;
        let event = sim.observe(&plan);

        match &event {
            TickEvent::Alert(msg) => log_mission(sim.elapsed_secs, &format!("{} {}", plan.state, msg), args.quiet),
            TickEvent::SocialPost(post) => log_mission(sim.elapsed_secs, &format!(">>> PUBLIC TIER: {post}"), args.quiet),
            TickEvent::Quiet | TickEvent::Watching => {}
        }

        let record = TickRecord {
            tick,
            elapsed_secs: sim.elapsed_secs,
            outside_temp_f: sim.temp_f,
            motion_state: if sim.child_is_moving() { "MOVING" } else { "STILL" },
            seconds_still: sim.seconds_still,
            seconds_unacknowledged: unacked_sent,
            acked: sim.acked,
            state: plan.state,
            tiers: plan.tiers(),
            event: &event,
        };
        writeln!(stdout_lock, "{}", serde_json::to_string(&record)?)?;
        stdout_lock.flush()?;

        if let Some(interval) = tick_interval {
            tokio::time::sleep(interval).await;
        }
    }

    log_mission(sim.elapsed_secs, &"=".repeat(70), args.quiet);
    log_mission(sim.elapsed_secs, "SIMULATION COMPLETE", args.quiet);
    log_mission(sim.elapsed_secs, &format!("Alerts raised: {}", sim.alerts_raised), args.quiet);
    log_mission(sim.elapsed_secs, &format!("Public posts: {}", sim.social_posts), args.quiet);
    log_mission(sim.elapsed_secs, &"=".repeat(70), args.quiet);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetrack::llm::DisabledGenerator;
    use std::sync::Arc;

    fn sim() -> VehicleSim {
        VehicleSim::new(&mut StdRng::seed_from_u64(7), 85.0)
    }

    #[test]
    fn test_temperature_ramp_and_motion() {
        let mut s = sim();
        for _ in 0..9 {
            s.advance();
        }
        assert_eq!(s.temp_f, 84.5);
        assert!(!s.child_is_moving());
        assert_eq!(s.seconds_still, 45.0);

        let reading = s.advance();
        assert_eq!(reading[keys::MOTION_STATE], "MOVING");
        assert_eq!(s.seconds_still, 0.0);

        for _ in 0..100 {
            s.advance();
        }
        assert_eq!(s.temp_f, SIMULATION_MAX_TEMP_F);
    }

    #[test]
    fn test_gps_near_a_reference_city() {
        let s = sim();
        assert!(CITIES
            .iter()
            .any(|(_, lat, lon)| (s.gps.lat - lat).abs() <= 0.01 && (s.gps.lon - lon).abs() <= 0.01));
    }

    #[tokio::test]
    async fn test_rapid_response_run_posts_once() {
        let mut config = SafetyConfig::default();
        config.escalation.social_threshold_secs = RAPID_RESPONSE_SOCIAL_THRESHOLD_SECS;
        let orchestrator = Orchestrator::new(&config, Arc::new(DisabledGenerator::new("test")));

        let mut s = sim();
        let mut events = Vec::new();
        for _ in 0..30 {
            let telemetry = s.advance();
            let plan = orchestrator.run(telemetry, s.acked).await.unwrap().plan;
            events.push(s.observe(&plan));
        }

        let alerts = events.iter().filter(|e| matches!(e, TickEvent::Alert(_))).count();
        let posts = events.iter().filter(|e| matches!(e, TickEvent::SocialPost(_))).count();
        // Alerts from 85°F while unacknowledged time is 0-25s, then the post at 30s.
        assert_eq!(alerts, 6);
        assert_eq!(posts, 1);
        assert!(s.acked);
        assert!(matches!(events.last(), Some(TickEvent::Watching)));
    }

    #[test]
    fn test_safe_answer_resets_timers() {
        let mut s = sim();
        s.seconds_unacknowledged = 25.0;
        s.acked = true;
        s.social_posted = true;
        assert_eq!(s.observe(&EscalationPlan::quiet(RiskState::Safe)), TickEvent::Quiet);
        assert_eq!(s.seconds_unacknowledged, 0.0);
        assert!(!s.acked);
        assert!(!s.social_posted);
    }
}

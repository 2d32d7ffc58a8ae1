use std::time::{Duration, Instant};

use anyhow::Context;
use dynamics::Pose;
use log::{info, warn};
use sitl::{ControllerLink, Mode, RemotePilot, Simulation, SitlConfig};

enum State {
    Initializing,
    Connecting,
    Running,
    Stopping,
}

// Telemetry silence after which the remote dynamics is considered gone
const LINK_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SitlConfig::from_args()?;
    info!("Starting SITL in {:?} mode", config.mode);

    match config.mode {
        Mode::Local => run_local(&config),
        Mode::Remote => run_remote(&config),
    }
}

fn pace(last_update_time: &mut Instant, period: Duration, realtime: bool) {
    if realtime {
        let elapsed = last_update_time.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }
    }
    *last_update_time = Instant::now();
}

fn run_local(config: &SitlConfig) -> anyhow::Result<()> {
    let mut sim = Simulation::new(config)?;
    let period = Duration::from_secs_f64(config.dt);
    let mut last_update_time = Instant::now();

    loop {
        if config.ticks().is_some_and(|ticks| sim.ticks() >= ticks) {
            break;
        }

        match sim.step() {
            Ok(telemetry) => {
                if config.log_every > 0 && sim.ticks() % config.log_every == 0 {
                    let motors = sim.motors();
                    info!(
                        "t={:.3} alt={:.2} rpy=({:.3}, {:.3}, {:.3}) motors=[{:.3}, {:.3}, {:.3}, {:.3}]",
                        telemetry.time,
                        telemetry.altitude(),
                        telemetry.rotation[0],
                        telemetry.rotation[1],
                        telemetry.rotation[2],
                        motors[0],
                        motors[1],
                        motors[2],
                        motors[3],
                    );
                }
            }
            Err(e) => {
                warn!("{e}, resetting vehicle");
                sim.reset(Pose::origin());
            }
        }

        pace(&mut last_update_time, period, config.realtime);
    }

    info!("Finished after {:.3} s", sim.time());
    Ok(())
}

fn run_remote(config: &SitlConfig) -> anyhow::Result<()> {
    let period = Duration::from_secs_f64(config.dt);
    let mut state = State::Initializing;
    let mut pilot = None;
    let mut last_update_time = Instant::now();
    let mut last_telemetry_time = Instant::now();
    let mut update_cycle_count: u64 = 0;

    loop {
        match state {
            State::Initializing => {
                let link = ControllerLink::connect(&config.link).context("Failed to open controller link")?;
                pilot = Some(RemotePilot::new(config, link)?);
                info!(
                    "Sending motors to {}:{}, waiting for telemetry on port {}",
                    config.link.host, config.link.motor_port, config.link.telemetry_port
                );
                state = State::Connecting;
            }
            State::Connecting => {
                let Some(pilot) = pilot.as_mut() else {
                    state = State::Initializing;
                    continue;
                };
                if pilot.tick().is_some() {
                    info!("Connected to dynamics");
                    last_telemetry_time = Instant::now();
                    state = State::Running;
                } else {
                    pace(&mut last_update_time, Duration::from_millis(10), true);
                }
            }
            State::Running => {
                let Some(pilot) = pilot.as_mut() else {
                    state = State::Initializing;
                    continue;
                };
                if pilot.tick().is_some() {
                    last_telemetry_time = Instant::now();
                    update_cycle_count += 1;
                    if config.log_every > 0 && update_cycle_count % config.log_every == 0 {
                        let sensed = pilot.manager().state();
                        info!(
                            "alt={:.2} rpy=({:.3}, {:.3}, {:.3}) motors={:?}",
                            sensed.altitude,
                            sensed.roll,
                            sensed.pitch,
                            sensed.yaw,
                            pilot.manager().motors()
                        );
                    }
                } else if last_telemetry_time.elapsed() > LINK_TIMEOUT {
                    warn!("Telemetry stopped, waiting for dynamics");
                    state = State::Connecting;
                }

                if config.ticks().is_some_and(|ticks| update_cycle_count >= ticks) {
                    state = State::Stopping;
                }
                pace(&mut last_update_time, period, true);
            }
            State::Stopping => {
                info!("Stopping after {update_cycle_count} control cycles");
                if let Some(mut pilot) = pilot.take() {
                    pilot.link_mut().stop();
                }
                break;
            }
        }
    }
    Ok(())
}

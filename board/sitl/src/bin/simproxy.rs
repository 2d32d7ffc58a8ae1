use std::time::{Duration, Instant};

use anyhow::Context;
use dynamics::{Frame, MultirotorDynamics, Pose};
use log::{info, warn};
use sitl::{DynamicsLink, SitlConfig, Telemetry};

/// Dynamics process for a remote controller: steps a quad X at a fixed rate
/// on the latest motor command and sends telemetry back after every step.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SitlConfig::from_args()?;
    let link = DynamicsLink::<4>::bind(&config.link).context("Failed to open proxy sockets")?;
    info!(
        "Motors on port {}, telemetry to {}:{}",
        config.link.motor_port, config.link.host, config.link.telemetry_port
    );

    let mut quad = MultirotorDynamics::new(config.vehicle, Frame::quad_xap());
    quad.init(Pose::origin());

    let period = Duration::from_secs_f64(config.dt);
    let mut last_update_time = Instant::now();
    let mut time = 0.0;
    let mut count: u64 = 0;

    loop {
        // Idle motors until the controller speaks
        let motors = link.latest_motors().unwrap_or([0.0; 4]);
        quad.set_motors(&motors);

        match quad.update(config.dt) {
            Ok(()) => time += config.dt,
            Err(e) => {
                warn!("{e}, resetting vehicle");
                quad.init(Pose::origin());
                time = 0.0;
            }
        }
        link.publish(Telemetry::from_state(time, &quad.state()));

        if config.log_every > 0 && count % config.log_every == 0 {
            info!(
                "{:06}: {:.6} {:.6} {:.6} {:.6}",
                count, motors[0], motors[1], motors[2], motors[3]
            );
        }
        count += 1;

        let elapsed = last_update_time.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }
        last_update_time = Instant::now();
    }
}

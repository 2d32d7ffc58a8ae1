use autopilot::{FlightManager, Mixer, PIDError, VehicleState};
use dynamics::{DynamicsError, Frame, MultirotorDynamics, Pose, State};
use log::debug;

use crate::board::SitlBoard;
use crate::config::SitlConfig;
use crate::input::{FeedHandle, HostFeed, StickScript};
use crate::link::ControllerLink;
use crate::packet::Telemetry;

fn flight_manager(config: &SitlConfig) -> Result<(FlightManager<HostFeed, 4>, FeedHandle), PIDError> {
    let cascade = config.tuning.cascade()?;
    let (input, feed) = HostFeed::new(Some(StickScript::product_id()));
    let board = SitlBoard::new(input, config.gyrometer);
    Ok((FlightManager::new(board, cascade, Mixer::quad_xap()), feed))
}

/// Closed loop in one process: scripted sticks, flight manager and a quad X
/// dynamics model stepped in lockstep
pub struct Simulation {
    dynamics: MultirotorDynamics<4>,
    manager: FlightManager<HostFeed, 4>,
    feed: FeedHandle,
    script: StickScript,
    dt: f64,
    time: f64,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: &SitlConfig) -> Result<Self, PIDError> {
        let mut dynamics = MultirotorDynamics::new(config.vehicle, Frame::quad_xap());
        dynamics.init(Pose::origin());
        let (manager, feed) = flight_manager(config)?;

        Ok(Simulation {
            dynamics,
            manager,
            feed,
            script: StickScript::new(config.script.clone()),
            dt: config.dt,
            time: 0.0,
            ticks: 0,
        })
    }

    /// Advance one tick. On divergence the vehicle keeps its previous state
    /// and the error is returned for the caller to decide on a reset.
    pub fn step(&mut self) -> Result<Telemetry, DynamicsError> {
        self.feed.push(self.script.sample(self.time));

        let truth = self.dynamics.state();
        let motors = self.manager.get_motors(self.time, &truth);
        self.dynamics.set_motors(&motors);
        self.dynamics.update(self.dt)?;

        self.time += self.dt;
        self.ticks += 1;
        Ok(Telemetry::from_state(self.time, &self.dynamics.state()))
    }

    /// Put the vehicle back at `pose` and restart the clock and controllers
    pub fn reset(&mut self, pose: Pose) {
        self.dynamics.init(pose);
        self.manager.reset();
        self.time = 0.0;
        self.ticks = 0;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> State {
        self.dynamics.state()
    }

    pub fn motors(&self) -> [f64; 4] {
        *self.dynamics.motors()
    }

    pub fn sensed(&self) -> &VehicleState {
        self.manager.state()
    }

    pub fn manager(&self) -> &FlightManager<HostFeed, 4> {
        &self.manager
    }

    pub fn feed(&self) -> &FeedHandle {
        &self.feed
    }
}

/// Controller flying a dynamics process on the other end of a [`ControllerLink`]
pub struct RemotePilot {
    link: ControllerLink<4>,
    manager: FlightManager<HostFeed, 4>,
    feed: FeedHandle,
    script: StickScript,
    last_time: Option<f64>,
}

impl RemotePilot {
    pub fn new(config: &SitlConfig, link: ControllerLink<4>) -> Result<Self, PIDError> {
        let (manager, feed) = flight_manager(config)?;
        Ok(RemotePilot {
            link,
            manager,
            feed,
            script: StickScript::new(config.script.clone()),
            last_time: None,
        })
    }

    /// Fly one control cycle on the latest telemetry.
    ///
    /// Returns `None` until telemetry arrives, and when nothing new has come
    /// in since the previous cycle.
    pub fn tick(&mut self) -> Option<[f64; 4]> {
        let telemetry = self.link.latest_telemetry()?;
        match self.last_time {
            Some(last) if telemetry.time == last => return None,
            // The dynamics process restarted
            Some(last) if telemetry.time < last => {
                debug!("Telemetry clock went backwards, resetting controller");
                self.manager.reset();
            }
            _ => {}
        }
        self.last_time = Some(telemetry.time);

        self.feed.push(self.script.sample(telemetry.time));
        let motors = self.manager.get_motors(telemetry.time, &telemetry.to_state());
        self.link.send_motors(motors);
        Some(motors)
    }

    pub fn manager(&self) -> &FlightManager<HostFeed, 4> {
        &self.manager
    }

    pub fn link_mut(&mut self) -> &mut ControllerLink<4> {
        &mut self.link
    }
}

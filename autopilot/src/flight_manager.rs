use dynamics::State;
use hal::{DeviceStatus, InputDevice};
use log::{info, warn};

use crate::{AuxState, Board, Demand, Mixer, PidCascade, Receiver, Sensor, VehicleState};

/// Runs the control loop once per simulation tick: receiver, sensors,
/// PID cascade and mixer, producing clamped motor commands.
pub struct FlightManager<D: InputDevice, const N: usize> {
    name: String,
    receiver: Receiver<D>,
    sensors: Vec<Box<dyn Sensor>>,
    cascade: PidCascade,
    mixer: Mixer<N>,

    state: VehicleState,
    demand: Demand,
    motors: [f64; N],
    last_time: Option<f64>,
    status: DeviceStatus,
}

impl<D: InputDevice, const N: usize> FlightManager<D, N> {
    pub fn new<B>(board: B, cascade: PidCascade, mixer: Mixer<N>) -> Self
    where
        B: Board<Input = D>,
    {
        let name = board.name().to_owned();
        let resources = board.split_resources();
        Self::with_receiver(name, Receiver::new(resources.input), resources.sensors, cascade, mixer)
    }

    pub fn with_receiver(
        name: String,
        mut receiver: Receiver<D>,
        sensors: Vec<Box<dyn Sensor>>,
        cascade: PidCascade,
        mixer: Mixer<N>,
    ) -> Self {
        let status = receiver.begin();
        if !status.is_ok() {
            warn!("{name}: input device not ready ({status:?})");
        }
        info!("{name}: flight manager started with {} sensors", sensors.len());

        FlightManager {
            name,
            receiver,
            sensors,
            cascade,
            mixer,
            state: VehicleState::default(),
            demand: Demand::default(),
            motors: [0.0; N],
            last_time: None,
            status,
        }
    }

    /// Compute motor commands in [0, 1] for simulation time `time`.
    ///
    /// `truth` is the dynamics state the sensors sample from. Never blocks.
    pub fn get_motors(&mut self, time: f64, truth: &State) -> [f64; N] {
        let status = self.receiver.update();
        if status != self.status {
            match status {
                DeviceStatus::Ok => info!("{}: input device ready", self.name),
                DeviceStatus::Missing => warn!("{}: no input device detected", self.name),
                DeviceStatus::UnrecognizedProduct => warn!("{}: input device not recognized", self.name),
            }
            self.status = status;
        }

        let dt = match self.last_time {
            Some(last) => (time - last).max(0.0),
            None => 0.0,
        };
        self.last_time = Some(time);

        for sensor in self.sensors.iter_mut() {
            if sensor.ready(truth, time) {
                sensor.modify_state(truth, &mut self.state, time);
            }
        }

        if !self.receiver.armed() {
            self.motors = [0.0; N];
            return self.motors;
        }

        self.demand = self
            .cascade
            .update(self.receiver.demands(), &self.state, self.receiver.aux1_state(), dt);
        self.motors = self.mixer.combine(&self.demand).map(|m| m.clamp(0.0, 1.0));
        self.motors
    }

    /// Forget controller history, for when the vehicle is re-initialized
    pub fn reset(&mut self) {
        self.cascade.reset();
        for sensor in self.sensors.iter_mut() {
            sensor.reset();
        }
        self.state = VehicleState::default();
        self.demand = Demand::default();
        self.motors = [0.0; N];
        self.last_time = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn aux_state(&self) -> AuxState {
        self.receiver.aux1_state()
    }

    /// Sensed state after the last tick
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Cascade output after the last tick
    pub fn demand(&self) -> Demand {
        self.demand
    }

    pub fn motors(&self) -> [f64; N] {
        self.motors
    }

    pub fn receiver_mut(&mut self) -> &mut Receiver<D> {
        &mut self.receiver
    }
}

use dynamics::{Pose, Quaternion, State, UnitQuaternion, Vector3};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PacketError {
    #[error("Datagram too short: got {actual} bytes, need {expected}")]
    TooShort { expected: usize, actual: usize },
}

/// A fixed layout of little-endian doubles carried in one UDP datagram
pub trait Datagram: Sized + Clone + Send + Sync + 'static {
    /// Encoded size in bytes
    const SIZE: usize;

    fn encode(&self) -> Vec<u8>;

    /// Decode the leading `SIZE` bytes; anything after them is ignored
    fn decode(bytes: &[u8]) -> Result<Self, PacketError>;
}

fn write_f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn read_f64s<const K: usize>(bytes: &[u8]) -> Result<[f64; K], PacketError> {
    let expected = K * 8;
    if bytes.len() < expected {
        return Err(PacketError::TooShort {
            expected,
            actual: bytes.len(),
        });
    }

    let mut values = [0.0; K];
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        *value = f64::from_le_bytes(raw);
    }
    Ok(values)
}

/// Motor commands from the controller to the dynamics, one double per motor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorPacket<const N: usize> {
    pub motors: [f64; N],
}

impl<const N: usize> MotorPacket<N> {
    pub fn new(motors: [f64; N]) -> Self {
        MotorPacket { motors }
    }
}

impl<const N: usize> Datagram for MotorPacket<N> {
    const SIZE: usize = N * 8;

    fn encode(&self) -> Vec<u8> {
        write_f64s(&self.motors)
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        Ok(MotorPacket::new(read_f64s::<N>(bytes)?))
    }
}

const TELEMETRY_DOUBLES: usize = 17;

/// Vehicle state sent from the dynamics to the controller
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub time: f64,
    pub angular_velocity: [f64; 3],
    /// w, x, y, z
    pub quaternion: [f64; 4],
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub inertial_velocity: [f64; 3],
}

impl Telemetry {
    pub fn from_state(time: f64, state: &State) -> Self {
        let q = state.quaternion.quaternion();
        Telemetry {
            time,
            angular_velocity: state.angular_velocity.into(),
            quaternion: [q.w, q.i, q.j, q.k],
            location: state.pose.location.into(),
            rotation: state.pose.rotation.into(),
            inertial_velocity: state.inertial_velocity.into(),
        }
    }

    /// Rebuild the dynamics state on the controller side.
    ///
    /// Orientation comes from the quaternion, which is authoritative over the
    /// Euler angles in the datagram. A zero quaternion reads as level.
    pub fn to_state(&self) -> State {
        let [w, x, y, z] = self.quaternion;
        let (roll, pitch, yaw) = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), f64::EPSILON)
            .unwrap_or_else(UnitQuaternion::identity)
            .euler_angles();
        let pose = Pose::new(Vector3::from(self.location), Vector3::new(roll, pitch, yaw));

        let mut state = State::from_parts(
            pose,
            Vector3::from(self.inertial_velocity),
            Vector3::from(self.angular_velocity),
        );
        state.airborne = state.altitude > 0.0;
        state
    }

    pub fn altitude(&self) -> f64 {
        -self.location[2]
    }
}

impl Datagram for Telemetry {
    const SIZE: usize = TELEMETRY_DOUBLES * 8;

    fn encode(&self) -> Vec<u8> {
        let mut values = Vec::with_capacity(TELEMETRY_DOUBLES);
        values.push(self.time);
        values.extend_from_slice(&self.angular_velocity);
        values.extend_from_slice(&self.quaternion);
        values.extend_from_slice(&self.location);
        values.extend_from_slice(&self.rotation);
        values.extend_from_slice(&self.inertial_velocity);
        write_f64s(&values)
    }

    fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        let v = read_f64s::<TELEMETRY_DOUBLES>(bytes)?;
        Ok(Telemetry {
            time: v[0],
            angular_velocity: [v[1], v[2], v[3]],
            quaternion: [v[4], v[5], v[6], v[7]],
            location: [v[8], v[9], v[10]],
            rotation: [v[11], v[12], v[13]],
            inertial_velocity: [v[14], v[15], v[16]],
        })
    }
}

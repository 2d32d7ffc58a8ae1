use hal::InputDevice;

use crate::Sensor;

pub trait Board
where
    Self: Sized,
{
    type Input: InputDevice;

    fn name(&self) -> &str;

    fn split_resources(self) -> Resources<Self::Input>;
}

pub struct Resources<D: InputDevice> {
    pub input: D,
    /// Applied in order; later sensors overwrite earlier ones
    pub sensors: Vec<Box<dyn Sensor>>,
}

/// Flight mode selected by the aux switch
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuxState {
    /// Rate stage only
    #[default]
    Rate = 0,
    /// Self-leveling
    Level = 1,
    /// Self-leveling with altitude hold
    AltitudeHold = 2,
}

impl AuxState {
    /// Classify a normalized aux channel value
    pub fn from_rawval(value: f64) -> Self {
        if value < 0.0 {
            AuxState::Rate
        } else if value < 0.4 {
            AuxState::Level
        } else {
            AuxState::AltitudeHold
        }
    }

    pub fn position(self) -> u8 {
        self as u8
    }
}

// Aux channel value emitted for each of the three button-selected positions
const BUTTONS_TO_AUX: [f64; 3] = [-0.1, 0.0, 0.8];

/// Emulates a three-position aux switch on a device that only has buttons.
///
/// The last recognized button press sticks until another one arrives.
#[derive(Debug, Clone)]
pub struct ButtonAux {
    button_map: [u8; 3],
    position: usize,
}

impl ButtonAux {
    pub fn new(button_map: [u8; 3]) -> Self {
        ButtonAux {
            button_map,
            position: 0,
        }
    }

    /// Feed the current button mask and return the aux channel value
    pub fn update(&mut self, buttons: u8) -> f64 {
        if let Some(position) = self.button_map.iter().position(|&mask| mask == buttons) {
            self.position = position;
        }
        BUTTONS_TO_AUX[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

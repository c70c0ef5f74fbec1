use serde::Deserialize;

const SPEED_OF_LIGHT: f64 = 299792458.0; // m/s

/// GNSS carrier bands used for reflectometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    #[default]
    L1,
    L2,
    L5,
}

impl Band {
    pub fn as_str(&self) -> &str {
        match self {
            Band::L1 => "L1",
            Band::L2 => "L2",
            Band::L5 => "L5",
        }
    }

    pub fn frequency_mhz(&self) -> f64 {
        match self {
            Band::L1 => 1575.42,
            Band::L2 => 1227.60,
            Band::L5 => 1176.45,
        }
    }

    pub fn wavelength_m(&self) -> f64 {
        wavelength_from_mhz(self.frequency_mhz())
    }
}

// λ = c / f
pub fn wavelength_from_mhz(frequency_mhz: f64) -> f64 {
    SPEED_OF_LIGHT / (frequency_mhz * 1_000_000.0)
}

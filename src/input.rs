use crate::errors::InputError;
use crate::simulation_time::SimulationTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use smartstring::alias::String as SmartString;
use std::io::{BufReader, Read};

pub type KeyString = SmartString;

pub fn ingest_for_processing(json: impl Read) -> Result<Input, anyhow::Error> {
    let reader = BufReader::new(json);

    let input: Input = serde_json::from_reader(reader)?;

    Ok(input)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    #[serde(default)]
    pub simulation_time: SimulationTime,
    #[serde(default)]
    pub config: SimulationConfig,
    pub buildings: IndexMap<KeyString, BuildingInput>,
}

/// Numeric tolerances and iteration limits of the hourly procedure.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Temperature band around a setpoint inside which there is no demand, in K
    #[validate(minimum = 0.)]
    pub demand_band: f64,
    /// Intensity of the probe power used by the demand interpolation, in W/m2
    #[validate(exclusive_minimum = 0.)]
    pub probe_power_intensity: f64,
    /// Smallest temperature response to the probe power treated as non-degenerate, in K
    #[validate(exclusive_minimum = 0.)]
    pub degenerate_threshold: f64,
    #[validate(exclusive_minimum = 0.)]
    pub coil_tolerance: f64,
    #[validate(minimum = 1)]
    pub coil_max_iter: usize,
    #[validate(exclusive_minimum = 0.)]
    pub airflow_tolerance: f64,
    #[validate(minimum = 1)]
    pub airflow_max_iter: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            demand_band: 0.001,
            probe_power_intensity: 10.,
            degenerate_threshold: 1e-9,
            coil_tolerance: 0.01,
            coil_max_iter: 100,
            airflow_tolerance: 0.001,
            airflow_max_iter: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingInput {
    pub properties: BuildingProperties,
    #[serde(default)]
    pub hvac: HvacProperties,
    #[serde(default)]
    pub comfort: ComfortProperties,
    pub natural_ventilation: Option<NaturalVentilationInput>,
    pub drivers: Vec<HourlyDrivers>,
}

impl BuildingInput {
    /// Check static properties against their physical ranges and the driver series against
    /// the simulated period.
    pub fn validate_for(
        &self,
        name: &str,
        simulation_time: &SimulationTime,
    ) -> Result<(), InputError> {
        self.properties.validate()?;
        self.hvac.validate()?;
        self.comfort.validate()?;
        if let Some(natural_ventilation) = &self.natural_ventilation {
            natural_ventilation.validate()?;
        }

        if self.drivers.is_empty() {
            return Err(InputError::NoDrivers {
                building: name.to_string(),
            });
        }
        let expected = simulation_time.total_steps();
        if self.drivers.len() != expected {
            return Err(InputError::DriverCountMismatch {
                expected,
                actual: self.drivers.len(),
            });
        }
        if self.comfort.rh_min >= self.comfort.rh_max {
            return Err(InputError::Inconsistent(format!(
                "Minimum relative humidity setpoint {} is not below maximum {}",
                self.comfort.rh_min, self.comfort.rh_max
            )));
        }
        if self.properties.area_mass >= self.properties.area_internal_surfaces {
            return Err(InputError::Inconsistent(
                "Effective mass area must be smaller than the total internal surface area"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Static thermal properties of a building, read-only for the whole run.
#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BuildingProperties {
    /// Conditioned floor area, in m2
    #[validate(exclusive_minimum = 0.)]
    pub floor_area: f64,
    /// Conditioned air volume, in m3
    #[validate(exclusive_minimum = 0.)]
    pub volume: f64,
    #[validate(minimum = 0.)]
    pub area_opaque_above_ground: f64,
    #[validate(minimum = 0.)]
    pub area_opaque_below_ground: f64,
    #[validate(minimum = 0.)]
    pub area_window: f64,
    #[validate(minimum = 0.)]
    pub area_roof: f64,
    /// U-values, in W/(m2.K)
    #[validate(minimum = 0.)]
    pub u_wall: f64,
    #[validate(minimum = 0.)]
    pub u_base: f64,
    #[validate(minimum = 0.)]
    pub u_roof: f64,
    #[validate(minimum = 0.)]
    pub u_window: f64,
    /// Effective mass area, in m2
    #[validate(exclusive_minimum = 0.)]
    pub area_mass: f64,
    /// Internal heat capacity, in J/K
    #[validate(exclusive_minimum = 0.)]
    pub heat_capacity: f64,
    /// Total area of internal surfaces facing the zone, in m2
    #[validate(exclusive_minimum = 0.)]
    pub area_internal_surfaces: f64,
    /// Installed heating capacity, in W per m2 of floor area
    #[validate(minimum = 0.)]
    pub heating_capacity: f64,
    /// Installed cooling capacity, in W per m2 of floor area (positive)
    #[validate(minimum = 0.)]
    pub cooling_capacity: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub window_to_wall_ratio: f64,
    pub heating: HeatingTopology,
    pub cooling: CoolingTopology,
}

impl BuildingProperties {
    pub fn heating_capacity_w(&self) -> f64 {
        self.heating_capacity * self.floor_area
    }

    /// Maximum cooling power, in W (negative)
    pub fn cooling_capacity_w(&self) -> f64 {
        -self.cooling_capacity * self.floor_area
    }
}

/// Emission system serving space heating. Exactly one per building.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum::Display)]
pub enum HeatingTopology {
    Radiator,
    FloorHeating,
    #[serde(rename = "CentralAC")]
    #[strum(serialize = "CentralAC")]
    CentralAc,
    None,
}

/// Emission system serving space cooling. Exactly one per building.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum::Display)]
pub enum CoolingTopology {
    #[serde(rename = "LocalAC")]
    #[strum(serialize = "LocalAC")]
    LocalAc,
    #[serde(rename = "CentralAC")]
    #[strum(serialize = "CentralAC")]
    CentralAc,
    ThreeForTwo,
    CeilingRadiative,
    None,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct HvacProperties {
    #[validate]
    pub ahu: AirUnitProperties,
    #[validate]
    pub aru: AirUnitProperties,
}

/// Supply temperatures and coil ratings of one air-based unit (AHU or ARU).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct AirUnitProperties {
    pub t_supply_heating: f64,
    pub t_supply_cooling: f64,
    #[validate]
    pub heating_coil: CoilRating,
    #[validate]
    pub cooling_coil: CoilRating,
}

impl Default for AirUnitProperties {
    fn default() -> Self {
        Self {
            t_supply_heating: 36.,
            t_supply_cooling: 16.,
            heating_coil: CoilRating::default_heating(),
            cooling_coil: CoilRating::default_cooling(),
        }
    }
}

/// Nominal design point of a water-to-air coil. The nominal air flow follows from the
/// installed capacity and the air temperature change at this point.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CoilRating {
    pub t_air_in: f64,
    pub t_air_out: f64,
    /// Apparatus (contact) temperature of the coil surface
    pub t_contact: f64,
    pub t_water_supply: f64,
    pub t_water_return: f64,
}

impl CoilRating {
    pub fn default_heating() -> Self {
        Self {
            t_air_in: 20.,
            t_air_out: 36.,
            t_contact: 45.,
            t_water_supply: 60.,
            t_water_return: 50.,
        }
    }

    pub fn default_cooling() -> Self {
        Self {
            t_air_in: 26.,
            t_air_out: 16.,
            t_contact: 13.,
            t_water_supply: 6.,
            t_water_return: 11.,
        }
    }
}

/// Indoor humidity comfort band, in % relative humidity.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ComfortProperties {
    #[validate(minimum = 0.)]
    #[validate(maximum = 100.)]
    pub rh_min: f64,
    #[validate(minimum = 0.)]
    #[validate(maximum = 100.)]
    pub rh_max: f64,
}

impl Default for ComfortProperties {
    fn default() -> Self {
        Self {
            rh_min: 30.,
            rh_max: 70.,
        }
    }
}

/// Geometry and air tightness needed to build the natural ventilation path network.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NaturalVentilationInput {
    /// Building height above ground, in m
    #[validate(exclusive_minimum = 0.)]
    pub height: f64,
    #[validate(minimum = 0.)]
    pub area_facade: f64,
    #[validate(minimum = 0.)]
    pub area_roof: f64,
    /// Air change rate at 50 Pa pressure difference, in 1/h
    #[validate(minimum = 0.)]
    pub n50: f64,
    /// Free area of operable ventilation openings, in cm2
    #[serde(default)]
    #[validate(minimum = 0.)]
    pub area_vent_openings: f64,
    #[serde(default)]
    pub shielding: ShieldingClass,
    /// Roof slope, in degrees
    #[serde(default)]
    #[validate(minimum = 0.)]
    #[validate(maximum = 90.)]
    pub roof_slope: f64,
    #[serde(default)]
    pub cross_ventilation: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldingClass {
    Open,
    #[default]
    Normal,
    Shielded,
}

/// One hour of exogenous drivers. Read-only.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HourlyDrivers {
    /// Outdoor air temperature, in deg C
    pub t_ext: f64,
    /// Outdoor relative humidity, in %
    pub rh_ext: f64,
    /// Wind speed at 10 m, in m/s
    #[serde(default)]
    pub wind_speed: f64,
    /// Solar gains through glazing, in W
    pub solar_gains: f64,
    /// Electricity for lighting, in W
    pub lighting: f64,
    /// Electricity for appliances, in W
    pub appliances: f64,
    #[serde(default)]
    pub data_centre_heat: f64,
    #[serde(default)]
    pub refrigeration_heat: f64,
    /// Sensible gains from occupants, in W
    pub people_sensible: f64,
    /// Moisture released in the zone, in kg/s
    #[serde(default)]
    pub moisture_gains: f64,
    /// Mechanical ventilation mass flow, in kg/s
    #[serde(default)]
    pub m_ve_mech: f64,
    /// Mechanical supply temperature after heat recovery, in deg C
    #[serde(default)]
    pub t_ve_mech: f64,
    /// Mechanical supply moisture content after heat recovery, in kg/kg
    #[serde(default)]
    pub x_ve_mech: f64,
    #[serde(default)]
    pub m_ve_window: f64,
    #[serde(default)]
    pub m_ve_inf: f64,
    #[serde(default)]
    pub heating_thermostat: Thermostat,
    #[serde(default)]
    pub cooling_thermostat: Thermostat,
    pub heating_season: bool,
    pub cooling_season: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ThermostatMode {
    Setpoint,
    Setback,
    #[default]
    Off,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Thermostat {
    pub setpoint: Option<f64>,
    pub setback: Option<f64>,
    #[serde(default)]
    pub mode: ThermostatMode,
}

impl Thermostat {
    pub fn at_setpoint(setpoint: f64) -> Self {
        Self {
            setpoint: Some(setpoint),
            setback: None,
            mode: ThermostatMode::Setpoint,
        }
    }

    /// Temperature the control is currently aiming for, or None when the system is off
    pub fn control_temperature(&self) -> Option<f64> {
        match self.mode {
            ThermostatMode::Setpoint => self.setpoint,
            ThermostatMode::Setback => self.setback,
            ThermostatMode::Off => None,
        }
    }
}

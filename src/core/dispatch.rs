// This module runs one hour of a building: it classifies the hour, finds the sensible demand,
// allocates it to the emission and air handling subsystems of the building's topology and
// solves the zone once more at the power actually delivered.

use crate::core::air_handling::ahu::{AhuOperation, AirHandlingUnit};
use crate::core::air_handling::aru::{AruControl, AruCoolingRequest, AruOperation, RecirculationUnit};
use crate::core::air_handling::{calc_humidification, AirState};
use crate::core::controls::season::{DispatchState, SeasonControl};
use crate::core::emission_losses::calc_emission_losses;
use crate::core::psychrometrics::{moisture_content, relative_humidity, saturation_moisture_content};
use crate::core::space_heat_demand::demand::{
    calc_sensible_demand, probe_sensible_demand, realize, DemandMode,
};
use crate::core::space_heat_demand::moisture::{
    calc_dehumidification_moisture_load, calc_moisture_content_in_zone, zone_air_mass,
    MoistureFlows,
};
use crate::core::space_heat_demand::rc_model::{
    cooling_convective_fraction, heating_convective_fraction, NodeTemperatures, RcConductances,
    RcTimestep, ZoneAirFlows,
};
use crate::core::space_heat_demand::ventilation::VentilationPathNetwork;
use crate::errors::{CalculationError, InputError};
use crate::input::{
    BuildingInput, BuildingProperties, ComfortProperties, CoolingTopology, HeatingTopology,
    HourlyDrivers, SimulationConfig,
};
use crate::output::{AirStream, HourlyResult, SystemStatus, SystemStatusSet, WaterStream};
use crate::simulation_time::SimulationTimeIteration;
use tracing::debug;

// Loads closer than this are treated as equal when comparing subsystems with the demand, in W
const LOAD_TOLERANCE: f64 = 1e-6;

/// State carried from one hour to the next
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarriedState {
    pub theta_m: f64,
    pub t_int: f64,
    pub x_int: f64,
    /// Water return temperatures of the recirculation unit coils, seeding the next solve
    pub aru_water_return_heating: Option<f64>,
    pub aru_water_return_cooling: Option<f64>,
}

impl CarriedState {
    /// The zone starts in equilibrium with the outdoor air of the first hour.
    pub fn initial(drivers: &HourlyDrivers) -> Self {
        Self {
            theta_m: drivers.t_ext,
            t_int: drivers.t_ext,
            x_int: moisture_content(drivers.t_ext, drivers.rh_ext),
            aru_water_return_heating: None,
            aru_water_return_cooling: None,
        }
    }
}

/// Which subsystems of the sensible emitter, AHU and ARU a topology has
fn heating_units(topology: HeatingTopology) -> [bool; 3] {
    match topology {
        HeatingTopology::Radiator | HeatingTopology::FloorHeating => [true, false, false],
        HeatingTopology::CentralAc => [false, true, true],
        HeatingTopology::None => [false, false, false],
    }
}

fn cooling_units(topology: CoolingTopology) -> [bool; 3] {
    match topology {
        CoolingTopology::CeilingRadiative => [true, false, false],
        CoolingTopology::LocalAc => [false, false, true],
        CoolingTopology::CentralAc => [false, true, true],
        CoolingTopology::ThreeForTwo => [true, true, true],
        CoolingTopology::None => [false, false, false],
    }
}

fn idle_status([sen, ahu, aru]: [bool; 3]) -> SystemStatusSet {
    let status = |present: bool| {
        if present {
            SystemStatus::Off
        } else {
            SystemStatus::NoSystem
        }
    };
    SystemStatusSet {
        sen: status(sen),
        ahu: status(ahu),
        aru: status(aru),
    }
}

/// Moisture of the mechanical supply after heat recovery. When it is not given, the outdoor
/// moisture is used, limited to saturation at the supply temperature.
fn mechanical_supply_moisture(drivers: &HourlyDrivers, x_ext: f64) -> f64 {
    if drivers.x_ve_mech > 0. {
        drivers.x_ve_mech
    } else {
        x_ext.min(saturation_moisture_content(drivers.t_ve_mech))
    }
}

fn air_stream(m: f64, t_supply: f64, t_return: f64) -> AirStream {
    AirStream {
        m,
        t_supply: Some(t_supply),
        t_return: Some(t_return),
    }
}

fn aru_streams(operation: &AruOperation) -> (AirStream, WaterStream) {
    (
        air_stream(operation.supply.m, operation.supply.t, operation.t_return),
        WaterStream {
            m: operation.water.m_water,
            t_supply: Some(operation.water.t_supply),
            t_return: Some(operation.water.t_return),
        },
    )
}

/// Conditions of the hour shared by every branch
struct Hour<'h> {
    drivers: &'h HourlyDrivers,
    carried: &'h CarriedState,
    air_flows: ZoneAirFlows,
    /// Mechanical ventilation air entering the air handling unit
    inlet: AirState,
    moisture: MoistureFlows,
}

struct BranchOutcome {
    temperatures: NodeTemperatures,
    moisture: MoistureFlows,
    aru_water_return_heating: Option<f64>,
    aru_water_return_cooling: Option<f64>,
}

/// Everything needed to run the hours of one building, built once from its static input
#[derive(Debug)]
pub struct SystemDispatch<'a> {
    properties: &'a BuildingProperties,
    comfort: ComfortProperties,
    config: &'a SimulationConfig,
    conductances: RcConductances,
    ahu: AirHandlingUnit,
    aru: RecirculationUnit,
    control: SeasonControl,
    ventilation: Option<VentilationPathNetwork>,
    air_mass: f64,
}

impl<'a> SystemDispatch<'a> {
    pub fn new(input: &'a BuildingInput, config: &'a SimulationConfig) -> Result<Self, InputError> {
        let properties = &input.properties;
        let heating_capacity = properties.heating_capacity_w();
        let cooling_capacity = properties.cooling_capacity_w().abs();
        let ahu = AirHandlingUnit::new(&input.hvac.ahu, heating_capacity, cooling_capacity)?;
        let aru = RecirculationUnit::new(&input.hvac.aru, heating_capacity, cooling_capacity)?;
        let control = SeasonControl::new(ahu.t_supply_cooling().max(aru.t_supply_cooling()));

        Ok(Self {
            properties,
            comfort: input.comfort,
            config,
            conductances: RcConductances::new(properties),
            ahu,
            aru,
            control,
            ventilation: input
                .natural_ventilation
                .as_ref()
                .map(|nv| VentilationPathNetwork::new(nv, properties.volume)),
            air_mass: zone_air_mass(properties.volume),
        })
    }

    /// Simulate one hour and return its result together with the state for the next hour.
    pub fn step(
        &self,
        simtime: &SimulationTimeIteration,
        drivers: &HourlyDrivers,
        carried: &CarriedState,
    ) -> Result<(HourlyResult, CarriedState), CalculationError> {
        let (m_ve_inf, airflow_converged) = match &self.ventilation {
            Some(network) => {
                let flows =
                    network.solve(carried.t_int, drivers.t_ext, drivers.wind_speed, self.config);
                (flows.m_in, flows.converged)
            }
            None => (drivers.m_ve_inf, true),
        };

        let x_ext = moisture_content(drivers.t_ext, drivers.rh_ext);
        let inlet = AirState {
            m: drivers.m_ve_mech,
            t: drivers.t_ve_mech,
            x: mechanical_supply_moisture(drivers, x_ext),
        };
        let hour = Hour {
            drivers,
            carried,
            air_flows: ZoneAirFlows {
                mechanical: drivers.m_ve_mech,
                t_mechanical: drivers.t_ve_mech,
                window: drivers.m_ve_window,
                infiltration: m_ve_inf,
            },
            inlet,
            moisture: MoistureFlows {
                internal_gains: drivers.moisture_gains,
                m_mech: inlet.m,
                x_mech: inlet.x,
                m_outdoor: drivers.m_ve_window + m_ve_inf,
                x_ext,
                humidification: 0.,
                dehumidification: 0.,
            },
        };

        let decision = self.control.classify(drivers, carried.t_int);
        let mut result = HourlyResult {
            hour_of_year: simtime.hour_of_year,
            state: decision.state,
            m_ve_inf,
            airflow_converged,
            ..Default::default()
        };

        let outcome = match (decision.state, decision.setpoint) {
            (DispatchState::HeatingActive, Some(setpoint)) => {
                self.heating(&hour, setpoint, &mut result)?
            }
            (DispatchState::CoolingActive, Some(setpoint)) => {
                self.cooling(&hour, setpoint, &mut result)?
            }
            (state, _) => self.idle(&hour, state, &mut result)?,
        };

        let temperatures = outcome.temperatures;
        let x_int = calc_moisture_content_in_zone(carried.x_int, self.air_mass, &outcome.moisture);
        result.temperatures = temperatures;
        result.x_int = x_int;
        result.rh_int = relative_humidity(temperatures.t_int, x_int);

        let next = CarriedState {
            theta_m: temperatures.theta_m,
            t_int: temperatures.t_int,
            x_int,
            aru_water_return_heating: outcome
                .aru_water_return_heating
                .or(carried.aru_water_return_heating),
            aru_water_return_cooling: outcome
                .aru_water_return_cooling
                .or(carried.aru_water_return_cooling),
        };

        Ok((result, next))
    }

    fn network(&self, hour: &Hour, frac_convective: f64) -> RcTimestep<'_> {
        RcTimestep::new(
            &self.conductances,
            hour.drivers,
            hour.air_flows,
            hour.carried.theta_m,
            frac_convective,
        )
    }

    fn idle(
        &self,
        hour: &Hour,
        state: DispatchState,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        let temperatures = realize(&self.network(hour, 1.), 0.)?;

        result.status = match state {
            DispatchState::SystemOff if hour.drivers.heating_season => {
                idle_status(heating_units(self.properties.heating))
            }
            DispatchState::SystemOff => idle_status(cooling_units(self.properties.cooling)),
            _ => SystemStatusSet::all(SystemStatus::Off),
        };

        Ok(BranchOutcome {
            temperatures,
            moisture: hour.moisture,
            aru_water_return_heating: None,
            aru_water_return_cooling: None,
        })
    }

    fn no_system(
        &self,
        hour: &Hour,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        debug!("Hour {} has demand but no system to meet it", result.hour_of_year);
        result.status = SystemStatusSet::all(SystemStatus::NoSystem);

        Ok(BranchOutcome {
            temperatures: realize(&self.network(hour, 1.), 0.)?,
            moisture: hour.moisture,
            aru_water_return_heating: None,
            aru_water_return_cooling: None,
        })
    }

    fn heating(
        &self,
        hour: &Hour,
        setpoint: f64,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        let topology = self.properties.heating;
        let capacity = self.properties.heating_capacity_w();
        let network = self.network(hour, heating_convective_fraction(topology));

        let outcome = match topology {
            HeatingTopology::Radiator | HeatingTopology::FloorHeating => {
                let demand = calc_sensible_demand(
                    &network,
                    DemandMode::Heating,
                    setpoint,
                    self.properties.floor_area,
                    capacity,
                    self.config,
                )?;
                result.heating.q_rc = demand.power;
                result.heating.q_shu = demand.power;
                result.heating.q_sen_sys = demand.power;
                result.status = SystemStatusSet {
                    sen: SystemStatus::on_if(demand.power > 0.),
                    ahu: SystemStatus::NoSystem,
                    aru: SystemStatus::NoSystem,
                };

                BranchOutcome {
                    temperatures: demand.temperatures,
                    moisture: hour.moisture,
                    aru_water_return_heating: None,
                    aru_water_return_cooling: None,
                }
            }
            HeatingTopology::CentralAc => {
                self.central_heating(hour, &network, setpoint, capacity, result)?
            }
            HeatingTopology::None => return self.no_system(hour, result),
        };

        let loss = calc_emission_losses(
            topology.into(),
            result.heating.q_sen_sys,
            capacity,
            outcome.temperatures.t_int,
            hour.drivers.t_ext,
            self.properties.window_to_wall_ratio,
        );
        result.heating.q_em_ls = loss.q_em_ls;
        result.heating.load_ratio = loss.load_ratio;

        Ok(outcome)
    }

    fn central_heating(
        &self,
        hour: &Hour,
        network: &RcTimestep,
        setpoint: f64,
        capacity: f64,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        let probe = probe_sensible_demand(
            network,
            DemandMode::Heating,
            setpoint,
            self.properties.floor_area,
            capacity,
            self.config,
        )?;

        // the ventilation air is always brought to supply temperature, load above the demand
        // is reported as over heating
        let ahu = self.ahu.heating(&hour.inlet);
        let q_ahu = ahu.q_sensible;

        let over_heating =
            q_ahu > probe.power && !is_close!(q_ahu, probe.power, abs_tol = LOAD_TOLERANCE);
        let residual = probe.power - q_ahu;
        let aru = if over_heating || is_close!(residual, 0., abs_tol = LOAD_TOLERANCE) {
            None
        } else {
            self.aru.heating(
                residual,
                hour.carried.t_int,
                hour.carried.x_int,
                hour.carried.aru_water_return_heating,
                self.config,
            )?
        };
        let q_aru = aru.map_or(0., |op| op.q_sensible);
        let power = q_ahu + q_aru;

        let temperatures = if power == 0. {
            probe.free_floating
        } else {
            realize(network, power)?
        };

        // humidify the ventilation air against the realised indoor temperature
        let humidification =
            calc_humidification(&ahu.supply, temperatures.t_int, self.comfort.rh_min);

        result.heating.q_rc = probe.power;
        result.heating.q_ahu = q_ahu;
        result.heating.q_aru = q_aru;
        result.heating.q_sen_sys = power;
        result.heating.q_lat_sys = humidification.q_latent;
        result.heating.e_hum_aux = humidification.e_aux;
        result.g_hu = humidification.g_hu;
        if ahu.is_active() {
            result.ahu_heating = air_stream(hour.inlet.m, ahu.supply.t, hour.carried.t_int);
        }
        if let Some(op) = &aru {
            (result.aru_heating, result.aru_water_heating) = aru_streams(op);
        }
        result.status = SystemStatusSet {
            sen: SystemStatus::NoSystem,
            ahu: if over_heating {
                SystemStatus::OverHeating
            } else {
                SystemStatus::on_if(ahu.is_active())
            },
            aru: SystemStatus::on_if(aru.is_some()),
        };

        Ok(BranchOutcome {
            temperatures,
            moisture: MoistureFlows {
                x_mech: ahu.supply.x,
                humidification: humidification.g_hu,
                ..hour.moisture
            },
            aru_water_return_heating: aru.map(|op| op.water.t_return),
            aru_water_return_cooling: None,
        })
    }

    fn cooling(
        &self,
        hour: &Hour,
        setpoint: f64,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        let topology = self.properties.cooling;
        let capacity = self.properties.cooling_capacity_w();
        let network = self.network(hour, cooling_convective_fraction(topology));

        let outcome = match topology {
            CoolingTopology::CeilingRadiative => {
                let demand = calc_sensible_demand(
                    &network,
                    DemandMode::Cooling,
                    setpoint,
                    self.properties.floor_area,
                    capacity,
                    self.config,
                )?;
                result.cooling.q_rc = demand.power;
                result.cooling.q_scu = demand.power;
                result.cooling.q_sen_sys = demand.power;
                result.status = SystemStatusSet {
                    sen: SystemStatus::on_if(demand.power < 0.),
                    ahu: SystemStatus::NoSystem,
                    aru: SystemStatus::NoSystem,
                };

                BranchOutcome {
                    temperatures: demand.temperatures,
                    moisture: hour.moisture,
                    aru_water_return_heating: None,
                    aru_water_return_cooling: None,
                }
            }
            CoolingTopology::LocalAc | CoolingTopology::CentralAc | CoolingTopology::ThreeForTwo => {
                self.air_cooling(hour, &network, topology, setpoint, capacity, result)?
            }
            CoolingTopology::None => return self.no_system(hour, result),
        };

        let loss = calc_emission_losses(
            topology.into(),
            result.cooling.q_sen_sys,
            capacity,
            outcome.temperatures.t_int,
            hour.drivers.t_ext,
            self.properties.window_to_wall_ratio,
        );
        result.cooling.q_em_ls = loss.q_em_ls;
        result.cooling.load_ratio = loss.load_ratio;

        Ok(outcome)
    }

    /// Cooling by air: the AHU treats the ventilation air at its fixed contact state, the ARU
    /// takes the sensible and moisture residual, and a three-for-two system covers what is
    /// left of the sensible demand with its radiative unit.
    fn air_cooling(
        &self,
        hour: &Hour,
        network: &RcTimestep,
        topology: CoolingTopology,
        setpoint: f64,
        capacity: f64,
        result: &mut HourlyResult,
    ) -> Result<BranchOutcome, CalculationError> {
        let [has_scu, has_ahu, _] = cooling_units(topology);
        let probe = probe_sensible_demand(
            network,
            DemandMode::Cooling,
            setpoint,
            self.properties.floor_area,
            capacity,
            self.config,
        )?;
        let dehumidification_required = |moisture: &MoistureFlows| {
            calc_dehumidification_moisture_load(
                hour.carried.x_int,
                self.air_mass,
                moisture,
                probe.t_int_expected,
                self.comfort.rh_max,
            )
        };

        let ahu = if has_ahu {
            self.ahu.cooling(&hour.inlet)
        } else {
            AhuOperation::idle(&hour.inlet)
        };
        let q_ahu = ahu.q_sensible;
        let treated = MoistureFlows {
            x_mech: ahu.supply.x,
            ..hour.moisture
        };

        let over_cooling_ahu =
            q_ahu < probe.power && !is_close!(q_ahu, probe.power, abs_tol = LOAD_TOLERANCE);
        let residual = if over_cooling_ahu {
            0.
        } else {
            probe.power - q_ahu
        };
        // a local split unit follows the thermostat only, its coil condenses uncontrolled
        let control = AruControl {
            temperature: topology != CoolingTopology::ThreeForTwo,
            moisture: topology != CoolingTopology::LocalAc,
        };
        let request = AruCoolingRequest {
            q_sensible: residual,
            g_dehumidification: if control.moisture {
                dehumidification_required(&treated)
            } else {
                0.
            },
            q_limit: (capacity - q_ahu).min(0.),
        };
        let aru = self.aru.cooling(
            &request,
            control,
            hour.carried.t_int,
            hour.carried.x_int,
            hour.carried.aru_water_return_cooling,
            self.config,
        )?;
        let q_aru = aru.map_or(0., |op| op.q_sensible);
        let g_aru = aru.map_or(0., |op| op.g_dehumidification);
        let q_lat_aru = aru.map_or(0., |op| op.q_latent);

        let q_scu = if has_scu {
            (residual - q_aru).min(0.)
        } else {
            0.
        };
        let power = q_ahu + q_aru + q_scu;
        let over_cooling_aru = !over_cooling_ahu
            && q_ahu + q_aru < probe.power
            && !is_close!(q_ahu + q_aru, probe.power, abs_tol = LOAD_TOLERANCE);

        let temperatures = if power == 0. {
            probe.free_floating
        } else {
            realize(network, power)?
        };

        result.cooling.q_rc = probe.power;
        result.cooling.q_ahu = q_ahu;
        result.cooling.q_aru = q_aru;
        result.cooling.q_scu = q_scu;
        result.cooling.q_sen_sys = power;
        result.cooling.q_lat_ahu = ahu.q_latent;
        result.cooling.q_lat_aru = q_lat_aru;
        result.cooling.q_lat_sys = ahu.q_latent + q_lat_aru;
        result.g_dhu = ahu.g_dehumidification + g_aru;
        if ahu.is_active() {
            result.ahu_cooling = air_stream(hour.inlet.m, ahu.supply.t, hour.carried.t_int);
        }
        if let Some(op) = &aru {
            (result.aru_cooling, result.aru_water_cooling) = aru_streams(op);
        }
        result.status = SystemStatusSet {
            sen: if has_scu {
                SystemStatus::on_if(q_scu < 0.)
            } else {
                SystemStatus::NoSystem
            },
            ahu: if !has_ahu {
                SystemStatus::NoSystem
            } else if over_cooling_ahu {
                SystemStatus::OverCooling
            } else {
                SystemStatus::on_if(ahu.is_active())
            },
            aru: match aru {
                Some(_) if over_cooling_aru => SystemStatus::OverCooling,
                Some(_) => SystemStatus::On,
                None => SystemStatus::Off,
            },
        };

        Ok(BranchOutcome {
            temperatures,
            moisture: MoistureFlows {
                dehumidification: g_aru,
                ..treated
            },
            aru_water_return_heating: None,
            aru_water_return_cooling: aru.map(|op| op.water.t_return),
        })
    }
}

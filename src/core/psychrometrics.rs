//! Moist air relations used by the humidity control of the air-handling units and by the
//! zone moisture balance. Moisture contents are in kg water per kg dry air, relative
//! humidities in %, enthalpies in kJ/kg dry air.

/// Atmospheric pressure assumed for all moist air states, in Pa
const P_ATM: f64 = 100_000.;
/// Ratio of molar masses of water vapour and dry air (rounded)
const MOLAR_MASS_RATIO: f64 = 0.62;

/// Saturation vapour pressure over water (Magnus form), in Pa
///
/// Arguments:
/// * `temp` - air temperature, in deg C
pub fn saturation_vapour_pressure(temp: f64) -> f64 {
    610.78 * (temp / (temp + 238.3) * 17.2694).exp()
}

/// Moisture content of air at the given temperature and relative humidity
///
/// Arguments:
/// * `temp` - air temperature, in deg C
/// * `rel_humidity` - relative humidity, in %
pub fn moisture_content(temp: f64, rel_humidity: f64) -> f64 {
    let p_vapour = rel_humidity / 100. * saturation_vapour_pressure(temp);
    MOLAR_MASS_RATIO * p_vapour / (P_ATM - p_vapour)
}

/// Moisture content of saturated air at the given temperature
pub fn saturation_moisture_content(temp: f64) -> f64 {
    moisture_content(temp, 100.)
}

/// Relative humidity of air with the given temperature and moisture content, limited to
/// the physical range [0, 100] %
pub fn relative_humidity(temp: f64, moisture: f64) -> f64 {
    let p_vapour = moisture * P_ATM / (MOLAR_MASS_RATIO + moisture);
    (100. * p_vapour / saturation_vapour_pressure(temp)).clamp(0., 100.)
}

/// Specific enthalpy of moist air
///
/// Arguments:
/// * `temp` - air temperature, in deg C
/// * `moisture` - moisture content, in kg/kg
pub fn enthalpy(temp: f64, moisture: f64) -> f64 {
    let vapour = moisture * (2501. + 1.84 * temp);
    if temp > 0. && temp < 60. {
        (1.007 * temp - 0.026) + vapour
    } else {
        1.005 * temp + vapour
    }
}

/// Temperature of moist air given its specific enthalpy and moisture content
pub fn temperature_from_enthalpy(enthalpy: f64, moisture: f64) -> f64 {
    let temp_mid_range = (enthalpy + 0.026 - 2501. * moisture) / (1.007 + 1.84 * moisture);
    if temp_mid_range > 0. && temp_mid_range < 60. {
        temp_mid_range
    } else {
        (enthalpy - 2501. * moisture) / (1.005 + 1.84 * moisture)
    }
}

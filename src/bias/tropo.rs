use crate::bias::Meteo;

/// Lowest elevation (degrees) the models are evaluated at
const MIN_ELEVATION_DEG: f64 = 1.0;

/// Simplified GMF hydrostatic coefficients
const GMF_AH: f64 = 2.53E-5;
const GMF_BH: f64 = 5.49E-3;
const GMF_CH: f64 = 1.14E-3;

/// Saastamoinen slant troposphere delay (m) for a satellite seen
/// at this elevation (degrees). Water vapour pressure is derived from
/// relative humidity with the Magnus approximation.
pub fn saastamoinen_delay_m(elevation_deg: f64, meteo: &Meteo) -> f64 {
    let elev = elevation_deg.clamp(MIN_ELEVATION_DEG, 90.0);
    let z = (90.0 - elev).to_radians();
    let (t, p) = (meteo.temperature_k, meteo.pressure_hpa);

    // saturation then partial water vapour pressure (hPa)
    let es = 6.112 * ((17.62 * (t - 273.15)) / (t - 30.03)).exp();
    let e = meteo.humidity_percent / 100.0 * es;

    let b = if meteo.height_m > 0.0 {
        0.002277 * meteo.height_m / z.cos()
    } else {
        0.0
    };

    0.002277 / z.cos() * (p + (1255.0 / t + 0.05) * e - b * z.tan().powi(2))
}

/// Simplified global mapping function, returns the (hydrostatic, wet)
/// mapping factors at this elevation (degrees)
pub fn gmf_mapping(elevation_deg: f64) -> (f64, f64) {
    let sin_e = elevation_deg
        .clamp(MIN_ELEVATION_DEG, 90.0)
        .to_radians()
        .sin();

    let mh = (1.0 + GMF_AH / (1.0 + GMF_BH / (1.0 + GMF_CH)))
        / (sin_e + GMF_AH / (sin_e + GMF_BH / (sin_e + GMF_CH)));

    let mw = 1.0 / (sin_e + 0.017);

    (mh, mw)
}

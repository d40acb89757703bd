/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Earth gravitational constant (m^3 s-2), as broadcast by GPS (IS-GPS-200)
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 3.986005E14;

/// WGS84 Earth Frame Ellipsoid semi-major axis
pub const EARTH_SEMI_MAJOR_AXIS_WGS84: f64 = 6378137.0_f64;

/// WGS84 Earth Frame Ellipsoid flattening
pub const EARTH_FLATTENING_WGS84: f64 = 1.0 / 298.257223563;

/// Relativistic clock correction constant F (s.m^-1/2)
pub const RELATIVISTIC_F: f64 = -4.442807633E-10;

/// GPS PI, as defined by IS-GPS-200
pub const GPS_PI: f64 = 3.1415926535898;

/// Half a GPS week, in seconds
pub const HALF_WEEK_S: f64 = 302_400.0;

/// One GPS week, in seconds
pub const WEEK_S: f64 = 604_800.0;

/// Maximal (toc) distance for an Ephemeris to be paired with an observation, in seconds
pub const EPHEMERIS_VALIDITY_S: f64 = 7_200.0;

// Physical Constants
pub const STANDARD_GRAVITY: f64 = 9.80665; // m/s²
pub const SPECIFIC_GAS_CONSTANT_AIR: f64 = 287.05; // J/(kg⋅K)

// Environmental Constants
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const SEA_LEVEL_PRESSURE: f64 = 101325.0; // Pa
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m³
pub const TROPOSPHERE_TEMP_GRADIENT: f64 = -6.5 / 1_000.0; // K per meter
pub const TROPOSPHERE_PRESSURE_EXPONENT: f64 = 5.2561;
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const TROPOPAUSE_TEMPERATURE: f64 = 216.65; // K
pub const TROPOPAUSE_PRESSURE: f64 = 22_632.0; // Pa

// Flight Simulation Parameters
pub const FLIGHT_HORIZON: f64 = 300.0; // s
pub const FLIGHT_OUTPUT_STEP: f64 = 0.05; // s
pub const FLIGHT_RELATIVE_TOLERANCE: f64 = 1e-6;
pub const FLIGHT_ABSOLUTE_TOLERANCE: f64 = 1e-9;

// Thrust Search
pub const THRUST_SEARCH_MIN: f64 = 10.0; // N
pub const THRUST_SEARCH_MAX: f64 = 1000.0; // N
pub const APOGEE_TOLERANCE: f64 = 1.0; // m
pub const THRUST_SEARCH_ITERATIONS: usize = 60;

// Nozzle Constants
pub const NOZZLE_EFFICIENCY: f64 = 0.92;
pub const MACH_INITIAL_GUESS: f64 = 2.0;

// Internal Ballistics Parameters
pub const BALLISTICS_TIME_STEP: f64 = 0.005; // s
pub const MAX_BURN_TIME: f64 = 20.0; // s

// Low chamber pressure thrust coefficient bands (ratios to ambient pressure)
pub const FULL_EFFICIENCY_PRESSURE_RATIO: f64 = 10.0;
pub const REDUCED_EFFICIENCY_PRESSURE_RATIO: f64 = 5.0;
pub const REDUCED_EFFICIENCY_FACTOR: f64 = 0.95;
pub const LOW_EFFICIENCY_FACTOR: f64 = 0.85;

// Grain Sizing
pub const MIN_CORE_DIAMETER: f64 = 0.005; // m
pub const MIN_WEB_MARGIN: f64 = 0.005; // m
pub const BURN_TIME_TOLERANCE: f64 = 0.01; // s
pub const GRAIN_SEARCH_ITERATIONS: usize = 20;
pub const MIN_PORT_RATIO: f64 = 2.0;
pub const EROSIVE_LENGTH_TO_DIAMETER: f64 = 6.0;

// KNSB Propellant (Richard Nakka's Experimental Rocketry)
pub const KNSB_DENSITY: f64 = 1641.0; // kg/m³
pub const KNSB_CHARACTERISTIC_VELOCITY: f64 = 895.0; // m/s
pub const KNSB_BURN_RATE_COEFFICIENT: f64 = 8.26e-3; // m/s per MPa^n
pub const KNSB_BURN_RATE_EXPONENT: f64 = 0.319;

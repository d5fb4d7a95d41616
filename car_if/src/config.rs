//! # Driver configuration
//!
//! The driver configuration is a small blob of signed 16 bit, fixed-point values with two
//! implied decimal digits (i.e. `123` means `1.23`). Individual fields are reached through
//! [`CONFIG_FIELDS`], a table mapping a cursor index to a named getter/setter pair.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::chunk::{self, ChunkError, ChunkSerialize, Tag, HEADER_LEN};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tag of the configuration chunk written at the start of every recording.
pub const CONFIG_TAG: Tag = *b"CCNF";

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

/// Declares the `DriverConfig` struct along with its field table, keeping the two in the same
/// order.
macro_rules! driver_config {
    ($($(#[$doc:meta])* $name:ident = $default:expr),+ $(,)?) => {
        /// Tunable driving parameters, each in hundredths of their unit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct DriverConfig {
            $($(#[$doc])* pub $name: i16,)+
        }

        impl Default for DriverConfig {
            fn default() -> Self {
                Self {
                    $($name: $default,)+
                }
            }
        }

        /// Named accessors for every configuration field, in cursor order.
        pub const CONFIG_FIELDS: &[ConfigField] = &[
            $(ConfigField {
                name: stringify!($name),
                get: |c| c.$name,
                set: |c, v| c.$name = v,
            },)+
        ];
    };
}

driver_config! {
    /// Maximum commanded speed, m/s
    speed_limit = 500,
    /// Maximum lateral acceleration, m/s^2
    traction_limit = 700,
    /// Maximum longitudinal acceleration, m/s^2
    accel_limit = 500,
    /// Steering gain on lateral position error
    steering_kpy = 100,
    /// Steering gain on lateral velocity error
    steering_kvy = 50,
    /// Motor feedforward gain
    motor_gain = 200,
    /// Motor integral gain
    motor_ki = 10,
    /// Motor deadband offset
    motor_u0 = 10,
    /// Motor model coefficient on throttle
    motor_c1 = 200,
    /// Motor model coefficient on speed
    motor_c2 = 50,
    /// Planner lookahead distance, m
    lookahead = 100,
    /// Penalty weight for leaving the racing line
    path_penalty = 100,
    /// Penalty weight for cones
    cone_penalty = 100,
    /// Penalty weight for other cars
    car_penalty = 100,
}

/// Number of tunable fields in the configuration.
pub const N_CONFIG_ITEMS: usize = CONFIG_FIELDS.len();

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A named accessor pair for one configuration field.
#[derive(Clone, Copy)]
pub struct ConfigField {
    /// Name of the field, shown on the display.
    pub name: &'static str,

    /// Read the field.
    pub get: fn(&DriverConfig) -> i16,

    /// Write the field.
    pub set: fn(&mut DriverConfig, i16),
}

/// Persists the configuration as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Loads and saves the driver configuration.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<DriverConfig, ConfigStoreError>;

    fn save(&self, config: &DriverConfig) -> Result<(), ConfigStoreError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("Could not access the configuration file: {0}")]
    Io(std::io::Error),

    #[error("Could not parse the configuration file: {0}")]
    Parse(toml::de::Error),

    #[error("Could not serialize the configuration: {0}")]
    Serialize(toml::ser::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriverConfig {
    /// All field values in cursor order.
    pub fn values(&self) -> [i16; N_CONFIG_ITEMS] {
        let mut values = [0; N_CONFIG_ITEMS];
        for (v, field) in values.iter_mut().zip(CONFIG_FIELDS.iter()) {
            *v = (field.get)(self);
        }
        values
    }

    /// Names of all fields in cursor order.
    pub fn names() -> [&'static str; N_CONFIG_ITEMS] {
        let mut names = [""; N_CONFIG_ITEMS];
        for (n, field) in names.iter_mut().zip(CONFIG_FIELDS.iter()) {
            *n = field.name;
        }
        names
    }

    /// Decode a configuration chunk written by `serialize`.
    pub fn from_chunk(buf: &[u8]) -> Result<Self, ChunkError> {
        let payload = chunk::expect_chunk(buf, &CONFIG_TAG)?;
        if payload.len() != 2 * N_CONFIG_ITEMS {
            return Err(ChunkError::WrongPayloadSize(CONFIG_TAG, payload.len()))
        }

        let mut config = Self::default();
        for (i, field) in CONFIG_FIELDS.iter().enumerate() {
            (field.set)(&mut config, LittleEndian::read_i16(&payload[2 * i..]));
        }

        Ok(config)
    }
}

impl ChunkSerialize for DriverConfig {
    fn serialized_size(&self) -> usize {
        HEADER_LEN + 2 * N_CONFIG_ITEMS
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<usize, ChunkError> {
        let len = self.serialized_size();
        chunk::check_space(buf, len)?;
        chunk::write_header(buf, &CONFIG_TAG, len)?;

        for (i, v) in self.values().iter().enumerate() {
            LittleEndian::write_i16(&mut buf[HEADER_LEN + 2 * i..], *v);
        }

        Ok(len)
    }
}

impl TomlConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into()
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<DriverConfig, ConfigStoreError> {
        let s = std::fs::read_to_string(&self.path).map_err(ConfigStoreError::Io)?;
        let config = toml::from_str(&s).map_err(ConfigStoreError::Parse)?;
        debug!("Loaded driver configuration from {:?}", self.path);
        Ok(config)
    }

    fn save(&self, config: &DriverConfig) -> Result<(), ConfigStoreError> {
        let s = toml::to_string(config).map_err(ConfigStoreError::Serialize)?;
        std::fs::write(&self.path, s).map_err(ConfigStoreError::Io)?;
        debug!("Saved driver configuration to {:?}", self.path);
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Format a fixed-point value with two implied decimal digits, e.g. `-105` as `-1.05`.
pub fn format_fixed(value: i16) -> String {
    let v = i32::from(value);
    let sign = if v < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, v.abs() / 100, v.abs() % 100)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_field_table() {
        assert_eq!(CONFIG_FIELDS.len(), N_CONFIG_ITEMS);

        let mut config = DriverConfig::default();
        (CONFIG_FIELDS[3].set)(&mut config, -42);
        assert_eq!(CONFIG_FIELDS[3].name, "steering_kpy");
        assert_eq!(config.steering_kpy, -42);
        assert_eq!((CONFIG_FIELDS[3].get)(&config), -42);

        assert_eq!(DriverConfig::names()[0], "speed_limit");
        assert_eq!(DriverConfig::names()[N_CONFIG_ITEMS - 1], "car_penalty");
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(0), "0.00");
        assert_eq!(format_fixed(5), "0.05");
        assert_eq!(format_fixed(123), "1.23");
        assert_eq!(format_fixed(-105), "-1.05");
        assert_eq!(format_fixed(-7), "-0.07");
        assert_eq!(format_fixed(i16::MIN), "-327.68");
    }

    #[test]
    fn test_config_chunk() {
        let mut config = DriverConfig::default();
        config.lookahead = -300;

        let mut buf = vec![0u8; config.serialized_size()];
        assert_eq!(
            ChunkSerialize::serialize(&config, &mut buf),
            Ok(8 + 2 * N_CONFIG_ITEMS)
        );
        assert_eq!(&buf[0..4], b"CCNF");
        assert_eq!(DriverConfig::from_chunk(&buf), Ok(config));
    }

    #[test]
    fn test_toml_store() {
        let path = std::env::temp_dir()
            .join(format!("car_if_config_test_{}.toml", std::process::id()));
        let store = TomlConfigStore::new(&path);

        let mut config = DriverConfig::default();
        config.speed_limit = 1234;
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(store.load(), Err(ConfigStoreError::Io(_))));
    }
}

//! Sensor module - metadata, capability inference and reading synthesis

mod traits;
mod capability;
mod catalog;
mod simulator;

pub use traits::{
    ActiveSensor, Capability, DataQuality, OperatingRange, ParseTagError, Reading, Sensor,
    SensorStatus,
};
pub(crate) use traits::string_tag;
pub use capability::infer_capability;
pub use catalog::sample_sensors;
pub use simulator::{round_to, slot_timestamps, ReadingSynthesizer, SynthesisProfile, WeightedSampler};

//! Per-voice audio filters and the name-keyed filter factory.

mod moving_average;
mod resonant;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

use dyn_clone::DynClone;
use tp_ir::{FilterInfo, FilterParams};

use crate::error::EngineError;
use crate::frame::Frame;
use crate::period::Frequency;

pub use moving_average::MovingAverageFilter;
pub use resonant::ResonantFilter;

/// A stateful per-voice filter. Cloning copies the history.
pub trait Filter: DynClone + fmt::Debug + Send {
    /// Process one dry frame into a wet frame of the same width.
    fn filter(&mut self, dry: Frame) -> Frame;

    /// Apply a filter-envelope value (cutoff, 0-127).
    fn update_env(&mut self, value: u8) -> Result<(), EngineError>;

    /// Output rate the coefficients are computed against.
    fn set_playback_rate(&mut self, rate: Frequency) -> Result<(), EngineError>;
}

dyn_clone::clone_trait_object!(Filter);

/// Filter constructor registered in a [`FilterFactory`].
pub type FilterConstructor = fn(&FilterParams) -> Result<Box<dyn Filter>, EngineError>;

/// Name-keyed filter registry consulted once per voice setup.
#[derive(Clone)]
pub struct FilterFactory {
    constructors: BTreeMap<String, FilterConstructor>,
}

impl fmt::Debug for FilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl Default for FilterFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(ResonantFilter::NAME, ResonantFilter::construct);
        factory.register(MovingAverageFilter::NAME, MovingAverageFilter::construct);
        factory
    }
}

impl FilterFactory {
    /// A factory with no registered filters.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) a constructor.
    pub fn register(&mut self, name: &str, constructor: FilterConstructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    /// Build the filter an instrument asks for.
    pub fn create(&self, info: &FilterInfo) -> Result<Box<dyn Filter>, EngineError> {
        let constructor = self
            .constructors
            .get(info.name.as_str())
            .ok_or_else(|| EngineError::UnknownFilter(info.name.to_string()))?;
        let filter = constructor(&info.params)?;
        tracing::debug!(name = info.name.as_str(), "filter created");
        Ok(filter)
    }
}

//! Effect dispatch contract.
//!
//! A row's effect column is turned into a boxed [`Effect`] by an
//! [`EffectFactory`]. The scheduler then calls, per row:
//!
//! 1. [`Effect::pre_start`] on every channel, before any tick-0 work;
//! 2. [`Effect::start`] on every channel;
//! 3. [`Effect::tick`] on every tick of the row, tick 0 included.

mod basic;

pub use basic::BasicEffects;

use alloc::boxed::Box;
use core::fmt::Debug;

use tp_ir::EffectData;

use crate::channel::Channel;
use crate::error::EngineError;
use crate::period::Period;
use crate::ticker::Transport;

/// One effect command bound to a channel for the length of a row.
pub trait Effect<P: Period>: Debug + Send {
    /// May change scheduler state (speed, tempo, order).
    fn pre_start(&mut self, _channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        Ok(())
    }

    fn start(&mut self, _channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        Ok(())
    }

    fn tick(&mut self, _channel: &mut Channel<P>, _transport: &mut Transport, _tick: u32) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Turns raw effect column data into effects. `None` means the command is
/// not handled.
pub trait EffectFactory<P: Period>: Send {
    fn create(&self, data: EffectData) -> Option<Box<dyn Effect<P>>>;
}

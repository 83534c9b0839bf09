//! Handler matching events by their concrete Rust type.

use std::any::{Any, TypeId};
use std::fmt;

use dbot_core::Update;

use super::CheckResult;
use crate::event::Event;

/// Matches events whose payload is exactly `T`: custom values of type `T`, updates when
/// `T = Update`, and raw strings when `T = String`.
#[derive(Clone, Copy)]
pub struct TypeHandler {
    accepts: fn(&Event) -> bool,
    type_name: &'static str,
}

impl TypeHandler {
    pub fn new<T: Any>() -> Self {
        Self {
            accepts: accepts::<T>,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn check(&self, event: &Event) -> Option<CheckResult> {
        (self.accepts)(event).then_some(CheckResult::Matched)
    }
}

fn accepts<T: Any>(event: &Event) -> bool {
    match event {
        Event::Custom(value) => (**value).is::<T>(),
        Event::Update(_) => TypeId::of::<T>() == TypeId::of::<Update>(),
        Event::Text(_) => TypeId::of::<T>() == TypeId::of::<String>(),
    }
}

impl fmt::Debug for TypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandler")
            .field("type_name", &self.type_name)
            .finish()
    }
}

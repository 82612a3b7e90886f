//! Minimal entities for unit tests.

use std::any::Any;

use crate::entity::{Entity, EntityCore};
use crate::layout::SizePolicy;

pub(crate) struct Leaf {
    pub(crate) core: EntityCore,
}

impl Leaf {
    pub(crate) fn new() -> Self {
        Self {
            core: EntityCore::new(),
        }
    }

    pub(crate) fn sized(width: f32, height: f32) -> Self {
        Self {
            core: EntityCore::new().sized(width, height),
        }
    }

    pub(crate) fn with_policy(width: SizePolicy, height: SizePolicy) -> Self {
        Self {
            core: EntityCore::new().with_policy(width, height),
        }
    }
}

impl Entity for Leaf {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

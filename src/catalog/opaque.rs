//! The `opaque` package: a module that imports fine but whose member table
//! cannot be read, so exploration of it ends in an enumeration failure.

use prober_types::{EnumerationError, Member, MemberSource};

use crate::package::UnitLoad;

/// A module that imports but refuses to list its members.
#[derive(Debug, Clone)]
pub struct OpaqueUnit {
    name: String,
    reason: String,
}

impl OpaqueUnit {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl MemberSource for OpaqueUnit {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Result<Vec<(String, Member)>, EnumerationError> {
        Err(EnumerationError {
            unit: self.name.clone(),
            message: self.reason.clone(),
        })
    }
}

pub(super) fn units() -> Vec<UnitLoad> {
    vec![UnitLoad::loaded(OpaqueUnit::new(
        "opaque",
        "module attribute table is not readable",
    ))]
}

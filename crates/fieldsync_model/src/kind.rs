//! Synchronizable entity kinds.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A synchronizable record type on the remote field-service platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A customer account.
    Customer,
    /// A field technician.
    Technician,
    /// A work order.
    WorkOrder,
    /// A scheduled service appointment.
    Appointment,
}

impl EntityKind {
    /// Returns the stable snake_case name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Technician => "technician",
            Self::WorkOrder => "work_order",
            Self::Appointment => "appointment",
        }
    }

    /// All kinds in referential dependency order.
    ///
    /// Customers and technicians come before the work orders and
    /// appointments that reference them. Cycle orchestration relies on this
    /// ordering; it is a correctness requirement, not an optimization.
    pub fn dependency_order() -> &'static [EntityKind] {
        &[
            Self::Customer,
            Self::Technician,
            Self::WorkOrder,
            Self::Appointment,
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityKind(pub String);

impl std::fmt::Display for UnknownEntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown entity kind: {}", self.0)
    }
}

impl std::error::Error for UnknownEntityKind {}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "technician" => Ok(Self::Technician),
            "work_order" => Ok(Self::WorkOrder),
            "appointment" => Ok(Self::Appointment),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_and_from_str_roundtrip() {
        for kind in EntityKind::dependency_order() {
            assert_eq!(EntityKind::from_str(kind.as_str()).unwrap(), *kind);
        }
        assert!(EntityKind::from_str("invoice").is_err());
    }

    #[test]
    fn dependency_order_puts_referenced_kinds_first() {
        let order = EntityKind::dependency_order();
        let pos = |k| order.iter().position(|x| *x == k).unwrap();

        assert!(pos(EntityKind::Customer) < pos(EntityKind::WorkOrder));
        assert!(pos(EntityKind::Customer) < pos(EntityKind::Appointment));
        assert!(pos(EntityKind::Technician) < pos(EntityKind::Appointment));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&EntityKind::WorkOrder).unwrap();
        assert_eq!(json, "\"work_order\"");
        let parsed: EntityKind = serde_json::from_str("\"appointment\"").unwrap();
        assert_eq!(parsed, EntityKind::Appointment);
    }
}

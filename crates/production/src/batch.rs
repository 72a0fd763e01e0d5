use serde::{Deserialize, Serialize};

use bomledger_core::{DomainError, ItemId, Quantity};

/// What a batch does with each row's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Receive stock; no BOM resolution.
    StockIn,
    /// Build assemblies: assembly IN, components OUT.
    Production,
    /// Ship assemblies; drains governed by [`ShipmentPolicy`].
    Shipment,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::StockIn => "stock_in",
            BatchMode::Production => "production",
            BatchMode::Shipment => "shipment",
        }
    }

    pub fn resolves_bom(&self, policy: ShipmentPolicy) -> bool {
        match self {
            BatchMode::StockIn => false,
            BatchMode::Production => true,
            BatchMode::Shipment => policy.drains_components(),
        }
    }
}

/// Which ledgers a shipment drains. Chosen explicitly through configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentPolicy {
    /// Assembly OUT plus one OUT per resolved component (build-to-order consumption).
    #[default]
    AssemblyAndComponents,
    /// Only the finished assembly's own stock.
    AssemblyOnly,
    /// Only the components, per the current BOM.
    ComponentsOnly,
}

impl ShipmentPolicy {
    pub fn drains_assembly(&self) -> bool {
        !matches!(self, ShipmentPolicy::ComponentsOnly)
    }

    pub fn drains_components(&self) -> bool {
        !matches!(self, ShipmentPolicy::AssemblyOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentPolicy::AssemblyAndComponents => "assembly_and_components",
            ShipmentPolicy::AssemblyOnly => "assembly_only",
            ShipmentPolicy::ComponentsOnly => "components_only",
        }
    }
}

impl core::str::FromStr for ShipmentPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assembly_and_components" => Ok(ShipmentPolicy::AssemblyAndComponents),
            "assembly_only" => Ok(ShipmentPolicy::AssemblyOnly),
            "components_only" => Ok(ShipmentPolicy::ComponentsOnly),
            other => Err(DomainError::validation(format!(
                "unknown shipment policy '{other}' (expected assembly_and_components, assembly_only or components_only)"
            ))),
        }
    }
}

/// One independent request inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRow {
    pub item_id: ItemId,
    pub qty: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub mode: BatchMode,
    pub rows: Vec<BatchRow>,
}

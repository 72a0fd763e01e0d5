use serde::{Deserialize, Serialize};

use bomledger_core::{DomainError, DomainResult, Entity, ItemId, Quantity};

/// Item category: what the BOM engine may do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Component,
    Assembly,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Component => "component",
            ItemType::Assembly => "assembly",
        }
    }
}

impl core::str::FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "component" => Ok(ItemType::Component),
            "assembly" => Ok(ItemType::Assembly),
            other => Err(DomainError::validation(format!("unknown item type '{other}'"))),
        }
    }
}

/// Unit the ledger counts an item in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagedUnit {
    Grams,
    Pieces,
}

impl ManagedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedUnit::Grams => "grams",
            ManagedUnit::Pieces => "pieces",
        }
    }
}

impl core::str::FromStr for ManagedUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grams" => Ok(ManagedUnit::Grams),
            "pieces" => Ok(ManagedUnit::Pieces),
            other => Err(DomainError::validation(format!("unknown managed unit '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDetail {
    pub category: Option<String>,
    pub supplier_part_no: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyDetail {
    pub notes: Option<String>,
}

/// Type-specific attributes, keyed by [`ItemType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum ItemDetail {
    Component(ComponentDetail),
    Assembly(AssemblyDetail),
}

impl ItemDetail {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemDetail::Component(_) => ItemType::Component,
            ItemDetail::Assembly(_) => ItemType::Assembly,
        }
    }
}

/// Catalog item as seen by the BOM engine and the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Human key (e.g. `PART-A`); used for deterministic ordering in reports.
    pub code: String,
    pub name: String,
    pub managed_unit: ManagedUnit,
    pub pack_qty: Option<Quantity>,
    #[serde(default)]
    pub reorder_point: Quantity,
    pub stock_managed: bool,
    #[serde(flatten)]
    pub detail: ItemDetail,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Item {
    /// Stock-managed component in pieces with no pack size or reorder point.
    pub fn component(id: ItemId, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.clone(),
            code,
            managed_unit: ManagedUnit::Pieces,
            pack_qty: None,
            reorder_point: Quantity::ZERO,
            stock_managed: true,
            detail: ItemDetail::Component(ComponentDetail::default()),
        }
    }

    /// Stock-managed assembly in pieces with no pack size or reorder point.
    pub fn assembly(id: ItemId, code: impl Into<String>) -> Self {
        Self {
            detail: ItemDetail::Assembly(AssemblyDetail::default()),
            ..Self::component(id, code)
        }
    }

    pub fn with_unit(mut self, unit: ManagedUnit) -> Self {
        self.managed_unit = unit;
        self
    }

    pub fn with_reorder_point(mut self, reorder_point: Quantity) -> Self {
        self.reorder_point = reorder_point;
        self
    }

    pub fn with_pack_qty(mut self, pack_qty: Quantity) -> Self {
        self.pack_qty = Some(pack_qty);
        self
    }

    pub fn unmanaged(mut self) -> Self {
        self.stock_managed = false;
        self
    }

    pub fn item_type(&self) -> ItemType {
        self.detail.item_type()
    }

    pub fn is_assembly(&self) -> bool {
        self.item_type() == ItemType::Assembly
    }

    /// Check the attribute invariants the core relies on.
    pub fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("item code cannot be empty"));
        }
        if let Some(pack) = self.pack_qty {
            pack.ensure_positive("pack_qty")?;
        }
        if self.reorder_point.is_negative() {
            return Err(DomainError::invalid_quantity("reorder_point cannot be negative"));
        }
        Ok(())
    }

    /// Fails with `NotManaged` unless the item takes part in the ledger.
    pub fn ensure_stock_managed(&self) -> DomainResult<()> {
        if self.stock_managed {
            Ok(())
        } else {
            Err(DomainError::NotManaged(self.id))
        }
    }
}

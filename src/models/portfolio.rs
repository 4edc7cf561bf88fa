use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad asset class of a holding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Equity,
    Bond,
    Alternative,
    Cash,
}

impl AssetType {
    pub const ALL: [AssetType; 4] = [
        AssetType::Equity,
        AssetType::Bond,
        AssetType::Alternative,
        AssetType::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Equity => "equity",
            AssetType::Bond => "bond",
            AssetType::Alternative => "alternative",
            AssetType::Cash => "cash",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single holding inside a portfolio snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub asset_type: AssetType,
    pub quantity: f64,
    pub current_price: f64,

    /// Annual yield for fixed-income holdings, as a fraction (0.045 for 4.5%)
    #[serde(default, alias = "yield", skip_serializing_if = "Option::is_none")]
    pub annual_yield: Option<f64>,

    /// Caller-supplied risk score (0-1), used to order alternative reductions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

impl Asset {
    pub fn new(symbol: &str, name: &str, asset_type: AssetType, quantity: f64, current_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            asset_type,
            quantity,
            current_price,
            annual_yield: None,
            risk_score: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Name used in trade rationales; falls back to the symbol.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.symbol
        } else {
            &self.name
        }
    }
}

/// Holdings handed to the engine by the portfolio data provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<Uuid>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl PortfolioSnapshot {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            portfolio_id: None,
            assets,
        }
    }

    pub fn total_value(&self) -> f64 {
        self.assets.iter().map(Asset::value).sum()
    }

    /// Value held in each asset class as a fraction of `total_value`.
    ///
    /// Returns all zeros when the total is not positive.
    pub fn class_allocation(&self, total_value: f64) -> AssetClassAllocation {
        let mut allocation = AssetClassAllocation::default();
        if total_value <= 0.0 {
            return allocation;
        }
        for asset in &self.assets {
            *allocation.get_mut(asset.asset_type) += asset.value() / total_value;
        }
        allocation
    }

    pub fn assets_of(&self, asset_type: AssetType) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.asset_type == asset_type)
    }
}

/// Fractions of the portfolio held in each asset class.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AssetClassAllocation {
    pub equity: f64,
    pub bond: f64,
    pub alternative: f64,
    pub cash: f64,
}

impl AssetClassAllocation {
    pub fn new(equity: f64, bond: f64, alternative: f64, cash: f64) -> Self {
        Self {
            equity,
            bond,
            alternative,
            cash,
        }
    }

    pub fn get(&self, asset_type: AssetType) -> f64 {
        match asset_type {
            AssetType::Equity => self.equity,
            AssetType::Bond => self.bond,
            AssetType::Alternative => self.alternative,
            AssetType::Cash => self.cash,
        }
    }

    pub fn get_mut(&mut self, asset_type: AssetType) -> &mut f64 {
        match asset_type {
            AssetType::Equity => &mut self.equity,
            AssetType::Bond => &mut self.bond,
            AssetType::Alternative => &mut self.alternative,
            AssetType::Cash => &mut self.cash,
        }
    }

    pub fn total(&self) -> f64 {
        self.equity + self.bond + self.alternative + self.cash
    }

    /// Scale every class so the allocation sums to exactly 1.0.
    pub fn normalized(mut self) -> Self {
        let total = self.total();
        if total > 0.0 {
            for asset_type in AssetType::ALL {
                *self.get_mut(asset_type) /= total;
            }
        }
        self
    }
}

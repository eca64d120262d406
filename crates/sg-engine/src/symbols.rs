//! Symbol catalog and weighted symbol table

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Symbol identifier
///
/// Seven paying symbols (ordered from lowest to highest paying), plus the
/// WILD and SCATTER specials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolId {
    #[serde(rename = "S1_VOID_SHARD")]
    VoidShard,
    #[serde(rename = "S2_NEBULA_CORE")]
    NebulaCore,
    #[serde(rename = "S3_PLASMA_ORB")]
    PlasmaOrb,
    #[serde(rename = "S4_STELLAR_FRAG")]
    StellarFragment,
    #[serde(rename = "S5_DARK_MATTER")]
    DarkMatter,
    #[serde(rename = "S6_SINGULARITY")]
    SingularityGem,
    #[serde(rename = "S7_NEUTRON")]
    NeutronCrystal,
    #[serde(rename = "WILD")]
    Wild,
    #[serde(rename = "SCATTER")]
    Scatter,
}

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Regular paying symbol, can seed a cluster
    Paying,
    /// Substitutes for any paying symbol, never seeds
    Wild,
    /// Never clusters, counted for triggers
    Scatter,
}

impl SymbolId {
    /// Every symbol, paying symbols first
    pub const ALL: [SymbolId; 9] = [
        SymbolId::VoidShard,
        SymbolId::NebulaCore,
        SymbolId::PlasmaOrb,
        SymbolId::StellarFragment,
        SymbolId::DarkMatter,
        SymbolId::SingularityGem,
        SymbolId::NeutronCrystal,
        SymbolId::Wild,
        SymbolId::Scatter,
    ];

    /// Paying symbols only
    pub const PAYING: [SymbolId; 7] = [
        SymbolId::VoidShard,
        SymbolId::NebulaCore,
        SymbolId::PlasmaOrb,
        SymbolId::StellarFragment,
        SymbolId::DarkMatter,
        SymbolId::SingularityGem,
        SymbolId::NeutronCrystal,
    ];

    /// Stable key (matches the serialized form)
    pub fn key(&self) -> &'static str {
        match self {
            Self::VoidShard => "S1_VOID_SHARD",
            Self::NebulaCore => "S2_NEBULA_CORE",
            Self::PlasmaOrb => "S3_PLASMA_ORB",
            Self::StellarFragment => "S4_STELLAR_FRAG",
            Self::DarkMatter => "S5_DARK_MATTER",
            Self::SingularityGem => "S6_SINGULARITY",
            Self::NeutronCrystal => "S7_NEUTRON",
            Self::Wild => "WILD",
            Self::Scatter => "SCATTER",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::VoidShard => "Void Shard",
            Self::NebulaCore => "Nebula Core",
            Self::PlasmaOrb => "Plasma Orb",
            Self::StellarFragment => "Stellar Fragment",
            Self::DarkMatter => "Dark Matter",
            Self::SingularityGem => "Singularity Gem",
            Self::NeutronCrystal => "Neutron Crystal",
            Self::Wild => "Wild",
            Self::Scatter => "Scatter",
        }
    }

    /// One-character code used by grid dumps
    pub fn code(&self) -> char {
        match self {
            Self::VoidShard => '1',
            Self::NebulaCore => '2',
            Self::PlasmaOrb => '3',
            Self::StellarFragment => '4',
            Self::DarkMatter => '5',
            Self::SingularityGem => '6',
            Self::NeutronCrystal => '7',
            Self::Wild => 'W',
            Self::Scatter => 'S',
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Self::Wild => SymbolKind::Wild,
            Self::Scatter => SymbolKind::Scatter,
            _ => SymbolKind::Paying,
        }
    }

    pub fn is_paying(&self) -> bool {
        self.kind() == SymbolKind::Paying
    }

    pub fn is_wild(&self) -> bool {
        *self == Self::Wild
    }

    pub fn is_scatter(&self) -> bool {
        *self == Self::Scatter
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SymbolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|id| id.key().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown symbol: {s}"))
    }
}

/// Weight and pay vector for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Symbol identifier
    pub id: SymbolId,
    /// Relative generation weight
    pub weight: u32,
    /// Bet multipliers per cluster tier (5-7, 8-11, 12-15, 16+).
    /// `None` for WILD and SCATTER.
    #[serde(default)]
    pub pays: Option<[f64; 4]>,
}

impl SymbolDef {
    /// Paying symbol
    pub fn paying(id: SymbolId, weight: u32, pays: [f64; 4]) -> Self {
        Self {
            id,
            weight,
            pays: Some(pays),
        }
    }

    /// Special symbol without a pay row
    pub fn special(id: SymbolId, weight: u32) -> Self {
        Self {
            id,
            weight,
            pays: None,
        }
    }
}

/// Weighted symbol table used for generation and pays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    pub symbols: Vec<SymbolDef>,
}

impl SymbolTable {
    /// Standard Singularity table
    pub fn standard() -> Self {
        let symbols = vec![
            SymbolDef::paying(SymbolId::VoidShard, 8, [0.5, 1.0, 3.0, 10.0]),
            SymbolDef::paying(SymbolId::NebulaCore, 8, [0.5, 1.0, 3.0, 10.0]),
            SymbolDef::paying(SymbolId::PlasmaOrb, 7, [0.8, 2.0, 5.0, 25.0]),
            SymbolDef::paying(SymbolId::StellarFragment, 6, [1.0, 3.0, 8.0, 50.0]),
            SymbolDef::paying(SymbolId::DarkMatter, 6, [1.0, 3.0, 8.0, 50.0]),
            SymbolDef::paying(SymbolId::SingularityGem, 4, [2.0, 5.0, 15.0, 100.0]),
            SymbolDef::paying(SymbolId::NeutronCrystal, 3, [3.0, 8.0, 25.0, 200.0]),
            SymbolDef::special(SymbolId::Wild, 2),
            SymbolDef::special(SymbolId::Scatter, 1),
        ];

        Self { symbols }
    }

    /// Get a symbol definition
    pub fn get(&self, id: SymbolId) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Pay vector for a symbol, if it has one
    pub fn pays(&self, id: SymbolId) -> Option<&[f64; 4]> {
        self.get(id).and_then(|s| s.pays.as_ref())
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u32 {
        self.symbols.iter().map(|s| s.weight).sum()
    }

    /// Draw one symbol: cumulative-weight scan against a uniform draw in
    /// `[0, total_weight)`.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolId {
        let total = self.total_weight();
        if total == 0 {
            return self
                .symbols
                .first()
                .map(|s| s.id)
                .unwrap_or(SymbolId::VoidShard);
        }

        let mut roll = rng.random_range(0..total);
        for def in &self.symbols {
            if roll < def.weight {
                return def.id;
            }
            roll -= def.weight;
        }

        // Unreachable while roll < total
        self.symbols[0].id
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

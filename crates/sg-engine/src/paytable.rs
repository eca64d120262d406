//! Paytable and cluster win calculation

use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStep;
use crate::cluster::{Cluster, MIN_CLUSTER_SIZE};
use crate::symbols::{SymbolId, SymbolTable};

/// Cluster size bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayTier {
    /// 5-7 cells
    Small,
    /// 8-11 cells
    Medium,
    /// 12-15 cells
    Large,
    /// 16+ cells
    Massive,
}

impl PayTier {
    /// Tier for a cluster size, `None` below the minimum cluster size
    pub fn from_cluster_size(size: usize) -> Option<Self> {
        match size {
            s if s >= 16 => Some(Self::Massive),
            s if s >= 12 => Some(Self::Large),
            s if s >= 8 => Some(Self::Medium),
            s if s >= MIN_CLUSTER_SIZE => Some(Self::Small),
            _ => None,
        }
    }

    /// Index into a symbol's pay vector
    pub fn index(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::Massive => 3,
        }
    }
}

/// Pay-vector index for a cluster size (sizes below 5 clamp to tier 0)
pub fn pay_tier(size: usize) -> usize {
    PayTier::from_cluster_size(size).map_or(0, PayTier::index)
}

/// Win from one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterWin {
    pub symbol: SymbolId,
    pub size: usize,
    pub tier: usize,
    /// Bet multiplier from the pay vector
    pub multiplier: f64,
    /// `multiplier × bet`
    pub win: f64,
}

/// Win from one cascade step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepWin {
    /// Sum of cluster multipliers
    pub multiplier: f64,
    pub cluster_wins: Vec<ClusterWin>,
    /// Product of activated bubble values (1 when none)
    pub bubble_multiplier: u32,
    /// `multiplier × bet × bubble_multiplier`
    pub win: f64,
}

impl StepWin {
    /// Apply a bubble multiplier to this step
    pub fn apply_bubbles(&mut self, bubble_multiplier: u32) {
        self.bubble_multiplier = bubble_multiplier.max(1);
        let base: f64 = self.cluster_wins.iter().map(|c| c.win).sum();
        self.win = base * f64::from(self.bubble_multiplier);
    }
}

/// Win breakdown for a whole spin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinSummary {
    pub total_win: f64,
    pub steps: Vec<StepWin>,
}

impl WinSummary {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    /// Win-to-bet ratio
    pub fn win_ratio(&self, bet: f64) -> f64 {
        if bet > 0.0 { self.total_win / bet } else { 0.0 }
    }

    /// Recompute the total after step wins were modified
    pub fn recompute_total(&mut self) {
        self.total_win = self.steps.iter().map(|s| s.win).sum();
    }
}

/// Cluster pay calculator over a symbol table
#[derive(Debug, Clone, Default)]
pub struct PayTable {
    symbols: SymbolTable,
}

impl PayTable {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Bet multiplier for one cluster (0 when the symbol has no pay row)
    pub fn cluster_pay(&self, cluster: &Cluster) -> f64 {
        self.symbols
            .pays(cluster.symbol)
            .map_or(0.0, |pays| pays[pay_tier(cluster.size())])
    }

    /// Win for the clusters of one step
    pub fn calculate_step_win(&self, clusters: &[Cluster], bet: f64) -> StepWin {
        let cluster_wins: Vec<ClusterWin> = clusters
            .iter()
            .map(|cluster| {
                let multiplier = self.cluster_pay(cluster);
                ClusterWin {
                    symbol: cluster.symbol,
                    size: cluster.size(),
                    tier: pay_tier(cluster.size()),
                    multiplier,
                    win: multiplier * bet,
                }
            })
            .collect();

        let multiplier = cluster_wins.iter().map(|c| c.multiplier).sum::<f64>();
        StepWin {
            multiplier,
            win: multiplier * bet,
            cluster_wins,
            bubble_multiplier: 1,
        }
    }

    /// Win for a whole cascade sequence
    pub fn calculate_total_win(&self, steps: &[CascadeStep], bet: f64) -> WinSummary {
        let steps: Vec<StepWin> = steps
            .iter()
            .map(|step| self.calculate_step_win(&step.clusters, bet))
            .collect();
        let total_win = steps.iter().map(|s| s.win).sum();
        WinSummary { total_win, steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;
    use approx::assert_relative_eq;

    fn cluster(symbol: SymbolId, size: usize) -> Cluster {
        Cluster {
            symbol,
            cells: (0..size).map(|i| Position::new(i / 7, i % 7)).collect(),
            has_wild: false,
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(PayTier::from_cluster_size(4), None);
        assert_eq!(pay_tier(5), 0);
        assert_eq!(pay_tier(7), 0);
        assert_eq!(pay_tier(8), 1);
        assert_eq!(pay_tier(11), 1);
        assert_eq!(pay_tier(12), 2);
        assert_eq!(pay_tier(15), 2);
        assert_eq!(pay_tier(16), 3);
        assert_eq!(pay_tier(45), 3);
    }

    #[test]
    fn test_cluster_pay_by_tier() {
        let table = PayTable::default();
        assert_relative_eq!(table.cluster_pay(&cluster(SymbolId::NeutronCrystal, 7)), 3.0);
        assert_relative_eq!(table.cluster_pay(&cluster(SymbolId::NeutronCrystal, 8)), 8.0);
        assert_relative_eq!(table.cluster_pay(&cluster(SymbolId::NeutronCrystal, 12)), 25.0);
        assert_relative_eq!(table.cluster_pay(&cluster(SymbolId::PlasmaOrb, 20)), 25.0);
        assert_relative_eq!(table.cluster_pay(&cluster(SymbolId::Wild, 6)), 0.0);
    }

    #[test]
    fn test_step_win_sums_clusters() {
        let table = PayTable::default();
        let clusters = [
            cluster(SymbolId::VoidShard, 5),
            cluster(SymbolId::SingularityGem, 9),
        ];
        let step = table.calculate_step_win(&clusters, 2.0);
        assert_relative_eq!(step.multiplier, 0.5 + 5.0);
        assert_relative_eq!(step.win, 11.0);
        assert_eq!(step.cluster_wins.len(), 2);
        assert_eq!(step.cluster_wins[1].tier, 1);
    }

    #[test]
    fn test_bubble_multiplier_scales_step() {
        let table = PayTable::default();
        let mut step = table.calculate_step_win(&[cluster(SymbolId::DarkMatter, 5)], 1.0);
        step.apply_bubbles(10);
        assert_eq!(step.bubble_multiplier, 10);
        assert_relative_eq!(step.win, 10.0);

        step.apply_bubbles(0);
        assert_eq!(step.bubble_multiplier, 1);
        assert_relative_eq!(step.win, 1.0);
    }

    #[test]
    fn test_total_win_over_cascade_chain() {
        use crate::cascade::resolve_cascades;
        use crate::generator::{ForcedOutcome, generate_grid};
        use crate::grid::GridSize;
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        let table = PayTable::default();
        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut grid = generate_grid(GridSize::Base, table.symbols(), &mut rng);
            ForcedOutcome::CascadeChain.apply(&mut grid);
            let steps = resolve_cascades(&grid, table.symbols(), 50, &mut rng);
            assert!(steps.len() >= 2);

            let summary = table.calculate_total_win(&steps, 2.0);
            assert_eq!(summary.steps.len(), steps.len());
            let sum: f64 = summary.steps.iter().map(|s| s.win).sum();
            assert_relative_eq!(summary.total_win, sum);

            for (step, win) in steps.iter().zip(&summary.steps) {
                assert_eq!(win.cluster_wins.len(), step.clusters.len());
                assert_eq!(win.bubble_multiplier, 1);
                for (cluster, cw) in step.clusters.iter().zip(&win.cluster_wins) {
                    assert_eq!(cw.tier, pay_tier(cluster.size()));
                    assert_relative_eq!(cw.multiplier, table.cluster_pay(cluster));
                    assert_relative_eq!(cw.win, cw.multiplier * 2.0);
                }
            }

            // S4 x5 pays 1x, then the S2 x5 assembled by gravity pays 0.5x
            let first = &summary.steps[0].cluster_wins;
            assert_eq!(first.len(), 1);
            assert_eq!(first[0].symbol, SymbolId::StellarFragment);
            assert_eq!(first[0].tier, 0);
            assert_relative_eq!(summary.steps[0].win, 2.0);
            assert!(summary.steps[1].cluster_wins.iter().any(|cw| {
                cw.symbol == SymbolId::NebulaCore && cw.size == 5 && cw.tier == 0 && cw.multiplier == 0.5
            }));
            assert!(summary.total_win >= 3.0);
        }
    }

    #[test]
    fn test_empty_steps_win_nothing() {
        let table = PayTable::default();
        let summary = table.calculate_total_win(&[], 1.0);
        assert!(!summary.is_win());
        assert_relative_eq!(summary.win_ratio(1.0), 0.0);
        assert_relative_eq!(summary.win_ratio(0.0), 0.0);
    }
}

#![deny(warnings)]

//! Economic models for Venture League rounds.
//!
//! This crate provides the pure math behind a round: attractiveness scoring,
//! softmax share allocation with per-team capping, price-elastic demand,
//! cost/profit breakdowns, and windfall damping. Every function is total
//! over f64 — degenerate numeric inputs degrade to safe defaults instead of
//! erroring, so the round pipeline never has a failure path of its own.

use sim_core::{
    AudienceSegment, ComponentScores, CostParams, SeasonParameters, TeamDecision, Weights,
};

/// Clamp `value` into `[min, max]`; NaN collapses to `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Price attractiveness in [0, 1] relative to the season reference price.
///
/// The score is 1 at or below the reference price and falls linearly to 0 at
/// 1.5x the reference price. The reference is floored at 0.01 so a degenerate
/// season cannot divide by zero.
///
/// Example:
/// assert_eq!(price_score(75.0, 50.0), 0.0);
pub fn price_score(price: f64, ref_price: f64) -> f64 {
    let safe_ref = ref_price.max(0.01);
    clamp(1.0 - (price - safe_ref) / (0.5 * safe_ref), 0.0, 1.0)
}

/// Marketing attractiveness in [0, 1] with diminishing returns on spend.
///
/// Uses log1p so the first currency units of spend matter most; a segment
/// boost amplifies the curve linearly before clamping.
pub fn marketing_score(spend: f64, boost: f64) -> f64 {
    clamp((1.0 + boost) * spend.max(0.0).ln_1p() / 10.0, 0.0, 1.0)
}

/// Base weights tuned by a segment's per-dimension deltas.
///
/// An absent segment leaves the base weights untouched.
pub fn tuned_weights(base: &Weights, segment: Option<&AudienceSegment>) -> Weights {
    let deltas = segment.map(|s| s.weight_deltas).unwrap_or_default();
    Weights {
        price: base.price + deltas.price,
        quality: base.quality + deltas.quality,
        marketing: base.marketing + deltas.marketing,
        cx: base.cx + deltas.cx,
    }
}

/// A team's attractiveness: the weighted linear value plus the version
/// adjusted by launch/brand multipliers, with the component scores retained
/// for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attractiveness {
    /// Normalized component scores.
    pub scores: ComponentScores,
    /// Weighted linear combination of the component scores.
    pub ea_linear: f64,
    /// `ea_linear` scaled by `(1 + launch) * (1 + brand)`.
    pub ea: f64,
}

/// Compute a team's attractiveness against tuned weights.
///
/// Quality and customer experience arrive on a 0-100 scale and are
/// normalized to [0, 1]. Launch/brand multipliers default to 0 when absent
/// or non-finite.
pub fn compute_ea(
    weights: &Weights,
    team: &TeamDecision,
    ref_price: f64,
    segment: Option<&AudienceSegment>,
) -> Attractiveness {
    let boost = segment
        .and_then(|s| s.marketing_boost)
        .filter(|b| b.is_finite())
        .unwrap_or(0.0);
    let scores = ComponentScores {
        price: price_score(team.price, ref_price),
        quality: clamp(team.quality / 100.0, 0.0, 1.0),
        marketing: marketing_score(team.marketing_spend, boost),
        cx: clamp(team.cx / 100.0, 0.0, 1.0),
    };
    let ea_linear = weights.price * scores.price
        + weights.quality * scores.quality
        + weights.marketing * scores.marketing
        + weights.cx * scores.cx;
    let launch = team.launch_ea.filter(|v| v.is_finite()).unwrap_or(0.0);
    let brand = team.brand_ea.filter(|v| v.is_finite()).unwrap_or(0.0);
    Attractiveness {
        scores,
        ea_linear,
        ea: ea_linear * (1.0 + launch) * (1.0 + brand),
    }
}

/// Softmax over attractiveness values with temperature `beta`.
///
/// Empty input yields empty output. A non-finite beta falls back to 1. The
/// max scaled value is subtracted before exponentiating for numerical
/// stability; a degenerate zero exponential mass falls back to equal shares.
pub fn softmax(values: &[f64], beta: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let beta = if beta.is_finite() { beta } else { 1.0 };
    let scaled: Vec<f64> = values.iter().map(|v| v * beta).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 || sum.is_nan() {
        let equal = 1.0 / values.len() as f64;
        return vec![equal; values.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

/// Enforce a per-entry ceiling on a share vector by iterative redistribution.
///
/// Entries whose proportional claim on the remaining total exceeds the cap
/// are fixed at exactly the cap; the rest re-split what remains, proportional
/// to their original values. The pass count is bounded by `len + 1`, and a
/// final pass hands any rounding shortfall to still-flexible entries, each
/// bounded by the cap. A cap below `1/len` cannot reach a total of 1; that
/// deficit is left for the caller's renormalization.
pub fn cap_shares(shares: &[f64], cap: Option<f64>) -> Vec<f64> {
    let Some(cap) = cap else {
        return shares.to_vec();
    };
    if shares.is_empty() {
        return Vec::new();
    }
    let cap = clamp(cap, 0.0, 1.0);
    let n = shares.len();
    let mut out = shares.to_vec();
    let mut active = vec![true; n];
    let mut remaining = 1.0_f64;
    for _ in 0..n + 1 {
        let active_sum: f64 = (0..n).filter(|&i| active[i]).map(|i| shares[i]).sum();
        let active_count = active.iter().filter(|&&a| a).count();
        if active_count == 0 {
            break;
        }
        let mut proposals = vec![0.0_f64; n];
        for (i, proposal) in proposals.iter_mut().enumerate() {
            if !active[i] {
                continue;
            }
            *proposal = if active_sum > 0.0 {
                shares[i] / active_sum * remaining
            } else {
                remaining / active_count as f64
            };
        }
        let mut fixed_this_pass = false;
        for i in 0..n {
            if active[i] && proposals[i] > cap + 1e-9 {
                out[i] = cap;
                active[i] = false;
                remaining -= cap;
                fixed_this_pass = true;
            }
        }
        if !fixed_this_pass {
            for i in 0..n {
                if active[i] {
                    out[i] = proposals[i];
                }
            }
            break;
        }
    }
    let total: f64 = out.iter().sum();
    if 1.0 - total > 1e-9 {
        let flexible: Vec<usize> = (0..n).filter(|&i| active[i]).collect();
        if !flexible.is_empty() {
            let add = (1.0 - total) / flexible.len() as f64;
            for i in flexible {
                out[i] = (out[i] + add).min(cap);
            }
        }
    }
    out
}

/// Renormalize shares to sum to 1, equal split when the total is not positive.
pub fn normalize_shares(shares: &[f64]) -> Vec<f64> {
    if shares.is_empty() {
        return Vec::new();
    }
    let total: f64 = shares.iter().sum();
    if total <= 0.0 {
        let equal = 1.0 / shares.len() as f64;
        return vec![equal; shares.len()];
    }
    shares.iter().map(|s| s / total).collect()
}

/// Full share allocation: softmax, cap enforcement, then renormalization.
pub fn allocate_shares(values: &[f64], beta: f64, cap: Option<f64>) -> Vec<f64> {
    let shares = softmax(values, beta);
    let capped = cap_shares(&shares, cap);
    normalize_shares(&capped)
}

/// Unconstrained demand for one team under constant price elasticity.
///
/// Q = market_size * share * (ref_price / price)^elasticity, with both
/// prices floored at 0.01. Elasticity 1 is the standard curve; higher values
/// punish above-reference pricing harder.
///
/// Example:
/// assert_eq!(demand_raw(10_000.0, 0.3, 50.0, 50.0, 1.4), 3_000.0);
pub fn demand_raw(
    market_size: f64,
    share: f64,
    price: f64,
    ref_price: f64,
    elasticity: f64,
) -> f64 {
    let safe_ref = ref_price.max(0.01);
    let safe_price = price.max(0.01);
    market_size * share * (safe_ref / safe_price).powf(elasticity)
}

/// Outcome of clipping demand to capacity and to the shared market pool.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SalesOutcome {
    /// Units sold per team, in input order.
    pub sales: Vec<f64>,
    /// Whether raw demand exceeded the team's effective capacity.
    pub capacity_bound: Vec<bool>,
}

/// Clip each team's demand to its capacity, then rescale the whole cohort if
/// preliminary sales exceed the market size.
///
/// Non-finite capacities count as 0. The rescale keeps aggregate sales within
/// the total addressable market even when individual capacities would allow
/// more.
pub fn resolve_sales(market_size: f64, demands: &[f64], capacities: &[f64]) -> SalesOutcome {
    let mut sales = Vec::with_capacity(demands.len());
    let mut capacity_bound = Vec::with_capacity(demands.len());
    for (&demand, &capacity) in demands.iter().zip(capacities) {
        let effective = if capacity.is_finite() {
            capacity.max(0.0)
        } else {
            0.0
        };
        capacity_bound.push(demand > effective);
        sales.push(demand.min(effective));
    }
    let total: f64 = sales.iter().sum();
    if market_size > 0.0 && total > market_size {
        let scale = market_size / total;
        for s in &mut sales {
            *s *= scale;
        }
    }
    SalesOutcome {
        sales,
        capacity_bound,
    }
}

/// Variable cost per unit: base plus a quality surcharge minus an efficiency
/// rebate, floored at 0.
pub fn unit_cost(team: &TeamDecision, costs: &CostParams) -> f64 {
    let quality = costs.quality_cost_slope * (team.quality / 100.0);
    let efficiency = costs.efficiency_cost_slope * (team.efficiency / 100.0);
    (costs.base_unit_cost + quality - efficiency).max(0.0)
}

/// Per-team cost and profit components before damping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfitBreakdown {
    /// Variable cost per unit.
    pub unit_cost: f64,
    /// Revenue from sales.
    pub revenue: f64,
    /// Total variable cost.
    pub variable_cost: f64,
    /// Marketing cost.
    pub marketing_cost: f64,
    /// Fixed cost.
    pub fixed_cost: f64,
    /// Benefit cost.
    pub benefit_cost: f64,
    /// Profit before damping.
    pub profit_raw: f64,
    /// The team is selling below unit cost.
    pub price_risk: bool,
}

/// Full cost/profit breakdown for one team, independent of the others.
///
/// Revenue substitutes the reference price when the team price is
/// non-positive or non-finite; marketing, fixed, and benefit costs are
/// floored at 0. A finite per-team benefit override wins over the season
/// value.
pub fn profit_breakdown(
    team: &TeamDecision,
    sales: f64,
    season: &SeasonParameters,
) -> ProfitBreakdown {
    let unit = unit_cost(team, &season.costs);
    let effective_price = if team.price.is_finite() && team.price > 0.0 {
        team.price
    } else {
        season.ref_price
    };
    let revenue = sales * effective_price;
    let variable_cost = unit * sales;
    let marketing_cost = team.marketing_spend.max(0.0);
    let fixed_cost = season.costs.fixed_team_cost.max(0.0);
    let benefit_cost = match team.benefit_cost {
        Some(b) if b.is_finite() => b.max(0.0),
        _ => season.costs.benefit_cost.unwrap_or(0.0).max(0.0),
    };
    let profit_raw = revenue - variable_cost - marketing_cost - fixed_cost - benefit_cost;
    ProfitBreakdown {
        unit_cost: unit,
        revenue,
        variable_cost,
        marketing_cost,
        fixed_cost,
        benefit_cost,
        profit_raw,
        price_risk: unit > team.price,
    }
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Dampen windfall profits above a median + alpha * MAD threshold.
///
/// Profits strictly above the threshold are pulled halfway back toward it;
/// everything at or below passes through unchanged. Alpha <= 0 disables
/// damping. This caps runaway winners without equalizing the cohort.
pub fn windfall_damping(profits: &[f64], alpha: f64) -> Vec<f64> {
    if alpha <= 0.0 || profits.is_empty() {
        return profits.to_vec();
    }
    let mut sorted = profits.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = median_sorted(&sorted);
    let mut deviations: Vec<f64> = profits.iter().map(|p| (p - median).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    let mad = median_sorted(&deviations);
    let threshold = median + alpha * mad;
    profits
        .iter()
        .map(|&p| {
            if p > threshold {
                threshold + (p - threshold) * 0.5
            } else {
                p
            }
        })
        .collect()
}

/// A positive profit split into its reinvestment and cash portions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfitSplit {
    /// Portion earmarked for reinvestment.
    pub reinvest: f64,
    /// Portion flowing to the team's cash balance.
    pub cash_to_final: f64,
}

/// Split a final profit by the season reinvest rate.
///
/// Losses are not redistributed: non-positive profit yields (0, 0).
///
/// Example:
/// assert_eq!(split_profit(1000.0, 0.2), ProfitSplit { reinvest: 200.0, cash_to_final: 800.0 });
pub fn split_profit(profit: f64, reinvest_rate: f64) -> ProfitSplit {
    if profit <= 0.0 {
        return ProfitSplit::default();
    }
    let reinvest = profit * reinvest_rate;
    ProfitSplit {
        reinvest,
        cash_to_final: profit - reinvest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{RuleParams, WeightDeltas};

    fn season() -> SeasonParameters {
        SeasonParameters {
            ref_price: 50.0,
            beta: 1.1,
            share_cap: Some(0.55),
            damping_alpha: Some(2.5),
            noise_std: None,
            weights: Weights {
                price: 0.35,
                quality: 0.30,
                marketing: 0.20,
                cx: 0.15,
            },
            costs: CostParams {
                base_unit_cost: 18.0,
                quality_cost_slope: 10.0,
                efficiency_cost_slope: 6.0,
                fixed_team_cost: 12_000.0,
                benefit_cost: Some(1_500.0),
            },
            rules: RuleParams { reinvest_rate: 0.2 },
        }
    }

    fn team() -> TeamDecision {
        TeamDecision {
            id: "a".to_string(),
            name: "Team A".to_string(),
            segment_id: None,
            price: 48.0,
            marketing_spend: 5_000.0,
            capacity: 9_000.0,
            quality: 70.0,
            efficiency: 60.0,
            cx: 55.0,
            launch_ea: None,
            brand_ea: None,
            benefit_cost: None,
            reinvest_budget: None,
            cash: None,
        }
    }

    #[test]
    fn clamp_collapses_nan_to_min() {
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.4, 0.0, 1.0), 0.4);
    }

    #[test]
    fn price_score_anchor_points() {
        assert_eq!(price_score(0.0, 50.0), 1.0);
        assert_eq!(price_score(50.0, 50.0), 1.0);
        assert_eq!(price_score(62.5, 50.0), 0.5);
        assert_eq!(price_score(75.0, 50.0), 0.0);
        assert_eq!(price_score(100.0, 50.0), 0.0);
    }

    #[test]
    fn price_score_survives_degenerate_ref_price() {
        // Floored reference keeps the score bounded instead of exploding.
        let s = price_score(10.0, 0.0);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn marketing_score_diminishing_and_boosted() {
        assert_eq!(marketing_score(0.0, 0.0), 0.0);
        assert_eq!(marketing_score(-100.0, 0.0), 0.0);
        let base = marketing_score(5_000.0, 0.0);
        let boosted = marketing_score(5_000.0, 0.2);
        assert!(boosted > base);
        let first = marketing_score(1_000.0, 0.0);
        let second = marketing_score(2_000.0, 0.0) - first;
        assert!(second < first);
        assert_eq!(marketing_score(1.0e9, 0.0), 1.0);
    }

    #[test]
    fn tuned_weights_add_segment_deltas() {
        let base = season().weights;
        let seg = AudienceSegment {
            id: "students".to_string(),
            weight_deltas: WeightDeltas {
                price: 0.1,
                marketing: -0.05,
                ..WeightDeltas::default()
            },
            elasticity: 1.4,
            marketing_boost: None,
        };
        let tuned = tuned_weights(&base, Some(&seg));
        assert_eq!(tuned.price, base.price + 0.1);
        assert_eq!(tuned.marketing, base.marketing - 0.05);
        assert_eq!(tuned.quality, base.quality);
        assert_eq!(tuned_weights(&base, None), base);
    }

    #[test]
    fn compute_ea_applies_multipliers() {
        let s = season();
        let mut t = team();
        let plain = compute_ea(&s.weights, &t, s.ref_price, None);
        assert!(plain.ea_linear > 0.0);
        assert_eq!(plain.ea, plain.ea_linear);
        t.launch_ea = Some(0.1);
        t.brand_ea = Some(0.05);
        let bumped = compute_ea(&s.weights, &t, s.ref_price, None);
        let expected = bumped.ea_linear * 1.1 * 1.05;
        assert!((bumped.ea - expected).abs() < 1e-12);
    }

    #[test]
    fn softmax_is_a_distribution() {
        let shares = softmax(&[0.4, 0.7, 0.55], 1.1);
        let total: f64 = shares.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(shares[1] > shares[2] && shares[2] > shares[0]);
    }

    #[test]
    fn softmax_equal_inputs_split_equally() {
        let shares = softmax(&[0.5, 0.5, 0.5], 2.0);
        for s in shares {
            assert!((s - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_beta_sharpens() {
        let soft = softmax(&[0.4, 0.8], 1.0);
        let sharp = softmax(&[0.4, 0.8], 5.0);
        assert!(sharp[1] > soft[1]);
    }

    #[test]
    fn softmax_non_finite_beta_defaults_to_one() {
        assert_eq!(softmax(&[0.4, 0.8], f64::NAN), softmax(&[0.4, 0.8], 1.0));
        assert!(softmax(&[], 1.0).is_empty());
    }

    #[test]
    fn cap_shares_none_is_passthrough() {
        let shares = [0.6, 0.3, 0.1];
        assert_eq!(cap_shares(&shares, None), shares.to_vec());
    }

    #[test]
    fn cap_shares_enforces_ceiling_and_total() {
        let out = cap_shares(&[0.6, 0.3, 0.1], Some(0.55));
        let total: f64 = out.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        for s in &out {
            assert!(*s <= 0.55 + 1e-9);
        }
        assert_eq!(out[0], 0.55);
        // The freed 0.05 lands proportionally on the flexible entries.
        assert!(out[1] > 0.3 && out[2] > 0.1);
    }

    #[test]
    fn cap_below_equal_split_leaves_deficit() {
        // With two entries and cap 0.3 a total of 1 is unreachable; the
        // capping step leaves the deficit for downstream renormalization.
        let out = cap_shares(&[0.5, 0.5], Some(0.3));
        assert_eq!(out, vec![0.3, 0.3]);
    }

    #[test]
    fn allocate_shares_always_sums_to_one() {
        let shares = allocate_shares(&[0.4, 0.7, 0.55], 1.1, Some(0.55));
        let total: f64 = shares.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_shares_equal_split_on_zero_mass() {
        assert_eq!(normalize_shares(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(normalize_shares(&[1.0, 3.0]), vec![0.25, 0.75]);
    }

    #[test]
    fn demand_identity_at_ref_price() {
        assert_eq!(demand_raw(10_000.0, 0.3, 50.0, 50.0, 1.0), 3_000.0);
        assert_eq!(demand_raw(10_000.0, 0.3, 50.0, 50.0, 1.4), 3_000.0);
    }

    #[test]
    fn demand_elasticity_punishes_high_prices() {
        let standard = demand_raw(10_000.0, 0.3, 60.0, 50.0, 1.0);
        let sensitive = demand_raw(10_000.0, 0.3, 60.0, 50.0, 2.0);
        assert!(standard < 3_000.0);
        assert!(sensitive < standard);
        let discounted = demand_raw(10_000.0, 0.3, 40.0, 50.0, 1.0);
        assert!(discounted > 3_000.0);
    }

    #[test]
    fn demand_price_floor_prevents_explosion() {
        let q = demand_raw(10_000.0, 0.3, 0.0, 50.0, 1.0);
        assert!(q.is_finite());
        assert_eq!(q, demand_raw(10_000.0, 0.3, 0.01, 50.0, 1.0));
    }

    #[test]
    fn resolve_sales_clips_and_flags() {
        let out = resolve_sales(100_000.0, &[5_000.0, 12_000.0], &[9_000.0, 9_000.0]);
        assert_eq!(out.sales, vec![5_000.0, 9_000.0]);
        assert_eq!(out.capacity_bound, vec![false, true]);
    }

    #[test]
    fn resolve_sales_rescales_oversubscribed_market() {
        let out = resolve_sales(10_000.0, &[6_000.0, 6_000.0], &[9_000.0, 9_000.0]);
        let total: f64 = out.sales.iter().sum();
        assert!((total - 10_000.0).abs() < 1e-6);
        assert_eq!(out.sales[0], out.sales[1]);
    }

    #[test]
    fn resolve_sales_treats_bad_capacity_as_zero() {
        let out = resolve_sales(10_000.0, &[500.0, 500.0], &[f64::NAN, -100.0]);
        assert_eq!(out.sales, vec![0.0, 0.0]);
        assert_eq!(out.capacity_bound, vec![true, true]);
    }

    #[test]
    fn unit_cost_slopes_and_floor() {
        let s = season();
        let mut t = team();
        // 18 + 10 * 0.7 - 6 * 0.6 = 21.4
        assert!((unit_cost(&t, &s.costs) - 21.4).abs() < 1e-12);
        t.quality = 0.0;
        t.efficiency = 100.0;
        let mut costs = s.costs;
        costs.base_unit_cost = 4.0;
        assert_eq!(unit_cost(&t, &costs), 0.0);
    }

    #[test]
    fn profit_breakdown_concrete() {
        let s = season();
        let t = team();
        let b = profit_breakdown(&t, 4_000.0, &s);
        assert!((b.revenue - 192_000.0).abs() < 1e-9);
        assert!((b.variable_cost - 85_600.0).abs() < 1e-9);
        assert_eq!(b.marketing_cost, 5_000.0);
        assert_eq!(b.fixed_cost, 12_000.0);
        assert_eq!(b.benefit_cost, 1_500.0);
        assert!((b.profit_raw - 87_900.0).abs() < 1e-9);
        assert!(!b.price_risk);
    }

    #[test]
    fn profit_breakdown_flags_selling_below_cost() {
        let s = season();
        let mut t = team();
        t.price = 10.0;
        let b = profit_breakdown(&t, 1_000.0, &s);
        assert!(b.price_risk);
    }

    #[test]
    fn profit_breakdown_benefit_override_wins() {
        let s = season();
        let mut t = team();
        t.benefit_cost = Some(0.0);
        assert_eq!(profit_breakdown(&t, 0.0, &s).benefit_cost, 0.0);
        t.benefit_cost = Some(f64::NAN);
        assert_eq!(profit_breakdown(&t, 0.0, &s).benefit_cost, 1_500.0);
        t.benefit_cost = Some(-50.0);
        assert_eq!(profit_breakdown(&t, 0.0, &s).benefit_cost, 0.0);
    }

    #[test]
    fn profit_breakdown_substitutes_ref_price_for_bad_price() {
        let s = season();
        let mut t = team();
        t.price = -5.0;
        let b = profit_breakdown(&t, 100.0, &s);
        assert_eq!(b.revenue, 100.0 * s.ref_price);
    }

    #[test]
    fn damping_off_is_identity() {
        let profits = [100.0, 2_000.0, -50.0];
        assert_eq!(windfall_damping(&profits, 0.0), profits.to_vec());
        assert_eq!(windfall_damping(&profits, -1.0), profits.to_vec());
        assert!(windfall_damping(&[], 2.0).is_empty());
    }

    #[test]
    fn damping_pulls_outlier_halfway_back() {
        // median 100, MAD 50, threshold with alpha 2 = 200.
        let profits = [50.0, 100.0, 150.0, 1_000.0, 100.0];
        let damped = windfall_damping(&profits, 2.0);
        assert_eq!(damped[0], 50.0);
        assert_eq!(damped[1], 100.0);
        assert_eq!(damped[2], 150.0);
        assert_eq!(damped[4], 100.0);
        assert_eq!(damped[3], 200.0 + (1_000.0 - 200.0) * 0.5);
    }

    #[test]
    fn split_profit_concrete() {
        assert_eq!(
            split_profit(1_000.0, 0.2),
            ProfitSplit {
                reinvest: 200.0,
                cash_to_final: 800.0
            }
        );
        assert_eq!(split_profit(-100.0, 0.2), ProfitSplit::default());
        assert_eq!(split_profit(0.0, 0.2), ProfitSplit::default());
    }

    proptest! {
        #[test]
        fn allocated_shares_sum_to_one_and_respect_feasible_caps(
            values in prop::collection::vec(0.0f64..5.0, 2..8),
            cap_slack in 0.05f64..1.0,
            beta in 0.1f64..5.0,
        ) {
            let n = values.len() as f64;
            // Any cap above 1/n is feasible for the cohort.
            let cap = (1.0 / n) + cap_slack * (1.0 - 1.0 / n);
            let shares = allocate_shares(&values, beta, Some(cap));
            let total: f64 = shares.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            for s in &shares {
                prop_assert!(*s <= cap + 1e-9);
            }
        }

        #[test]
        fn split_profit_partitions_positive_profit(
            profit in 0.01f64..1.0e9,
            rate in 0.0f64..=1.0,
        ) {
            let split = split_profit(profit, rate);
            prop_assert_eq!(split.reinvest, profit * rate);
            prop_assert!((split.reinvest + split.cash_to_final - profit).abs() <= profit * 1e-12);
        }

        #[test]
        fn damping_never_increases_any_profit(
            profits in prop::collection::vec(-1.0e6f64..1.0e6, 1..12),
            alpha in 0.0f64..5.0,
        ) {
            let damped = windfall_damping(&profits, alpha);
            prop_assert_eq!(damped.len(), profits.len());
            for (d, p) in damped.iter().zip(&profits) {
                prop_assert!(d <= p);
            }
        }

        #[test]
        fn sales_never_exceed_market_size(
            demands in prop::collection::vec(0.0f64..50_000.0, 1..10),
            market_size in 1.0f64..100_000.0,
        ) {
            let capacities = vec![30_000.0; demands.len()];
            let out = resolve_sales(market_size, &demands, &capacities);
            let total: f64 = out.sales.iter().sum();
            prop_assert!(total <= market_size + 1e-6);
        }
    }
}

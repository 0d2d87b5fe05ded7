#![deny(warnings)]

//! Round orchestration for Venture League.
//!
//! `compute_round` threads one request through the economic stages in order:
//! attractiveness per team, softmax/capped share allocation across the
//! cohort, price-elastic demand, capacity- and market-constrained sales,
//! cost/profit breakdowns, windfall damping, and the reinvest/cash split.
//! The whole pass is a pure function of the request — identical inputs
//! produce bit-identical output.

use sim_core::{
    AudienceSegment, RoundComputationResult, RoundFlags, RoundRequest, RoundTotals,
    TeamRoundResult,
};
use sim_econ::{
    allocate_shares, compute_ea, demand_raw, profit_breakdown, resolve_sales, split_profit,
    tuned_weights, windfall_damping, Attractiveness, ProfitBreakdown,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Compute one full round for a cohort of competing teams.
///
/// Teams in the result are sorted descending by final (damped) profit;
/// teams with exactly equal profit keep their request order.
pub fn compute_round(request: &RoundRequest) -> RoundComputationResult {
    let season = &request.season;
    let teams = &request.teams;
    debug!(
        round_id = %request.round.round_id,
        teams = teams.len(),
        "computing round"
    );

    let segments: BTreeMap<&str, &AudienceSegment> = request
        .segments
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();
    // Unknown segment ids fall back to base weights / elasticity 1 / no boost.
    let lookups: Vec<Option<&AudienceSegment>> = teams
        .iter()
        .map(|t| {
            t.segment_id
                .as_deref()
                .and_then(|id| segments.get(id).copied())
        })
        .collect();

    let attractiveness: Vec<Attractiveness> = teams
        .iter()
        .zip(&lookups)
        .map(|(team, segment)| {
            let weights = tuned_weights(&season.weights, *segment);
            compute_ea(&weights, team, season.ref_price, *segment)
        })
        .collect();

    let ea_values: Vec<f64> = attractiveness.iter().map(|a| a.ea).collect();
    let shares = allocate_shares(&ea_values, season.beta, season.share_cap);

    let demands: Vec<f64> = teams
        .iter()
        .zip(&lookups)
        .zip(&shares)
        .map(|((team, segment), &share)| {
            let elasticity = segment
                .map(|s| s.elasticity)
                .filter(|e| e.is_finite())
                .unwrap_or(1.0);
            demand_raw(
                request.round.market_size,
                share,
                team.price,
                season.ref_price,
                elasticity,
            )
        })
        .collect();
    let capacities: Vec<f64> = teams.iter().map(|t| t.capacity).collect();
    let outcome = resolve_sales(request.round.market_size, &demands, &capacities);

    let breakdowns: Vec<ProfitBreakdown> = teams
        .iter()
        .zip(&outcome.sales)
        .map(|(team, &sales)| profit_breakdown(team, sales, season))
        .collect();

    let raw_profits: Vec<f64> = breakdowns.iter().map(|b| b.profit_raw).collect();
    let alpha = season
        .damping_alpha
        .filter(|a| a.is_finite())
        .unwrap_or(0.0);
    let damped = windfall_damping(&raw_profits, alpha);

    let mut results: Vec<TeamRoundResult> = Vec::with_capacity(teams.len());
    for (i, team) in teams.iter().enumerate() {
        let b = &breakdowns[i];
        let profit = damped[i];
        let split = split_profit(profit, season.rules.reinvest_rate);
        let capacity = if team.capacity.is_finite() {
            team.capacity.max(0.0)
        } else {
            0.0
        };
        results.push(TeamRoundResult {
            team_id: team.id.clone(),
            name: team.name.clone(),
            scores: attractiveness[i].scores,
            ea_linear: attractiveness[i].ea_linear,
            ea: attractiveness[i].ea,
            share: shares[i],
            demand_raw: demands[i],
            capacity,
            sales: outcome.sales[i],
            revenue: b.revenue,
            unit_cost: b.unit_cost,
            variable_cost: b.variable_cost,
            marketing_cost: b.marketing_cost,
            fixed_cost: b.fixed_cost,
            benefit_cost: b.benefit_cost,
            profit_raw: b.profit_raw,
            profit,
            reinvest: split.reinvest,
            cash_to_final: split.cash_to_final,
            price: team.price,
            marketing_spend: team.marketing_spend,
            flags: RoundFlags {
                capacity_bound: outcome.capacity_bound[i],
                price_risk: b.price_risk,
                // The flag tracks the damped profit, not the raw one.
                negative_profit: profit <= 0.0,
            },
        });
    }

    results.sort_by(|a, b| b.profit.total_cmp(&a.profit));

    let totals = RoundTotals {
        market_size: request.round.market_size,
        share: results.iter().map(|r| r.share).sum(),
        demand: results.iter().map(|r| r.demand_raw).sum(),
        sales: results.iter().map(|r| r.sales).sum(),
        revenue: results.iter().map(|r| r.revenue).sum(),
        profit: results.iter().map(|r| r.profit).sum(),
    };

    RoundComputationResult {
        season: season.clone(),
        round: request.round.clone(),
        teams: results,
        totals,
    }
}

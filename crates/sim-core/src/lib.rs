#![deny(warnings)]

//! Core domain models and invariants for Venture League.
//!
//! This crate defines the serializable round request/result types shared
//! across the simulation, with validation helpers that enforce the
//! structural contract at the request boundary. The engine itself degrades
//! gracefully on odd numeric inputs; hard rejections live here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

fn default_beta() -> f64 {
    1.0
}

fn default_elasticity() -> f64 {
    1.0
}

/// Attractiveness weight vector over the four scored dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight on the price score.
    pub price: f64,
    /// Weight on the quality score.
    pub quality: f64,
    /// Weight on the marketing score.
    pub marketing: f64,
    /// Weight on the customer-experience score.
    pub cx: f64,
}

/// Per-dimension adjustments a segment adds on top of the base weights.
/// Dimensions absent from the payload deserialize as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDeltas {
    /// Delta on the price weight.
    #[serde(default)]
    pub price: f64,
    /// Delta on the quality weight.
    #[serde(default)]
    pub quality: f64,
    /// Delta on the marketing weight.
    #[serde(default)]
    pub marketing: f64,
    /// Delta on the customer-experience weight.
    #[serde(default)]
    pub cx: f64,
}

/// Cost-side season parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CostParams {
    /// Base variable cost per unit sold.
    pub base_unit_cost: f64,
    /// Extra unit cost per full quality scale (quality 100 adds the whole slope).
    pub quality_cost_slope: f64,
    /// Unit cost saved per full efficiency scale.
    pub efficiency_cost_slope: f64,
    /// Fixed cost charged to every team each round.
    pub fixed_team_cost: f64,
    /// Season-wide benefit cost per round; teams may override it.
    #[serde(default)]
    pub benefit_cost: Option<f64>,
}

/// Season rule parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RuleParams {
    /// Fraction of positive profit earmarked for reinvestment, in [0, 1].
    pub reinvest_rate: f64,
}

/// Parameters fixed for a whole season, shared by every round in it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonParameters {
    /// Reference price anchoring the price score and the demand curve.
    pub ref_price: f64,
    /// Softmax temperature for market-share allocation.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Optional per-team market-share ceiling in [0, 1].
    #[serde(default)]
    pub share_cap: Option<f64>,
    /// Optional windfall-damping strength; damping is off when absent or <= 0.
    #[serde(default)]
    pub damping_alpha: Option<f64>,
    /// Demand noise level carried in season config. The round engine is
    /// deterministic and does not consume it.
    #[serde(default)]
    pub noise_std: Option<f64>,
    /// Base attractiveness weights before segment tuning.
    pub weights: Weights,
    /// Cost parameters.
    pub costs: CostParams,
    /// Rule parameters.
    pub rules: RuleParams,
}

/// A targetable buyer cohort with its own weight tuning and price sensitivity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudienceSegment {
    /// Segment identifier, unique within a season (e.g. "students").
    pub id: String,
    /// Weight deltas added to the season base weights.
    #[serde(default)]
    pub weight_deltas: WeightDeltas,
    /// Demand price-sensitivity exponent (1 = standard, higher = more sensitive).
    #[serde(default = "default_elasticity")]
    pub elasticity: f64,
    /// Optional multiplier amplifying the marketing score for this cohort.
    #[serde(default)]
    pub marketing_boost: Option<f64>,
}

/// One team's submitted decisions for a round. The engine never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamDecision {
    /// Stable team identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Chosen audience segment; an unknown id falls back to season defaults.
    #[serde(default)]
    pub segment_id: Option<String>,
    /// Unit price.
    pub price: f64,
    /// Marketing spend for the round.
    pub marketing_spend: f64,
    /// Production capacity in units.
    pub capacity: f64,
    /// Product quality level (0-100).
    pub quality: f64,
    /// Operational efficiency level (0-100).
    pub efficiency: f64,
    /// Customer-experience level (0-100).
    pub cx: f64,
    /// Launch appeal multiplier (absent = 0).
    #[serde(default)]
    pub launch_ea: Option<f64>,
    /// Brand appeal multiplier (absent = 0).
    #[serde(default)]
    pub brand_ea: Option<f64>,
    /// Benefit cost overriding the season value when finite.
    #[serde(default)]
    pub benefit_cost: Option<f64>,
    /// Reinvestment budget declared by the team; informational passthrough.
    #[serde(default)]
    pub reinvest_budget: Option<f64>,
    /// Cash balance going into the round; informational passthrough.
    #[serde(default)]
    pub cash: Option<f64>,
}

/// Round-scoped context supplied by the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundContext {
    /// Opaque round identifier, echoed into the result.
    pub round_id: String,
    /// Total addressable demand in units for the round.
    pub market_size: f64,
}

/// The full input record for one round computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRequest {
    /// Season parameters in force.
    pub season: SeasonParameters,
    /// Audience segments teams may target.
    pub segments: Vec<AudienceSegment>,
    /// Competing teams' decisions.
    pub teams: Vec<TeamDecision>,
    /// Round context.
    pub round: RoundContext,
}

/// Normalized component scores behind a team's attractiveness, kept for
/// diagnostics and UI display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Price score in [0, 1].
    pub price: f64,
    /// Quality score in [0, 1].
    pub quality: f64,
    /// Marketing score in [0, 1].
    pub marketing: f64,
    /// Customer-experience score in [0, 1].
    pub cx: f64,
}

/// Boolean outcome flags per team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundFlags {
    /// Raw demand exceeded the team's capacity.
    pub capacity_bound: bool,
    /// Unit cost exceeded the sale price.
    pub price_risk: bool,
    /// Final (damped) profit is non-positive.
    pub negative_profit: bool,
}

/// All derived quantities for one team in one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamRoundResult {
    /// Team identifier.
    pub team_id: String,
    /// Display name.
    pub name: String,
    /// Component scores behind the attractiveness value.
    pub scores: ComponentScores,
    /// Weighted linear attractiveness.
    pub ea_linear: f64,
    /// Attractiveness after launch/brand multipliers.
    pub ea: f64,
    /// Allocated market share in [0, 1].
    pub share: f64,
    /// Unconstrained demand in units.
    pub demand_raw: f64,
    /// Effective capacity used for clipping.
    pub capacity: f64,
    /// Units sold after capacity and market constraints.
    pub sales: f64,
    /// Revenue from sales.
    pub revenue: f64,
    /// Variable cost per unit.
    pub unit_cost: f64,
    /// Total variable cost.
    pub variable_cost: f64,
    /// Marketing cost.
    pub marketing_cost: f64,
    /// Fixed cost.
    pub fixed_cost: f64,
    /// Benefit cost.
    pub benefit_cost: f64,
    /// Profit before windfall damping.
    pub profit_raw: f64,
    /// Final profit after windfall damping.
    pub profit: f64,
    /// Reinvestment portion of the final profit.
    pub reinvest: f64,
    /// Cash portion of the final profit.
    pub cash_to_final: f64,
    /// Echo of the team's unit price.
    pub price: f64,
    /// Echo of the team's marketing spend.
    pub marketing_spend: f64,
    /// Outcome flags.
    pub flags: RoundFlags,
}

/// Aggregate totals across the whole cohort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundTotals {
    /// Echo of the round's market size.
    pub market_size: f64,
    /// Sum of allocated shares.
    pub share: f64,
    /// Sum of unconstrained demand.
    pub demand: f64,
    /// Sum of units sold.
    pub sales: f64,
    /// Sum of revenue.
    pub revenue: f64,
    /// Sum of final profit.
    pub profit: f64,
}

/// The full output record for one round computation.
///
/// Teams are sorted descending by final profit; ties keep request order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundComputationResult {
    /// Echo of the season parameters.
    pub season: SeasonParameters,
    /// Echo of the round context.
    pub round: RoundContext,
    /// Per-team results.
    pub teams: Vec<TeamRoundResult>,
    /// Cohort totals.
    pub totals: RoundTotals,
}

/// Validation errors for round-request invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Reference price must be finite and strictly positive.
    #[error("reference price must be > 0")]
    NonPositiveRefPrice,
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Reinvest rate must lie within [0, 1].
    #[error("reinvest rate {0} is out of [0, 1]")]
    ReinvestRateOutOfRange(f64),
    /// Share cap must lie within [0, 1] when present.
    #[error("share cap {0} is out of [0, 1]")]
    ShareCapOutOfRange(f64),
    /// Base and fixed costs must be non-negative.
    #[error("negative cost parameter is invalid")]
    NegativeCost,
    /// Identifier must be non-empty.
    #[error("empty identifier")]
    EmptyId,
    /// Segment ids must be unique.
    #[error("duplicate segment id: {0}")]
    DuplicateSegmentId(String),
    /// Market size must be finite and non-negative.
    #[error("market size must be finite and >= 0")]
    InvalidMarketSize,
}

/// Validate season parameters.
pub fn validate_season(season: &SeasonParameters) -> Result<(), ValidationError> {
    if !season.ref_price.is_finite() || season.ref_price <= 0.0 {
        return Err(ValidationError::NonPositiveRefPrice);
    }
    let w = &season.weights;
    if !(w.price.is_finite() && w.quality.is_finite() && w.marketing.is_finite() && w.cx.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    let c = &season.costs;
    if !(c.base_unit_cost.is_finite()
        && c.quality_cost_slope.is_finite()
        && c.efficiency_cost_slope.is_finite()
        && c.fixed_team_cost.is_finite())
    {
        return Err(ValidationError::NonFinite);
    }
    if c.base_unit_cost < 0.0 || c.fixed_team_cost < 0.0 {
        return Err(ValidationError::NegativeCost);
    }
    let r = season.rules.reinvest_rate;
    if !r.is_finite() || !(0.0..=1.0).contains(&r) {
        return Err(ValidationError::ReinvestRateOutOfRange(r));
    }
    if let Some(cap) = season.share_cap {
        if !cap.is_finite() || !(0.0..=1.0).contains(&cap) {
            return Err(ValidationError::ShareCapOutOfRange(cap));
        }
    }
    Ok(())
}

/// Validate an audience segment.
pub fn validate_segment(segment: &AudienceSegment) -> Result<(), ValidationError> {
    if segment.id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if !segment.elasticity.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if let Some(boost) = segment.marketing_boost {
        if !boost.is_finite() {
            return Err(ValidationError::NonFinite);
        }
    }
    Ok(())
}

/// Validate a team decision record.
pub fn validate_team(team: &TeamDecision) -> Result<(), ValidationError> {
    if team.id.trim().is_empty() || team.name.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}

/// Validate a full round request, including cross-entity invariants like
/// segment-id uniqueness.
pub fn validate_request(request: &RoundRequest) -> Result<(), ValidationError> {
    validate_season(&request.season)?;
    let mut ids: BTreeSet<&str> = BTreeSet::new();
    for segment in &request.segments {
        validate_segment(segment)?;
        if !ids.insert(segment.id.as_str()) {
            return Err(ValidationError::DuplicateSegmentId(segment.id.clone()));
        }
    }
    for team in &request.teams {
        validate_team(team)?;
    }
    if !request.round.market_size.is_finite() || request.round.market_size < 0.0 {
        return Err(ValidationError::InvalidMarketSize);
    }
    Ok(())
}

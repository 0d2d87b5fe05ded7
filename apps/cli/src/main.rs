#![deny(warnings)]

//! Headless CLI for computing a single round: load a full round request from
//! JSON, or synthesize a reproducible demo cohort, and print the standings.

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_core::*;
use std::fs;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    request: Option<String>,
    season: Option<String>,
    teams: Option<usize>,
    seed: Option<u64>,
    out: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--request" => args.request = it.next(),
            "--season" => args.season = it.next(),
            "--teams" => args.teams = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--out" => args.out = it.next(),
            _ => {}
        }
    }
    args
}

fn default_season() -> SeasonParameters {
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

fn demo_segments() -> Vec<AudienceSegment> {
    vec![
        AudienceSegment {
            id: "value".to_string(),
            weight_deltas: WeightDeltas {
                price: 0.10,
                ..WeightDeltas::default()
            },
            elasticity: 1.4,
            marketing_boost: None,
        },
        AudienceSegment {
            id: "mainstream".to_string(),
            weight_deltas: WeightDeltas::default(),
            elasticity: 1.0,
            marketing_boost: Some(0.1),
        },
        AudienceSegment {
            id: "premium".to_string(),
            weight_deltas: WeightDeltas {
                price: -0.10,
                quality: 0.15,
                ..WeightDeltas::default()
            },
            elasticity: 0.7,
            marketing_boost: None,
        },
    ]
}

/// Build a reproducible cohort: same seed, same request, same standings.
fn synthetic_request(n_teams: usize, seed: u64, season: SeasonParameters) -> RoundRequest {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let segments = demo_segments();
    let cohorts = ["value", "mainstream", "premium"];
    let teams = (0..n_teams)
        .map(|i| TeamDecision {
            id: format!("team-{}", i + 1),
            name: format!("Team {}", i + 1),
            segment_id: Some(cohorts[i % cohorts.len()].to_string()),
            price: rng.gen_range(0.8..1.3) * season.ref_price,
            marketing_spend: rng.gen_range(1_000.0..12_000.0),
            capacity: rng.gen_range(2_000.0..9_000.0),
            quality: rng.gen_range(30.0..95.0),
            efficiency: rng.gen_range(30.0..95.0),
            cx: rng.gen_range(30.0..95.0),
            launch_ea: None,
            brand_ea: None,
            benefit_cost: None,
            reinvest_budget: None,
            cash: None,
        })
        .collect();
    RoundRequest {
        season,
        segments,
        teams,
        round: RoundContext {
            round_id: format!("demo-{seed}"),
            market_size: 10_000.0,
        },
    }
}

fn flag_marks(flags: &RoundFlags) -> String {
    let mut marks = String::new();
    if flags.capacity_bound {
        marks.push_str(" [capacity]");
    }
    if flags.price_risk {
        marks.push_str(" [below-cost]");
    }
    if flags.negative_profit {
        marks.push_str(" [loss]");
    }
    marks
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(?args, "starting CLI");

    let request: RoundRequest = if let Some(path) = &args.request {
        serde_json::from_str(&fs::read_to_string(path)?)?
    } else {
        let season = match &args.season {
            Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
            None => default_season(),
        };
        synthetic_request(args.teams.unwrap_or(3), args.seed.unwrap_or(42), season)
    };
    validate_request(&request)?;

    let result = sim_round::compute_round(&request);

    println!(
        "Round {} | teams: {} | market: {} units",
        result.round.round_id,
        result.teams.len(),
        result.totals.market_size
    );
    for (rank, t) in result.teams.iter().enumerate() {
        println!(
            "#{:<2} {:<12} | share: {:>5.1}% | sales: {:>8.1} | revenue: ${:>12.2} | profit: ${:>12.2}{}",
            rank + 1,
            t.name,
            t.share * 100.0,
            t.sales,
            t.revenue,
            t.profit,
            flag_marks(&t.flags)
        );
    }
    println!(
        "Totals | sales: {:.1} | revenue: ${:.2} | profit: ${:.2} | reinvested: ${:.2}",
        result.totals.sales,
        result.totals.revenue,
        result.totals.profit,
        result.teams.iter().map(|t| t.reinvest).sum::<f64>()
    );

    if let Some(path) = &args.out {
        fs::write(path, serde_json::to_string_pretty(&result)?)?;
        info!(path = %path, "wrote round result");
    }

    Ok(())
}

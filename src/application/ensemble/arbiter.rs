//! Ensemble arbitration.
//!
//! Signals are grouped by (entity, market). Different markets on one entity
//! never conflict. Within a group, agreement keeps the single most confident
//! signal; disagreement is settled by weighted vote.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::id::{EntityId, Market, Recommendation, StrategyId};
use crate::domain::live::LiveStrategyState;
use crate::domain::performance::{PerformanceRecord, PerformanceSnapshot};
use crate::domain::signal::{CandidateSignal, ConflictExplanation, Contribution, Decision};

/// A candidate signal with its scaled confidence and ensemble weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSignal {
    pub signal: CandidateSignal,
    pub weight: f64,
}

impl WeightedSignal {
    fn support(&self) -> f64 {
        self.signal.confidence * self.weight
    }

    fn contribution(&self) -> Contribution {
        Contribution {
            strategy_id: self.signal.strategy_id.clone(),
            recommendation: self.signal.recommendation.clone(),
            weight: self.weight,
            confidence: self.signal.confidence,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnsembleArbiter {
    /// Raw confidence a signal needs before the strategy's threshold adjustment.
    min_signal_confidence: f64,
}

impl Default for EnsembleArbiter {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[derive(Debug, Default)]
struct Side<'a> {
    support: f64,
    weight: f64,
    lead: Option<&'a WeightedSignal>,
}

impl EnsembleArbiter {
    #[must_use]
    pub const fn new(min_signal_confidence: f64) -> Self {
        Self {
            min_signal_confidence,
        }
    }

    /// Scale raw signals by their strategy's live configuration.
    ///
    /// Signals from strategies that are not enabled in `state`, or whose raw
    /// confidence is below the adjusted threshold, are dropped.
    #[must_use]
    pub fn admit(
        &self,
        raw: Vec<CandidateSignal>,
        state: &LiveStrategyState,
    ) -> Vec<WeightedSignal> {
        raw.into_iter()
            .filter_map(|mut signal| {
                let tuning = state.get(&signal.strategy_id)?.tuning()?;
                let threshold = self.min_signal_confidence + tuning.threshold_adjustment;
                if !signal.confidence.is_finite() || signal.confidence < threshold {
                    debug!(
                        strategy = %signal.strategy_id,
                        entity = %signal.entity_id,
                        confidence = signal.confidence,
                        threshold,
                        "Signal below threshold"
                    );
                    return None;
                }
                signal.confidence = (signal.confidence * tuning.confidence_multiplier).min(1.0);
                Some(WeightedSignal {
                    signal,
                    weight: tuning.ensemble_weight,
                })
            })
            .collect()
    }

    /// Merge weighted signals into one decision per (entity, market).
    ///
    /// `metrics` supplies the performance figures cited in conflict
    /// explanations. Output is ordered by entity then market.
    #[must_use]
    pub fn arbitrate(
        &self,
        signals: Vec<WeightedSignal>,
        metrics: &BTreeMap<StrategyId, PerformanceRecord>,
    ) -> Vec<Decision> {
        let mut groups: BTreeMap<(EntityId, Market), Vec<WeightedSignal>> = BTreeMap::new();
        for signal in signals {
            groups
                .entry((signal.signal.entity_id.clone(), signal.signal.market.clone()))
                .or_default()
                .push(signal);
        }

        groups
            .into_iter()
            .filter_map(|((entity_id, market), group)| {
                resolve_group(entity_id, market, &group, metrics)
            })
            .collect()
    }

    /// [`admit`](Self::admit) then [`arbitrate`](Self::arbitrate) against one snapshot.
    #[must_use]
    pub fn decide(&self, raw: Vec<CandidateSignal>, state: &LiveStrategyState) -> Vec<Decision> {
        let admitted = self.admit(raw, state);
        self.arbitrate(admitted, &state.metrics)
    }
}

fn resolve_group(
    entity_id: EntityId,
    market: Market,
    group: &[WeightedSignal],
    metrics: &BTreeMap<StrategyId, PerformanceRecord>,
) -> Option<Decision> {
    let mut sides: BTreeMap<&Recommendation, Side<'_>> = BTreeMap::new();
    for signal in group {
        let side = sides.entry(&signal.signal.recommendation).or_default();
        side.support += signal.support();
        side.weight += signal.weight;
        if side.lead.map_or(true, |lead| signal.support() > lead.support()) {
            side.lead = Some(signal);
        }
    }

    if sides.len() <= 1 {
        let best = group.iter().reduce(|best, s| {
            let better = s.signal.confidence > best.signal.confidence
                || (s.signal.confidence == best.signal.confidence && s.weight > best.weight);
            if better {
                s
            } else {
                best
            }
        })?;
        let mut contributors = vec![best.contribution()];
        contributors.extend(
            group
                .iter()
                .filter(|s| !std::ptr::eq(*s, best))
                .map(WeightedSignal::contribution),
        );
        return Some(Decision {
            entity_id,
            market,
            recommendation: best.signal.recommendation.clone(),
            confidence: best.signal.confidence,
            contributors,
            conflict_resolved: false,
            explanation: None,
        });
    }

    // Greatest support, then greatest total weight, then lexical order.
    let mut ranked: Vec<(&Recommendation, &Side<'_>)> =
        sides.iter().map(|(r, s)| (*r, s)).collect();
    ranked.sort_by(|a, b| {
        b.1.support
            .total_cmp(&a.1.support)
            .then(b.1.weight.total_cmp(&a.1.weight))
            .then(a.0.cmp(b.0))
    });
    let (winner, win) = ranked[0];
    let (runner_up, lose) = ranked[1];

    let snapshot = |side: &Side<'_>| -> Option<PerformanceSnapshot> {
        side.lead
            .and_then(|lead| metrics.get(&lead.signal.strategy_id))
            .map(PerformanceRecord::snapshot)
    };
    let lead_id = |side: &Side<'_>| {
        side.lead
            .map(|lead| lead.signal.strategy_id.clone())
            .unwrap_or_else(|| StrategyId::new(""))
    };

    let explanation = ConflictExplanation {
        winner: winner.clone(),
        winner_support: win.support,
        winner_lead: lead_id(win),
        winner_metrics: snapshot(win),
        runner_up: runner_up.clone(),
        runner_up_support: lose.support,
        runner_up_lead: lead_id(lose),
        runner_up_metrics: snapshot(lose),
    };
    debug!(
        entity = %entity_id,
        market = %market,
        explanation = %explanation,
        "Conflict resolved"
    );

    let confidence = if win.weight > 0.0 {
        win.support / win.weight
    } else {
        0.0
    };

    let mut contributors: Vec<Contribution> =
        group.iter().map(WeightedSignal::contribution).collect();
    contributors.sort_by(|a, b| {
        (b.recommendation == *winner)
            .cmp(&(a.recommendation == *winner))
            .then(b.weight.total_cmp(&a.weight))
    });

    Some(Decision {
        entity_id,
        market,
        recommendation: winner.clone(),
        confidence,
        contributors,
        conflict_resolved: true,
        explanation: Some(explanation),
    })
}

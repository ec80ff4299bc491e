//! Database model types for Diesel ORM.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision, so lexical order matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;

use super::schema::{
    alerts, configuration_history, kill_switch_events, lifecycle_events, performance_records,
    strategies, update_triggers,
};
use crate::domain::alert::{Alert, AlertLevel, KillSwitchAction, KillSwitchAudit};
use crate::domain::category::StrategyCategory;
use crate::domain::configuration::{
    Activation, ConfigurationVersion, StrategyConfiguration, Tuning,
};
use crate::domain::id::{AlertId, StrategyId};
use crate::domain::lifecycle::{LifecycleEvent, LifecycleStatus, TransitionReason};
use crate::domain::performance::{PerformanceRecord, PerformanceSnapshot};
use crate::domain::strategy::{StrategyCounters, StrategyEntry};
use crate::domain::trigger::{TriggerKind, TriggerRecord};
use crate::error::{Error, Result};

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp {raw:?}: {e}")))
}

fn parse_status(raw: &str) -> Result<LifecycleStatus> {
    raw.parse().map_err(Error::Parse)
}

fn version_to_db(version: ConfigurationVersion) -> i64 {
    i64::try_from(version.value()).unwrap_or(i64::MAX)
}

fn version_from_db(raw: i64) -> ConfigurationVersion {
    ConfigurationVersion::new(u64::try_from(raw).unwrap_or(0))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Database row for a registered strategy.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = strategies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StrategyRow {
    pub id: String,
    pub category: String,
    pub status: String,
    pub first_seen: String,
    pub grace_days: i32,
    pub onboarding: i32,
    pub cleared_since: Option<String>,
    pub evaluations: i32,
    pub transitions: i32,
    pub cycles_below_probation: i32,
    pub approved_emissions: i64,
    pub updated_at: String,
}

impl StrategyRow {
    pub fn from_entry(entry: &StrategyEntry, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: entry.id.to_string(),
            category: entry.category.as_str().to_string(),
            status: entry.status.as_str().to_string(),
            first_seen: format_timestamp(entry.first_seen),
            grace_days: i32::try_from(entry.grace_days).unwrap_or(i32::MAX),
            onboarding: i32::from(entry.onboarding),
            cleared_since: entry.cleared_since.map(format_timestamp),
            evaluations: to_i32(entry.counters.evaluations),
            transitions: to_i32(entry.counters.transitions),
            cycles_below_probation: to_i32(entry.counters.cycles_below_probation),
            approved_emissions: i64::try_from(entry.counters.approved_emissions)
                .unwrap_or(i64::MAX),
            updated_at: format_timestamp(updated_at),
        }
    }

    pub fn into_entry(self) -> Result<StrategyEntry> {
        // Unknown categories from older rows degrade to uncategorized.
        let category = self.category.parse().unwrap_or(StrategyCategory::Uncategorized);
        Ok(StrategyEntry {
            id: StrategyId::from(self.id),
            category,
            first_seen: parse_timestamp(&self.first_seen)?,
            grace_days: i64::from(self.grace_days),
            status: parse_status(&self.status)?,
            onboarding: self.onboarding != 0,
            cleared_since: self.cleared_since.as_deref().map(parse_timestamp).transpose()?,
            counters: StrategyCounters {
                evaluations: to_u32(self.evaluations),
                transitions: to_u32(self.transitions),
                cycles_below_probation: to_u32(self.cycles_below_probation),
                approved_emissions: u64::try_from(self.approved_emissions).unwrap_or(0),
            },
        })
    }
}

/// Database row for one strategy's configuration at one version (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = configuration_history)]
pub struct NewConfigurationRow {
    pub version: i64,
    pub strategy_id: String,
    pub status: String,
    pub enabled: i32,
    pub confidence_multiplier: Option<f64>,
    pub threshold_adjustment: Option<f64>,
    pub ensemble_weight: Option<f64>,
    pub max_emissions_per_period: Option<i32>,
    pub trigger_type: String,
    pub created_at: String,
}

impl NewConfigurationRow {
    pub fn new(config: &StrategyConfiguration, trigger: TriggerKind) -> Self {
        let tuning = match &config.activation {
            Activation::Enabled(tuning) => Some(tuning),
            Activation::Disabled { staged } => staged.as_ref(),
        };
        Self {
            version: version_to_db(config.version),
            strategy_id: config.strategy_id.to_string(),
            status: config.status.as_str().to_string(),
            enabled: i32::from(config.is_enabled()),
            confidence_multiplier: tuning.map(|t| t.confidence_multiplier),
            threshold_adjustment: tuning.map(|t| t.threshold_adjustment),
            ensemble_weight: tuning.map(|t| t.ensemble_weight),
            max_emissions_per_period: tuning.map(|t| to_i32(t.max_emissions_per_period)),
            trigger_type: trigger.as_str().to_string(),
            created_at: format_timestamp(config.derived_at),
        }
    }
}

/// Database row for one strategy's configuration at one version (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = configuration_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConfigurationRow {
    pub id: Option<i32>,
    pub version: i64,
    pub strategy_id: String,
    pub status: String,
    pub enabled: i32,
    pub confidence_multiplier: Option<f64>,
    pub threshold_adjustment: Option<f64>,
    pub ensemble_weight: Option<f64>,
    pub max_emissions_per_period: Option<i32>,
    pub trigger_type: String,
    pub created_at: String,
}

impl ConfigurationRow {
    pub fn trigger(&self) -> Result<TriggerKind> {
        TriggerKind::from_stored(&self.trigger_type)
            .ok_or_else(|| Error::Parse(format!("unknown trigger type {:?}", self.trigger_type)))
    }

    pub fn into_configuration(self) -> Result<StrategyConfiguration> {
        let tuning = match (
            self.confidence_multiplier,
            self.threshold_adjustment,
            self.ensemble_weight,
            self.max_emissions_per_period,
        ) {
            (Some(multiplier), Some(adjustment), Some(weight), Some(cap)) => Some(Tuning {
                confidence_multiplier: multiplier,
                threshold_adjustment: adjustment,
                ensemble_weight: weight,
                max_emissions_per_period: to_u32(cap),
            }),
            _ => None,
        };
        let activation = match (self.enabled != 0, tuning) {
            (true, Some(tuning)) => Activation::Enabled(tuning),
            (true, None) => {
                return Err(Error::Parse(format!(
                    "enabled configuration for {} at v{} has no tuning",
                    self.strategy_id, self.version
                )));
            }
            (false, staged) => Activation::Disabled { staged },
        };
        Ok(StrategyConfiguration {
            strategy_id: StrategyId::from(self.strategy_id),
            status: parse_status(&self.status)?,
            activation,
            derived_at: parse_timestamp(&self.created_at)?,
            version: version_from_db(self.version),
        })
    }
}

/// Database row for a lifecycle event (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = lifecycle_events)]
pub struct NewLifecycleEventRow {
    pub strategy_id: String,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub reason: String,
    pub reason_json: String,
    pub performance_json: Option<String>,
    pub created_at: String,
}

impl NewLifecycleEventRow {
    pub fn new(event: &LifecycleEvent) -> Result<Self> {
        Ok(Self {
            strategy_id: event.strategy_id.to_string(),
            previous_status: event.previous_status.map(|s| s.as_str().to_string()),
            new_status: event.new_status.as_str().to_string(),
            reason: event.reason.to_string(),
            reason_json: serde_json::to_string(&event.reason)?,
            performance_json: event
                .performance
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            created_at: format_timestamp(event.timestamp),
        })
    }
}

/// Database row for a lifecycle event (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = lifecycle_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LifecycleEventRow {
    pub id: Option<i32>,
    pub strategy_id: String,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub reason: String,
    pub reason_json: String,
    pub performance_json: Option<String>,
    pub created_at: String,
}

impl LifecycleEventRow {
    pub fn into_event(self) -> Result<LifecycleEvent> {
        let reason: TransitionReason = serde_json::from_str(&self.reason_json)?;
        let performance: Option<PerformanceSnapshot> = self
            .performance_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(LifecycleEvent {
            strategy_id: StrategyId::from(self.strategy_id),
            previous_status: self.previous_status.as_deref().map(parse_status).transpose()?,
            new_status: parse_status(&self.new_status)?,
            reason,
            performance,
            timestamp: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for an update trigger firing (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = update_triggers)]
pub struct NewUpdateTriggerRow {
    pub trigger_type: String,
    pub fired_at: String,
    pub prior_version: i64,
    pub new_version: i64,
    pub strategies_affected: i32,
    pub duration_ms: i64,
}

impl From<&TriggerRecord> for NewUpdateTriggerRow {
    fn from(record: &TriggerRecord) -> Self {
        Self {
            trigger_type: record.kind.as_str().to_string(),
            fired_at: format_timestamp(record.fired_at),
            prior_version: version_to_db(record.prior_version),
            new_version: version_to_db(record.new_version),
            strategies_affected: to_i32(record.strategies_affected),
            duration_ms: i64::try_from(record.duration_ms).unwrap_or(i64::MAX),
        }
    }
}

/// Database row for an alert.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = alerts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertRow {
    pub id: String,
    pub strategy_id: Option<String>,
    pub level: String,
    pub message: String,
    pub raised_at: String,
    pub acknowledged: i32,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id.to_string(),
            strategy_id: alert.strategy_id.as_ref().map(ToString::to_string),
            level: alert.level.as_str().to_string(),
            message: alert.message.clone(),
            raised_at: format_timestamp(alert.raised_at),
            acknowledged: i32::from(alert.acknowledged),
        }
    }
}

impl AlertRow {
    pub fn into_alert(self) -> Result<Alert> {
        Ok(Alert {
            id: AlertId::from(self.id),
            strategy_id: self.strategy_id.map(StrategyId::from),
            level: AlertLevel::from_stored(&self.level),
            message: self.message,
            raised_at: parse_timestamp(&self.raised_at)?,
            acknowledged: self.acknowledged != 0,
        })
    }
}

/// Database row for a kill-switch action (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = kill_switch_events)]
pub struct NewKillSwitchRow {
    pub action: String,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<&KillSwitchAudit> for NewKillSwitchRow {
    fn from(audit: &KillSwitchAudit) -> Self {
        Self {
            action: audit.action.as_str().to_string(),
            actor: audit.actor.clone(),
            reason: audit.reason.clone(),
            created_at: format_timestamp(audit.at),
        }
    }
}

/// Database row for a kill-switch action (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = kill_switch_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KillSwitchRow {
    pub id: Option<i32>,
    pub action: String,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: String,
}

impl KillSwitchRow {
    pub fn into_audit(self) -> Result<KillSwitchAudit> {
        let action = match self.action.as_str() {
            "activated" => KillSwitchAction::Activated,
            "deactivated" => KillSwitchAction::Deactivated,
            other => return Err(Error::Parse(format!("unknown kill switch action {other:?}"))),
        };
        Ok(KillSwitchAudit {
            action,
            actor: self.actor,
            reason: self.reason,
            at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for a performance record (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = performance_records)]
pub struct NewPerformanceRow {
    pub strategy_id: String,
    pub win_rate: f64,
    pub roi: f64,
    pub sample_size: i32,
    pub consecutive_losses: i32,
    pub observed_at: String,
    pub source_partition: String,
}

impl From<&PerformanceRecord> for NewPerformanceRow {
    fn from(record: &PerformanceRecord) -> Self {
        Self {
            strategy_id: record.strategy_id.to_string(),
            win_rate: record.win_rate,
            roi: record.roi,
            sample_size: to_i32(record.sample_size),
            consecutive_losses: to_i32(record.consecutive_losses),
            observed_at: format_timestamp(record.observed_at),
            source_partition: record.source_partition.clone(),
        }
    }
}

/// Database row for a performance record (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = performance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PerformanceRow {
    pub id: Option<i32>,
    pub strategy_id: String,
    pub win_rate: f64,
    pub roi: f64,
    pub sample_size: i32,
    pub consecutive_losses: i32,
    pub observed_at: String,
    pub source_partition: String,
}

impl PerformanceRow {
    pub fn into_record(self) -> Result<PerformanceRecord> {
        Ok(PerformanceRecord {
            strategy_id: StrategyId::from(self.strategy_id),
            win_rate: self.win_rate,
            roi: self.roi,
            sample_size: to_u32(self.sample_size),
            consecutive_losses: to_u32(self.consecutive_losses),
            observed_at: parse_timestamp(&self.observed_at)?,
            source_partition: self.source_partition,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1500);
        let (fa, fb) = (format_timestamp(a), format_timestamp(b));
        assert!(fa < fb);
        assert_eq!(parse_timestamp(&fb).unwrap(), b);
    }

    #[test]
    fn disabled_configuration_keeps_staged_tuning() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let staged = Tuning {
            confidence_multiplier: 0.8,
            threshold_adjustment: 0.0,
            ensemble_weight: 0.3,
            max_emissions_per_period: 1,
        };
        let config = StrategyConfiguration {
            strategy_id: StrategyId::new("fade"),
            status: LifecycleStatus::Probation,
            activation: Activation::Disabled {
                staged: Some(staged),
            },
            derived_at: now,
            version: ConfigurationVersion::new(3),
        };
        let new = NewConfigurationRow::new(&config, TriggerKind::Startup);
        let row = ConfigurationRow {
            id: Some(1),
            version: new.version,
            strategy_id: new.strategy_id,
            status: new.status,
            enabled: new.enabled,
            confidence_multiplier: new.confidence_multiplier,
            threshold_adjustment: new.threshold_adjustment,
            ensemble_weight: new.ensemble_weight,
            max_emissions_per_period: new.max_emissions_per_period,
            trigger_type: new.trigger_type,
            created_at: new.created_at,
        };
        assert_eq!(row.trigger().unwrap(), TriggerKind::Startup);
        assert_eq!(row.into_configuration().unwrap(), config);
    }
}

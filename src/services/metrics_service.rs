// src/services/metrics_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CallbackRepository, LeadRepository, TransferRepository},
    models::auth::Employee,
    models::callback::{Callback, CallbackStatus, TimeBucket},
    models::lead::{Lead, LeadStatus},
    models::metrics::{
        BucketSlice, CallbackWorkload, LeadFunnel, LeaderboardEntry, StatusSlice, TransferVolume,
    },
    models::transfer::{Transfer, TransferStatus},
};

// Percentual com uma casa decimal; denominador zero degrada para 0.0
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 * 1000.0 / whole as f64).round() / 10.0
    }
}

// =============================================================================
//  AGREGADORES PUROS
//  Projeções de leitura recalculadas sob demanda, nunca fonte de verdade.
//  Entrada vazia ou parcial degrada para zeros em vez de errar: isso aqui é
//  relatório, não caminho de controle.
// =============================================================================

pub fn lead_funnel(leads: &[Lead]) -> LeadFunnel {
    let total_leads = leads.len();
    let won_leads = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Won)
        .count();
    let lost_leads = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Lost)
        .count();

    // Receita conta apenas o que foi ganho
    let total_revenue: Decimal = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Won)
        .map(|l| l.expected_revenue)
        .sum();

    let avg_deal_size = if won_leads == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(won_leads as u64)).round_dp(2)
    };

    let by_status = LeadStatus::ALL
        .iter()
        .map(|&status| {
            let slice: Vec<&Lead> = leads.iter().filter(|l| l.status == status).collect();
            StatusSlice {
                status,
                count: slice.len(),
                total_revenue: slice.iter().map(|l| l.expected_revenue).sum(),
            }
        })
        .collect();

    LeadFunnel {
        total_leads,
        won_leads,
        lost_leads,
        conversion_rate: percentage(won_leads, total_leads),
        win_rate: percentage(won_leads, won_leads + lost_leads),
        total_revenue,
        avg_deal_size,
        by_status,
    }
}

pub fn callback_workload(callbacks: &[Callback], today: NaiveDate) -> CallbackWorkload {
    let total_callbacks = callbacks.len();

    let mut per_bucket: HashMap<TimeBucket, usize> = HashMap::new();
    for cb in callbacks {
        *per_bucket.entry(cb.time_bucket(today)).or_default() += 1;
    }

    let by_bucket = TimeBucket::ALL
        .iter()
        .map(|&bucket| BucketSlice {
            bucket,
            count: per_bucket.get(&bucket).copied().unwrap_or(0),
        })
        .collect();

    let pending_callbacks = callbacks
        .iter()
        .filter(|cb| cb.status == CallbackStatus::Pending)
        .count();
    let completed_callbacks = callbacks
        .iter()
        .filter(|cb| cb.status == CallbackStatus::Completed)
        .count();

    // Atrasado = ainda acionável (Pending/Rescheduled) e com data vencida
    let overdue_callbacks = callbacks
        .iter()
        .filter(|cb| {
            matches!(
                cb.status,
                CallbackStatus::Pending | CallbackStatus::Rescheduled
            ) && cb.callback_date < today
        })
        .count();

    let today_callbacks = callbacks
        .iter()
        .filter(|cb| cb.callback_date == today)
        .count();

    CallbackWorkload {
        total_callbacks,
        pending_callbacks,
        completed_callbacks,
        overdue_callbacks,
        today_callbacks,
        completion_rate: percentage(completed_callbacks, total_callbacks),
        by_bucket,
    }
}

pub fn transfer_volume(transfers: &[Transfer], top_n: usize) -> TransferVolume {
    let count_status = |status: TransferStatus| -> usize {
        transfers.iter().filter(|t| t.status == status).count()
    };

    TransferVolume {
        total_transfers: transfers.len(),
        pending: count_status(TransferStatus::Transferred),
        accepted: count_status(TransferStatus::Accepted),
        rejected: count_status(TransferStatus::Rejected),
        completed: count_status(TransferStatus::Completed),
        top_senders: leaderboard(transfers.iter().map(|t| t.from_employee), top_n),
        top_receivers: leaderboard(transfers.iter().map(|t| t.to_employee), top_n),
    }
}

// Ranking decrescente por volume; empate desempata pelo id para a ordem
// ser estável entre leituras.
fn leaderboard(employees: impl Iterator<Item = Uuid>, top_n: usize) -> Vec<LeaderboardEntry> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for employee in employees {
        *counts.entry(employee).or_default() += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .map(|(employee_id, count)| LeaderboardEntry { employee_id, count })
        .collect();

    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    entries.truncate(top_n);

    entries
}

// =============================================================================
//  SERVIÇO (leitura de snapshot + agregação)
// =============================================================================

#[derive(Clone)]
pub struct MetricsService {
    lead_repo: LeadRepository,
    callback_repo: CallbackRepository,
    transfer_repo: TransferRepository,
}

impl MetricsService {
    pub fn new(
        lead_repo: LeadRepository,
        callback_repo: CallbackRepository,
        transfer_repo: TransferRepository,
    ) -> Self {
        Self {
            lead_repo,
            callback_repo,
            transfer_repo,
        }
    }

    fn ensure_pipeline_access(actor: &Employee) -> Result<(), AppError> {
        if actor.can_manage_pipeline() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Métricas do pipeline são restritas ao Super Admin e ao departamento de Marketing & Vendas."
                    .to_string(),
            ))
        }
    }

    // O snapshot não precisa ser transacionalmente consistente com escritas
    // em voo: são números de relatório, não decisões de controle.
    pub async fn pipeline_funnel<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
    ) -> Result<LeadFunnel, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let restrict_to = (!actor.is_super_admin()).then_some(actor.id);
        let leads = self.lead_repo.list_all(executor, restrict_to).await?;

        Ok(lead_funnel(&leads))
    }

    pub async fn callback_workload<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        today: NaiveDate,
    ) -> Result<CallbackWorkload, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let restrict_to = (!actor.is_super_admin()).then_some(actor.id);
        let callbacks = self.callback_repo.list_all(executor, restrict_to).await?;

        Ok(callback_workload(&callbacks, today))
    }

    pub async fn transfer_volume<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        top_n: usize,
    ) -> Result<TransferVolume, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut conn = executor.acquire().await?;

        let transfers = if actor.is_super_admin() {
            self.transfer_repo.list_all(&mut *conn).await?
        } else {
            // Não-admin enxerga só o próprio volume recebido
            self.transfer_repo.list_incoming(&mut *conn, actor.id).await?
        };

        Ok(transfer_volume(&transfers, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::models::callback::CallbackChannel;
    use crate::models::lead::{LeadSource, PriorityLevel};

    fn lead(status: LeadStatus, revenue: i64) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            lead_code: "LEAD00001".to_string(),
            client_name: "Cliente".to_string(),
            business_name: "Negócio".to_string(),
            email: "cliente@example.com".to_string(),
            phone: "+5511999999999".to_string(),
            alternate_phone: None,
            source: LeadSource::Website,
            status,
            priority: PriorityLevel::Medium,
            industry: None,
            website_url: None,
            expected_revenue: Decimal::from(revenue),
            address: None,
            city: None,
            state: None,
            country: None,
            zip_code: None,
            assigned_to: Uuid::new_v4(),
            assigned_by: None,
            notes: None,
            tags: None,
            last_contacted_date: None,
            next_follow_up_date: None,
            converted_to_customer: status == LeadStatus::Won,
            converted_date: None,
            lost_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn callback(status: CallbackStatus, date: NaiveDate) -> Callback {
        let now = Utc::now();
        Callback {
            id: Uuid::new_v4(),
            callback_code: "CB000001".to_string(),
            lead_id: Some(Uuid::new_v4()),
            client_name: "Cliente".to_string(),
            business_name: "Negócio".to_string(),
            callback_date: date,
            callback_time: "10:00".to_string(),
            channel: CallbackChannel::Call,
            status,
            priority: PriorityLevel::Medium,
            assigned_to: Uuid::new_v4(),
            assigned_by: None,
            remarks: None,
            outcome: None,
            completed_date: None,
            completed_by: None,
            rescheduled_from: None,
            rescheduled_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn transfer(status: TransferStatus, from: Uuid, to: Uuid) -> Transfer {
        Transfer {
            id: Uuid::new_v4(),
            callback_id: Uuid::new_v4(),
            client_name: "Cliente".to_string(),
            business_name: "Negócio".to_string(),
            from_employee: from,
            to_employee: to,
            status,
            remarks: None,
            transferred_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn funnel_rates_and_revenue() {
        // 2 Won (100 + 300), 1 Lost, 1 New
        let leads = vec![
            lead(LeadStatus::Won, 100),
            lead(LeadStatus::Won, 300),
            lead(LeadStatus::Lost, 0),
            lead(LeadStatus::New, 999),
        ];

        let funnel = lead_funnel(&leads);

        assert_eq!(funnel.total_leads, 4);
        assert_eq!(funnel.won_leads, 2);
        assert_eq!(funnel.lost_leads, 1);
        assert_eq!(funnel.conversion_rate, 50.0);
        assert_eq!(funnel.win_rate, 66.7);
        assert_eq!(funnel.total_revenue, Decimal::from(400));
        assert_eq!(funnel.avg_deal_size, Decimal::from(200));
    }

    #[test]
    fn funnel_degrades_to_zero_on_empty_input() {
        let funnel = lead_funnel(&[]);

        assert_eq!(funnel.total_leads, 0);
        assert_eq!(funnel.conversion_rate, 0.0);
        assert_eq!(funnel.win_rate, 0.0);
        assert_eq!(funnel.total_revenue, Decimal::ZERO);
        assert_eq!(funnel.avg_deal_size, Decimal::ZERO);
    }

    #[test]
    fn funnel_status_slices_only_count_their_own_revenue() {
        let leads = vec![lead(LeadStatus::Won, 100), lead(LeadStatus::New, 50)];
        let funnel = lead_funnel(&leads);

        let won_slice = funnel
            .by_status
            .iter()
            .find(|s| s.status == LeadStatus::Won)
            .unwrap();
        assert_eq!(won_slice.count, 1);
        assert_eq!(won_slice.total_revenue, Decimal::from(100));

        let new_slice = funnel
            .by_status
            .iter()
            .find(|s| s.status == LeadStatus::New)
            .unwrap();
        assert_eq!(new_slice.total_revenue, Decimal::from(50));
    }

    #[test]
    fn workload_buckets_and_counters() {
        // hoje = quinta 2024-03-14
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let callbacks = vec![
            callback(CallbackStatus::Pending, NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()),
            callback(CallbackStatus::Pending, today),
            callback(CallbackStatus::Rescheduled, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
            callback(CallbackStatus::Completed, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
            // Cancelado com data vencida: cai no balde Overdue, mas não conta
            // como "atrasado acionável"
            callback(CallbackStatus::Cancelled, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        ];

        let workload = callback_workload(&callbacks, today);

        assert_eq!(workload.total_callbacks, 5);
        assert_eq!(workload.pending_callbacks, 2);
        assert_eq!(workload.completed_callbacks, 1);
        assert_eq!(workload.overdue_callbacks, 1);
        assert_eq!(workload.today_callbacks, 1);
        assert_eq!(workload.completion_rate, 20.0);

        let bucket_count = |bucket: TimeBucket| {
            workload
                .by_bucket
                .iter()
                .find(|s| s.bucket == bucket)
                .unwrap()
                .count
        };
        assert_eq!(bucket_count(TimeBucket::Overdue), 2);
        assert_eq!(bucket_count(TimeBucket::Today), 1);
        assert_eq!(bucket_count(TimeBucket::Tomorrow), 1);
        assert_eq!(bucket_count(TimeBucket::Completed), 1);
    }

    #[test]
    fn transfer_volume_counts_by_status() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let transfers = vec![
            transfer(TransferStatus::Transferred, a, b),
            transfer(TransferStatus::Accepted, a, b),
            transfer(TransferStatus::Rejected, b, a),
            transfer(TransferStatus::Completed, a, b),
        ];

        let volume = transfer_volume(&transfers, 5);

        assert_eq!(volume.total_transfers, 4);
        assert_eq!(volume.pending, 1);
        assert_eq!(volume.accepted, 1);
        assert_eq!(volume.rejected, 1);
        assert_eq!(volume.completed, 1);
    }

    #[test]
    fn leaderboard_sorts_by_volume_and_truncates() {
        let heavy = Uuid::new_v4();
        let light = Uuid::new_v4();
        let other = Uuid::new_v4();
        let transfers = vec![
            transfer(TransferStatus::Completed, heavy, other),
            transfer(TransferStatus::Completed, heavy, other),
            transfer(TransferStatus::Completed, heavy, other),
            transfer(TransferStatus::Completed, light, other),
        ];

        let volume = transfer_volume(&transfers, 1);

        assert_eq!(volume.top_senders.len(), 1);
        assert_eq!(volume.top_senders[0].employee_id, heavy);
        assert_eq!(volume.top_senders[0].count, 3);

        // O destinatário único concentra todos os recebimentos
        assert_eq!(volume.top_receivers[0].employee_id, other);
        assert_eq!(volume.top_receivers[0].count, 4);
    }

    #[test]
    fn aggregators_accept_empty_slices() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let workload = callback_workload(&[], today);
        assert_eq!(workload.total_callbacks, 0);
        assert_eq!(workload.completion_rate, 0.0);

        let volume = transfer_volume(&[], 10);
        assert_eq!(volume.total_transfers, 0);
        assert!(volume.top_senders.is_empty());
    }
}

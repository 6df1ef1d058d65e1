// src/services/callback_service.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CallbackRepository, EmployeeRepository, LeadRepository},
    models::auth::Employee,
    models::callback::{Callback, CallbackChannel, CallbackFilter, CallbackStatus, CallbackView},
    models::lead::PriorityLevel,
};

// Horário de agendamento no formato HH:MM (24h). O CHECK do banco repete
// a regra; aqui o erro sai como ValidationError antes de tocar o banco.
pub(crate) fn is_valid_time(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return false;
    }
    let (Ok(h), Ok(m)) = (hours.parse::<u8>(), minutes.parse::<u8>()) else {
        return false;
    };
    h <= 23 && m <= 59
}

fn ensure_valid_time(time: &str) -> Result<(), AppError> {
    if is_valid_time(time) {
        return Ok(());
    }
    let mut err = validator::ValidationErrors::new();
    let mut validation_err = validator::ValidationError::new("invalid_time");
    validation_err.message = Some("Horário inválido. Use HH:MM.".to_string().into());
    err.add("callbackTime", validation_err);
    Err(AppError::ValidationError(err))
}

#[derive(Clone)]
pub struct CallbackService {
    repo: CallbackRepository,
    lead_repo: LeadRepository,
    employee_repo: EmployeeRepository,
}

impl CallbackService {
    pub fn new(
        repo: CallbackRepository,
        lead_repo: LeadRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self {
            repo,
            lead_repo,
            employee_repo,
        }
    }

    fn ensure_pipeline_access(actor: &Employee) -> Result<(), AppError> {
        if actor.can_manage_pipeline() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Gestão de callbacks é restrita ao Super Admin e ao departamento de Marketing & Vendas."
                    .to_string(),
            ))
        }
    }

    fn ensure_record_access(actor: &Employee, assigned_to: Uuid) -> Result<(), AppError> {
        if actor.is_super_admin() || actor.id == assigned_to {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Você só pode acessar callbacks atribuídos a você.".to_string(),
            ))
        }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    // Snapshot intencional: client/business name são copiados do lead na
    // criação, para que o callback continue legível se o lead mudar ou sumir.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_callback<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
        callback_date: NaiveDate,
        callback_time: &str,
        channel: Option<CallbackChannel>,
        priority: Option<PriorityLevel>,
        assigned_to: Option<Uuid>,
        remarks: Option<&str>,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;
        ensure_valid_time(callback_time)?;

        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        if !actor.is_super_admin() && lead.assigned_to != actor.id {
            return Err(AppError::Forbidden(
                "Você só pode criar callbacks para os seus leads.".to_string(),
            ));
        }

        // Sem destinatário explícito: admin devolve para o dono do lead,
        // funcionário fica com o próprio callback.
        let assignee = match assigned_to {
            None => {
                if actor.is_super_admin() {
                    lead.assigned_to
                } else {
                    actor.id
                }
            }
            Some(target) if target == actor.id => actor.id,
            Some(target) => {
                if !actor.is_super_admin() {
                    return Err(AppError::Forbidden(
                        "Você só pode atribuir callbacks a si mesmo. O Super Admin pode atribuir a qualquer um."
                            .to_string(),
                    ));
                }
                self.employee_repo
                    .find_by_id(target)
                    .await?
                    .ok_or(AppError::EmployeeNotFound)?;
                target
            }
        };

        let callback = self
            .repo
            .create_callback(
                &mut *tx,
                lead.id,
                &lead.client_name,
                &lead.business_name,
                callback_date,
                callback_time,
                channel.unwrap_or(CallbackChannel::Call),
                priority.unwrap_or(lead.priority),
                assignee,
                actor.id,
                remarks,
            )
            .await?;

        // O agendamento vira o próximo follow-up do lead
        self.lead_repo
            .touch_next_follow_up(&mut *tx, lead.id, callback_date)
            .await?;

        tx.commit().await?;

        Ok(callback)
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    // Reagendar: só Pending/Rescheduled. O contador incrementa exatamente 1
    // por reagendamento, dentro do próprio UPDATE condicional.
    pub async fn reschedule<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        new_date: NaiveDate,
        new_time: &str,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;
        ensure_valid_time(new_time)?;

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, current.assigned_to)?;

        if !current.status.allows_reschedule() {
            return Err(AppError::InvalidState(format!(
                "Callback em {:?} não pode ser reagendado.",
                current.status
            )));
        }

        let updated = self
            .repo
            .reschedule(&mut *tx, callback_id, new_date, new_time)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O callback mudou de estado durante a operação; releia e tente novamente."
                        .to_string(),
                )
            })?;

        // Reagendamento também empurra o follow-up do lead
        if let Some(lead_id) = updated.lead_id {
            self.lead_repo
                .touch_next_follow_up(&mut *tx, lead_id, new_date)
                .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    // Conclusão idempotente: chamar duas vezes devolve o mesmo registro já
    // concluído, sem erro e sem mexer em contador (tolerância a retry de rede).
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        outcome: Option<&str>,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, current.assigned_to)?;

        if current.status == CallbackStatus::Completed {
            return Ok(current);
        }

        if !current.status.allows_complete() {
            return Err(AppError::InvalidState(format!(
                "Callback em {:?} não pode ser concluído.",
                current.status
            )));
        }

        let updated = self
            .repo
            .complete(&mut *tx, callback_id, actor.id, outcome)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O callback mudou de estado durante a operação; releia e tente novamente."
                        .to_string(),
                )
            })?;

        // Concluir o contato atualiza o último contato do lead
        if let Some(lead_id) = updated.lead_id {
            self.lead_repo
                .touch_last_contacted(&mut *tx, lead_id)
                .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, current.assigned_to)?;

        if !current.status.allows_cancel() {
            return Err(AppError::InvalidState(
                "Callback concluído não pode ser cancelado.".to_string(),
            ));
        }

        let updated = self
            .repo
            .cancel(&mut *tx, callback_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O callback mudou de estado durante a operação; releia e tente novamente."
                        .to_string(),
                )
            })?;

        tx.commit().await?;

        Ok(updated)
    }

    // Caminho genérico de status (ex: marcar Not Reachable). Conclusão,
    // reagendamento e cancelamento têm operações próprias com seus carimbos.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        new_status: CallbackStatus,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        if !matches!(
            new_status,
            CallbackStatus::Pending | CallbackStatus::NotReachable
        ) {
            return Err(AppError::InvalidState(format!(
                "Use a operação dedicada para levar o callback a {:?}.",
                new_status
            )));
        }

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, current.assigned_to)?;

        if current.status == CallbackStatus::Completed {
            return Err(AppError::InvalidState(
                "Callback concluído não pode voltar para a fila.".to_string(),
            ));
        }

        let updated = self
            .repo
            .set_status(&mut *tx, callback_id, new_status)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O callback mudou de estado durante a operação; releia e tente novamente."
                        .to_string(),
                )
            })?;

        tx.commit().await?;

        Ok(updated)
    }

    // =========================================================================
    //  EDIÇÃO / EXCLUSÃO
    // =========================================================================

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        channel: Option<CallbackChannel>,
        priority: Option<PriorityLevel>,
        remarks: Option<String>,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut tx = executor.begin().await?;

        let mut callback = self
            .repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, callback.assigned_to)?;

        if let Some(v) = channel {
            callback.channel = v;
        }
        if let Some(v) = priority {
            callback.priority = v;
        }
        if let Some(v) = remarks {
            callback.remarks = Some(v);
        }

        let updated = self.repo.update_details(&mut *tx, &callback).await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete_callback<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        if !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "Apenas o Super Admin pode excluir callbacks.".to_string(),
            ));
        }

        let mut tx = executor.begin().await?;

        let deleted = self.repo.delete(&mut *tx, callback_id).await?;
        if deleted == 0 {
            return Err(AppError::CallbackNotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    pub async fn get_callback<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        today: NaiveDate,
    ) -> Result<CallbackView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let callback = self
            .repo
            .find_by_id(executor, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        Self::ensure_record_access(actor, callback.assigned_to)?;

        Ok(CallbackView::from_callback(callback, today))
    }

    // O balde de tempo é derivado na leitura, relativo ao `today` injetado
    pub async fn list_callbacks<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        filter: &CallbackFilter,
        today: NaiveDate,
    ) -> Result<(Vec<CallbackView>, i64), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let restrict_to = (!actor.is_super_admin()).then_some(actor.id);

        let mut conn = executor.acquire().await?;

        let callbacks = self.repo.list(&mut *conn, filter, restrict_to).await?;
        let total = self.repo.count(&mut *conn, filter, restrict_to).await?;

        let views = callbacks
            .into_iter()
            .map(|cb| CallbackView::from_callback(cb, today))
            .collect();

        Ok((views, total))
    }

    pub async fn list_by_lead<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<CallbackView>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut conn = executor.acquire().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *conn, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        if !actor.is_super_admin() && lead.assigned_to != actor.id {
            return Err(AppError::Forbidden(
                "Você só pode ver callbacks dos seus leads.".to_string(),
            ));
        }

        let callbacks = self.repo.list_by_lead(&mut *conn, lead_id).await?;

        Ok(callbacks
            .into_iter()
            .map(|cb| CallbackView::from_callback(cb, today))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_times() {
        for time in ["00:00", "9:05", "09:05", "14:30", "23:59"] {
            assert!(is_valid_time(time), "{time} deveria ser aceito");
        }
    }

    #[test]
    fn rejects_malformed_times() {
        for time in ["24:00", "12:60", "12:5", "12h30", "1230", ":30", "12:", "ab:cd", ""] {
            assert!(!is_valid_time(time), "{time} deveria ser rejeitado");
        }
    }
}

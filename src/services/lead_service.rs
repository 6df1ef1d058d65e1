// src/services/lead_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, LeadRepository},
    models::auth::Employee,
    models::lead::{Lead, LeadFilter, LeadSource, LeadStatus, PriorityLevel},
};

// Guarda de lead fechado, pura para ser testável sem banco.
// Won/Lost congelam o lead; só o flag explícito `reopen` destrava.
pub(crate) fn ensure_status_writable(current: LeadStatus, reopen: bool) -> Result<(), AppError> {
    if current.is_closed() && !reopen {
        return Err(AppError::InvalidState(format!(
            "Lead fechado como {:?} não aceita mudança de status sem reopen explícito.",
            current
        )));
    }
    Ok(())
}

// Dono de negócio fechado é congelado para integridade de auditoria.
// Não existe reopen para reatribuição.
pub(crate) fn ensure_reassignable(current: LeadStatus) -> Result<(), AppError> {
    if current.is_closed() {
        return Err(AppError::InvalidState(format!(
            "Lead fechado como {:?} não pode ser reatribuído.",
            current
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    employee_repo: EmployeeRepository,
}

impl LeadService {
    pub fn new(repo: LeadRepository, employee_repo: EmployeeRepository) -> Self {
        Self {
            repo,
            employee_repo,
        }
    }

    // Gestão de pipeline é restrita ao super-admin e ao time de vendas
    fn ensure_pipeline_access(actor: &Employee) -> Result<(), AppError> {
        if actor.can_manage_pipeline() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Gestão de leads é restrita ao Super Admin e ao departamento de Marketing & Vendas."
                    .to_string(),
            ))
        }
    }

    // Funcionário comum só enxerga/mexe no que é dele
    fn ensure_record_access(actor: &Employee, assigned_to: Uuid) -> Result<(), AppError> {
        if actor.is_super_admin() || actor.id == assigned_to {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Você só pode acessar leads atribuídos a você.".to_string(),
            ))
        }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        client_name: &str,
        business_name: &str,
        email: &str,
        phone: &str,
        alternate_phone: Option<&str>,
        source: Option<LeadSource>,
        status: Option<LeadStatus>,
        priority: Option<PriorityLevel>,
        industry: Option<&str>,
        website_url: Option<&str>,
        expected_revenue: Option<Decimal>,
        address: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        zip_code: Option<&str>,
        assigned_to: Option<Uuid>,
        notes: Option<&str>,
        tags: Option<Vec<String>>,
        next_follow_up_date: Option<NaiveDate>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        // Quem recebe o lead: admin pode atribuir a qualquer um (validando que
        // o funcionário existe); os demais só atribuem a si mesmos.
        let assignee = match assigned_to {
            None => actor.id,
            Some(target) if target == actor.id => actor.id,
            Some(target) => {
                if !actor.is_super_admin() {
                    return Err(AppError::Forbidden(
                        "Você só pode atribuir leads a si mesmo. O Super Admin pode atribuir a qualquer um."
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

        self.repo
            .create_lead(
                executor,
                client_name,
                business_name,
                email,
                phone,
                alternate_phone,
                source.unwrap_or(LeadSource::Website),
                status.unwrap_or(LeadStatus::New),
                priority.unwrap_or(PriorityLevel::Medium),
                industry,
                website_url,
                expected_revenue.unwrap_or(Decimal::ZERO),
                address,
                city,
                state,
                country,
                zip_code,
                assignee,
                actor.id,
                notes,
                tags.as_deref(),
                next_follow_up_date,
            )
            .await
    }

    // =========================================================================
    //  MÁQUINA DE ESTADOS
    // =========================================================================

    // Qualquer status -> qualquer status é mecanicamente possível; as duas
    // regras de política (lead fechado congela, reopen explícito destrava)
    // são aplicadas aqui E repetidas no WHERE do UPDATE, para que uma corrida
    // entre dois atores termine com exatamente um vencedor.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
        new_status: LeadStatus,
        reopen: bool,
        lost_reason: Option<&str>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut tx = executor.begin().await?;

        let lead = self
            .repo
            .find_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        Self::ensure_record_access(actor, lead.assigned_to)?;
        ensure_status_writable(lead.status, reopen)?;

        if reopen && lead.status.is_closed() {
            // Reabertura é exceção operacional: deixa rastro no log
            tracing::info!(
                lead_code = %lead.lead_code,
                prior_status = ?lead.status,
                new_status = ?new_status,
                actor = %actor.id,
                "Lead fechado reaberto por instrução explícita"
            );
        }

        // Entrar em Contacted marca o último contato; a primeira chegada em
        // Won marca a conversão (idempotente no SQL).
        let stamp_contacted = new_status == LeadStatus::Contacted;
        let mark_converted = new_status == LeadStatus::Won;

        let updated = self
            .repo
            .set_status(
                &mut *tx,
                lead_id,
                new_status,
                reopen,
                stamp_contacted,
                mark_converted,
                lost_reason,
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O lead foi fechado por outra operação; releia o estado atual.".to_string(),
                )
            })?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn reassign<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
        new_owner: Uuid,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        if !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "Você não pode reatribuir leads. Apenas o Super Admin pode reatribuir.".to_string(),
            ));
        }

        self.employee_repo
            .find_by_id(new_owner)
            .await?
            .ok_or(AppError::EmployeeNotFound)?;

        let mut tx = executor.begin().await?;

        let lead = self
            .repo
            .find_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        ensure_reassignable(lead.status)?;

        let updated = self
            .repo
            .set_assignee(&mut *tx, lead_id, new_owner)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "O lead foi fechado por outra operação; releia o estado atual.".to_string(),
                )
            })?;

        tx.commit().await?;

        // Notificação fire-and-forget para o dono original (colaborador externo)
        tracing::info!(
            lead_code = %updated.lead_code,
            previous_owner = %lead.assigned_to,
            new_owner = %new_owner,
            "🔔 Lead reatribuído"
        );

        Ok(updated)
    }

    // =========================================================================
    //  EDIÇÃO / EXCLUSÃO
    // =========================================================================

    // Campos livres continuam editáveis mesmo em lead fechado; o congelamento
    // vale só para status e dono.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
        client_name: Option<String>,
        business_name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        alternate_phone: Option<String>,
        source: Option<LeadSource>,
        priority: Option<PriorityLevel>,
        industry: Option<String>,
        website_url: Option<String>,
        expected_revenue: Option<Decimal>,
        address: Option<String>,
        city: Option<String>,
        state: Option<String>,
        country: Option<String>,
        zip_code: Option<String>,
        notes: Option<String>,
        tags: Option<Vec<String>>,
        next_follow_up_date: Option<NaiveDate>,
        lost_reason: Option<String>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let mut tx = executor.begin().await?;

        let mut lead = self
            .repo
            .find_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        Self::ensure_record_access(actor, lead.assigned_to)?;

        // Merge: só sobrescreve o que veio no payload
        if let Some(v) = client_name {
            lead.client_name = v;
        }
        if let Some(v) = business_name {
            lead.business_name = v;
        }
        if let Some(v) = email {
            lead.email = v;
        }
        if let Some(v) = phone {
            lead.phone = v;
        }
        if let Some(v) = alternate_phone {
            lead.alternate_phone = Some(v);
        }
        if let Some(v) = source {
            lead.source = v;
        }
        if let Some(v) = priority {
            lead.priority = v;
        }
        if let Some(v) = industry {
            lead.industry = Some(v);
        }
        if let Some(v) = website_url {
            lead.website_url = Some(v);
        }
        if let Some(v) = expected_revenue {
            lead.expected_revenue = v;
        }
        if let Some(v) = address {
            lead.address = Some(v);
        }
        if let Some(v) = city {
            lead.city = Some(v);
        }
        if let Some(v) = state {
            lead.state = Some(v);
        }
        if let Some(v) = country {
            lead.country = Some(v);
        }
        if let Some(v) = zip_code {
            lead.zip_code = Some(v);
        }
        if let Some(v) = notes {
            lead.notes = Some(v);
        }
        if let Some(v) = tags {
            lead.tags = Some(v);
        }
        if let Some(v) = next_follow_up_date {
            lead.next_follow_up_date = Some(v);
        }
        if let Some(v) = lost_reason {
            lead.lost_reason = Some(v);
        }

        let updated = self.repo.update_details(&mut *tx, &lead).await?;

        tx.commit().await?;

        Ok(updated)
    }

    // Exclusão física só para o admin, e só quando nenhum callback/transfer
    // em aberto ainda aponta para o lead (checagem em cascata).
    pub async fn delete_lead<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        if !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "Apenas o Super Admin pode excluir leads.".to_string(),
            ));
        }

        let mut tx = executor.begin().await?;

        self.repo
            .find_by_id(&mut *tx, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        let open_refs = self.repo.count_open_references(&mut *tx, lead_id).await?;
        if open_refs > 0 {
            return Err(AppError::Conflict(format!(
                "O lead ainda possui {} callback(s)/transferência(s) em aberto.",
                open_refs
            )));
        }

        let deleted = self.repo.delete(&mut *tx, lead_id).await?;
        if deleted == 0 {
            return Err(AppError::LeadNotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    pub async fn get_lead<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        lead_id: Uuid,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        let lead = self
            .repo
            .find_by_id(executor, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        Self::ensure_record_access(actor, lead.assigned_to)?;

        Ok(lead)
    }

    pub async fn list_leads<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        filter: &LeadFilter,
    ) -> Result<(Vec<Lead>, i64), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        Self::ensure_pipeline_access(actor)?;

        // Não-admin enxerga apenas os próprios leads
        let restrict_to = (!actor.is_super_admin()).then_some(actor.id);

        let mut conn = executor.acquire().await?;

        let leads = self.repo.list(&mut *conn, filter, restrict_to).await?;
        let total = self.repo.count(&mut *conn, filter, restrict_to).await?;

        Ok((leads, total))
    }

    // Busca única por código/nome/negócio/e-mail (ferramenta do admin)
    pub async fn lookup<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        query: &str,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "A busca de leads é exclusiva do Super Admin.".to_string(),
            ));
        }

        self.repo
            .lookup(executor, query)
            .await?
            .ok_or(AppError::LeadNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_lead_rejects_status_write_without_reopen() {
        for closed in [LeadStatus::Won, LeadStatus::Lost] {
            let err = ensure_status_writable(closed, false).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)));
        }
    }

    #[test]
    fn reopen_flag_unlocks_closed_lead() {
        assert!(ensure_status_writable(LeadStatus::Won, true).is_ok());
        assert!(ensure_status_writable(LeadStatus::Lost, true).is_ok());
    }

    #[test]
    fn open_statuses_are_freely_writable() {
        // A máquina é permissiva: qualquer estado não-terminal aceita escrita
        for status in LeadStatus::ALL {
            if !status.is_closed() {
                assert!(ensure_status_writable(status, false).is_ok());
            }
        }
    }

    #[test]
    fn closed_lead_never_reassignable() {
        // Nem com reopen: dono de negócio fechado é congelado
        assert!(matches!(
            ensure_reassignable(LeadStatus::Won),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            ensure_reassignable(LeadStatus::Lost),
            Err(AppError::InvalidState(_))
        ));
        assert!(ensure_reassignable(LeadStatus::Negotiation).is_ok());
    }
}

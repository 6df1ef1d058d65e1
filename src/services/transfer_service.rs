// src/services/transfer_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CallbackRepository, EmployeeRepository, TransferRepository},
    models::auth::Employee,
    models::transfer::{Transfer, TransferDecision, TransferStatus},
};

#[derive(Clone)]
pub struct TransferService {
    repo: TransferRepository,
    callback_repo: CallbackRepository,
    employee_repo: EmployeeRepository,
}

impl TransferService {
    pub fn new(
        repo: TransferRepository,
        callback_repo: CallbackRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self {
            repo,
            callback_repo,
            employee_repo,
        }
    }

    // Helper para criar erro de validação de um campo avulso
    fn validation_error(field: &'static str, message: &str) -> AppError {
        let mut err = validator::ValidationErrors::new();
        let mut validation_err = validator::ValidationError::new("invalid");
        validation_err.message = Some(message.to_string().into());
        err.add(field, validation_err);
        AppError::ValidationError(err)
    }

    // =========================================================================
    //  INICIAÇÃO
    // =========================================================================

    // Cria o handoff em Transferred. A posse do callback NÃO muda aqui:
    // ela só se move quando o destinatário aceita (consentimento explícito).
    pub async fn initiate_transfer<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
        to_employee: Uuid,
        remarks: Option<&str>,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if to_employee == actor.id {
            return Err(Self::validation_error(
                "transferredTo",
                "Não é possível transferir um callback para si mesmo.",
            ));
        }

        let target = self
            .employee_repo
            .find_by_id(to_employee)
            .await?
            .ok_or(AppError::EmployeeNotFound)?;

        // Regra de negócio: handoff só para cargos de supervisão
        if !target.has_supervisory_position() {
            return Err(Self::validation_error(
                "transferredTo",
                "Só é possível transferir para Supervisor, Team Lead ou Manager.",
            ));
        }

        let mut tx = executor.begin().await?;

        let callback = self
            .callback_repo
            .find_by_id(&mut *tx, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        if callback.assigned_to != actor.id {
            return Err(AppError::Forbidden(
                "Você só pode transferir callbacks atribuídos a você.".to_string(),
            ));
        }

        // A invariante "um transfer em aberto por callback" é do índice único
        // parcial; uma iniciação concorrente perde aqui com ConflictError.
        let transfer = self
            .repo
            .create_transfer(
                &mut *tx,
                callback.id,
                &callback.client_name,
                &callback.business_name,
                actor.id,
                to_employee,
                remarks,
            )
            .await?;

        tx.commit().await?;

        // Notificação fire-and-forget para o destinatário (colaborador externo)
        tracing::info!(
            callback_code = %callback.callback_code,
            from = %actor.id,
            to = %to_employee,
            "🔔 Transferência de callback iniciada"
        );

        Ok(transfer)
    }

    // =========================================================================
    //  RESOLUÇÃO (Accept / Reject)
    // =========================================================================

    // Só o destinatário decide, e só uma vez: a troca Transferred->Accepted é
    // compare-and-swap no banco. De dois aceites quase simultâneos, exatamente
    // um vence; o perdedor recebe InvalidState e precisa reler o registro.
    // No aceite, a posse do callback muda na MESMA transação.
    pub async fn resolve_transfer<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        transfer_id: Uuid,
        decision: TransferDecision,
        remarks: Option<&str>,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .repo
            .find_by_id(&mut *tx, transfer_id)
            .await?
            .ok_or(AppError::TransferNotFound)?;

        if transfer.to_employee != actor.id {
            return Err(AppError::Forbidden(
                "Você só pode resolver transferências destinadas a você.".to_string(),
            ));
        }

        if !transfer.status.allows_resolve() {
            return Err(AppError::InvalidState(format!(
                "Transferência em {:?} já foi resolvida.",
                transfer.status
            )));
        }

        let new_status = match decision {
            TransferDecision::Accept => TransferStatus::Accepted,
            TransferDecision::Reject => TransferStatus::Rejected,
        };

        let resolved = self
            .repo
            .resolve(&mut *tx, transfer_id, new_status, remarks)
            .await?
            .ok_or_else(|| {
                // Perdeu a corrida do CAS: alguém resolveu primeiro
                AppError::InvalidState(
                    "A transferência já foi resolvida por outra operação.".to_string(),
                )
            })?;

        if decision == TransferDecision::Accept {
            self.callback_repo
                .set_assignee(&mut *tx, resolved.callback_id, resolved.to_employee)
                .await?
                .ok_or(AppError::CallbackNotFound)?;
        }
        // Reject não toca no dono do callback

        tx.commit().await?;

        tracing::info!(
            transfer_id = %resolved.id,
            decision = ?decision,
            "🔔 Transferência resolvida"
        );

        Ok(resolved)
    }

    // =========================================================================
    //  ENCERRAMENTO
    // =========================================================================

    // Accepted -> Completed, por qualquer uma das duas partes.
    // Transferred -> Completed direto não existe.
    pub async fn complete_transfer<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        transfer_id: Uuid,
        remarks: Option<&str>,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .repo
            .find_by_id(&mut *tx, transfer_id)
            .await?
            .ok_or(AppError::TransferNotFound)?;

        if transfer.from_employee != actor.id && transfer.to_employee != actor.id {
            return Err(AppError::Forbidden(
                "Apenas as partes da transferência podem encerrá-la.".to_string(),
            ));
        }

        if !transfer.status.allows_complete() {
            return Err(AppError::InvalidState(format!(
                "Transferência em {:?} não pode ser encerrada; só Accepted encerra.",
                transfer.status
            )));
        }

        let completed = self
            .repo
            .complete(&mut *tx, transfer_id, remarks)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(
                    "A transferência mudou de estado durante a operação.".to_string(),
                )
            })?;

        tx.commit().await?;

        Ok(completed)
    }

    // Retirada pelo iniciador, só enquanto ninguém resolveu.
    // Remove o handoff em aberto e não toca no callback.
    pub async fn withdraw_transfer<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        transfer_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .repo
            .find_by_id(&mut *tx, transfer_id)
            .await?
            .ok_or(AppError::TransferNotFound)?;

        if transfer.from_employee != actor.id {
            return Err(AppError::Forbidden(
                "Apenas quem iniciou a transferência pode retirá-la.".to_string(),
            ));
        }

        if transfer.status != TransferStatus::Transferred {
            return Err(AppError::InvalidState(format!(
                "Transferência em {:?} não pode mais ser retirada.",
                transfer.status
            )));
        }

        let removed = self.repo.withdraw(&mut *tx, transfer_id).await?;
        if removed == 0 {
            return Err(AppError::InvalidState(
                "A transferência já foi resolvida por outra operação.".to_string(),
            ));
        }

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    pub async fn my_transfers<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
    ) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_incoming(executor, actor.id).await
    }

    pub async fn list_by_callback<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
        callback_id: Uuid,
    ) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let callback = self
            .callback_repo
            .find_by_id(&mut *conn, callback_id)
            .await?
            .ok_or(AppError::CallbackNotFound)?;

        if !actor.is_super_admin() && callback.assigned_to != actor.id {
            return Err(AppError::Forbidden(
                "Você só pode ver o histórico de callbacks atribuídos a você.".to_string(),
            ));
        }

        self.repo.list_by_callback(&mut *conn, callback_id).await
    }

    pub async fn all_transfers<'e, E>(
        &self,
        executor: E,
        actor: &Employee,
    ) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !actor.is_super_admin() {
            return Err(AppError::Forbidden(
                "A visão geral de transferências é exclusiva do Super Admin.".to_string(),
            ));
        }

        self.repo.list_all(executor).await
    }
}

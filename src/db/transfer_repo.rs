// src/db/transfer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::transfer::{Transfer, TransferStatus},
};

#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    // A invariante "no máximo um transfer em aberto por callback" mora no
    // índice parcial único do banco. Duas iniciações concorrentes chegam
    // aqui ao mesmo tempo e exatamente uma perde com ConflictError.
    pub async fn create_transfer<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
        client_name: &str,
        business_name: &str,
        from_employee: Uuid,
        to_employee: Uuid,
        remarks: Option<&str>,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (
                callback_id, client_name, business_name,
                from_employee, to_employee, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .bind(client_name)
        .bind(business_name)
        .bind(from_employee)
        .bind(to_employee)
        .bind(remarks)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(
                        "Já existe uma transferência em aberto para este callback.".to_string(),
                    );
                }
            }
            e.into()
        })
    }

    // Compare-and-swap: Transferred -> Accepted/Rejected. Dois aceites
    // quase simultâneos disputam o mesmo WHERE; só um recebe a linha.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        new_status: TransferStatus,
        remarks: Option<&str>,
    ) -> Result<Option<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            UPDATE transfers
            SET status = $2, remarks = COALESCE($3, remarks)
            WHERE id = $1 AND status = 'Transferred'
            RETURNING *
            "#,
        )
        .bind(transfer_id)
        .bind(new_status)
        .bind(remarks)
        .fetch_optional(executor)
        .await?;

        Ok(transfer)
    }

    // Accepted -> Completed é o único caminho de encerramento positivo
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        remarks: Option<&str>,
    ) -> Result<Option<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            UPDATE transfers
            SET status = 'Completed', completed_at = NOW(), remarks = COALESCE($2, remarks)
            WHERE id = $1 AND status = 'Accepted'
            RETURNING *
            "#,
        )
        .bind(transfer_id)
        .bind(remarks)
        .fetch_optional(executor)
        .await?;

        Ok(transfer)
    }

    // Retirada pelo iniciador: só enquanto ninguém resolveu
    pub async fn withdraw<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM transfers WHERE id = $1 AND status = 'Transferred'")
            .bind(transfer_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
    ) -> Result<Option<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE id = $1")
            .bind(transfer_id)
            .fetch_optional(executor)
            .await?;

        Ok(transfer)
    }

    // Transferências recebidas pelo funcionário, mais recentes primeiro
    pub async fn list_incoming<'e, E>(
        &self,
        executor: E,
        to_employee: Uuid,
    ) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfers = sqlx::query_as::<_, Transfer>(
            "SELECT * FROM transfers WHERE to_employee = $1 ORDER BY transferred_at DESC",
        )
        .bind(to_employee)
        .fetch_all(executor)
        .await?;

        Ok(transfers)
    }

    // Histórico de handoffs de um callback
    pub async fn list_by_callback<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
    ) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfers = sqlx::query_as::<_, Transfer>(
            "SELECT * FROM transfers WHERE callback_id = $1 ORDER BY transferred_at DESC",
        )
        .bind(callback_id)
        .fetch_all(executor)
        .await?;

        Ok(transfers)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfers = sqlx::query_as::<_, Transfer>(
            "SELECT * FROM transfers ORDER BY transferred_at DESC",
        )
        .fetch_all(executor)
        .await?;

        Ok(transfers)
    }
}

// src/db/callback_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::callback::{Callback, CallbackChannel, CallbackFilter, CallbackStatus},
    models::lead::PriorityLevel,
};

#[derive(Clone)]
pub struct CallbackRepository {
    pool: PgPool,
}

impl CallbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create_callback<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        client_name: &str,
        business_name: &str,
        callback_date: NaiveDate,
        callback_time: &str,
        channel: CallbackChannel,
        priority: PriorityLevel,
        assigned_to: Uuid,
        assigned_by: Uuid,
        remarks: Option<&str>,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // callback_code sai do DEFAULT da coluna (sequência CBnnnnnn);
        // client/business name são snapshot do lead no momento da criação
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            INSERT INTO callbacks (
                lead_id, client_name, business_name,
                callback_date, callback_time, channel,
                priority, assigned_to, assigned_by, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(client_name)
        .bind(business_name)
        .bind(callback_date)
        .bind(callback_time)
        .bind(channel)
        .bind(priority)
        .bind(assigned_to)
        .bind(assigned_by)
        .bind(remarks)
        .fetch_one(executor)
        .await?;

        Ok(callback)
    }

    // Reagendamento condicional: o WHERE só deixa passar Pending/Rescheduled,
    // e o contador incrementa na MESMA escrita (nunca por read-then-write).
    pub async fn reschedule<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
        new_date: NaiveDate,
        new_time: &str,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks SET
                rescheduled_from = callback_date,
                callback_date = $2,
                callback_time = $3,
                status = 'Rescheduled',
                rescheduled_count = rescheduled_count + 1,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('Pending', 'Rescheduled')
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .bind(new_date)
        .bind(new_time)
        .fetch_optional(executor)
        .await?;

        Ok(callback)
    }

    pub async fn complete<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
        completed_by: Uuid,
        outcome: Option<&str>,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks SET
                status = 'Completed',
                completed_date = NOW(),
                completed_by = $2,
                outcome = COALESCE($3, outcome),
                updated_at = NOW()
            WHERE id = $1 AND status IN ('Pending', 'Rescheduled', 'Not Reachable')
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .bind(completed_by)
        .bind(outcome)
        .fetch_optional(executor)
        .await?;

        Ok(callback)
    }

    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks
            SET status = 'Cancelled', updated_at = NOW()
            WHERE id = $1 AND status <> 'Completed'
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .fetch_optional(executor)
        .await?;

        Ok(callback)
    }

    // Caminho genérico (ex: marcar Not Reachable). Um callback Completed
    // nunca é "revivido" por um cliente defasado: o WHERE barra.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
        new_status: CallbackStatus,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status <> 'Completed'
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .bind(new_status)
        .fetch_optional(executor)
        .await?;

        Ok(callback)
    }

    // Troca de dono (usada pelo aceite de transferência, na mesma transação)
    pub async fn set_assignee<'e, E>(
        &self,
        executor: E,
        callback_id: Uuid,
        new_owner: Uuid,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks
            SET assigned_to = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(callback_id)
        .bind(new_owner)
        .fetch_optional(executor)
        .await?;

        Ok(callback)
    }

    // Edição de campos soltos (canal, prioridade, observações)
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        callback: &Callback,
    ) -> Result<Callback, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Callback>(
            r#"
            UPDATE callbacks SET
                channel = $2, priority = $3, remarks = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(callback.id)
        .bind(callback.channel)
        .bind(callback.priority)
        .bind(&callback.remarks)
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, callback_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM callbacks WHERE id = $1")
            .bind(callback_id)
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
        callback_id: Uuid,
    ) -> Result<Option<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callback = sqlx::query_as::<_, Callback>("SELECT * FROM callbacks WHERE id = $1")
            .bind(callback_id)
            .fetch_optional(executor)
            .await?;

        Ok(callback)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &CallbackFilter,
        restrict_to: Option<Uuid>,
    ) -> Result<Vec<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb =
            Self::filtered_query("SELECT * FROM callbacks WHERE 1=1", filter, restrict_to);

        qb.push(" ORDER BY callback_date ASC, callback_time ASC");
        qb.push(" LIMIT ").push_bind(filter.limit());
        qb.push(" OFFSET ").push_bind(filter.offset());

        let callbacks = qb.build_query_as::<Callback>().fetch_all(executor).await?;

        Ok(callbacks)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        filter: &CallbackFilter,
        restrict_to: Option<Uuid>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = Self::filtered_query(
            "SELECT COUNT(*) FROM callbacks WHERE 1=1",
            filter,
            restrict_to,
        );

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;

        Ok(total)
    }

    // Histórico de follow-ups de um lead, mais recente primeiro
    pub async fn list_by_lead<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<Vec<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let callbacks = sqlx::query_as::<_, Callback>(
            "SELECT * FROM callbacks WHERE lead_id = $1 ORDER BY callback_date DESC",
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(callbacks)
    }

    // Snapshot completo para o agregador de métricas (sem paginação)
    pub async fn list_all<'e, E>(
        &self,
        executor: E,
        restrict_to: Option<Uuid>,
    ) -> Result<Vec<Callback>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM callbacks WHERE 1=1");
        if let Some(assignee) = restrict_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        }

        let callbacks = qb.build_query_as::<Callback>().fetch_all(executor).await?;

        Ok(callbacks)
    }

    fn filtered_query<'a>(
        base: &str,
        filter: &'a CallbackFilter,
        restrict_to: Option<Uuid>,
    ) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(base);

        if let Some(assignee) = restrict_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        } else if let Some(assignee) = filter.assigned_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        }

        if let Some(lead_id) = filter.lead_id {
            qb.push(" AND lead_id = ").push_bind(lead_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(channel) = filter.channel {
            qb.push(" AND channel = ").push_bind(channel);
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND callback_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND callback_date <= ").push_bind(end);
        }

        if let Some(search) = filter.search.as_deref() {
            let term = format!("%{}%", search);
            qb.push(" AND (client_name ILIKE ")
                .push_bind(term.clone())
                .push(" OR business_name ILIKE ")
                .push_bind(term.clone())
                .push(" OR callback_code ILIKE ")
                .push_bind(term)
                .push(")");
        }

        qb
    }
}

// src/db/lead_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadFilter, LeadSource, LeadStatus, PriorityLevel},
};

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        client_name: &str,
        business_name: &str,
        email: &str,
        phone: &str,
        alternate_phone: Option<&str>,
        source: LeadSource,
        status: LeadStatus,
        priority: PriorityLevel,
        industry: Option<&str>,
        website_url: Option<&str>,
        expected_revenue: Decimal,
        address: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        zip_code: Option<&str>,
        assigned_to: Uuid,
        assigned_by: Uuid,
        notes: Option<&str>,
        tags: Option<&[String]>,
        next_follow_up_date: Option<NaiveDate>,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // lead_code sai do DEFAULT da coluna (sequência LEADnnnnn)
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                client_name, business_name, email, phone, alternate_phone,
                source, status, priority, industry, website_url, expected_revenue,
                address, city, state, country, zip_code,
                assigned_to, assigned_by, notes, tags, next_follow_up_date
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21
            )
            RETURNING *
            "#,
        )
        .bind(client_name)
        .bind(business_name)
        .bind(email)
        .bind(phone)
        .bind(alternate_phone)
        .bind(source)
        .bind(status)
        .bind(priority)
        .bind(industry)
        .bind(website_url)
        .bind(expected_revenue)
        .bind(address)
        .bind(city)
        .bind(state)
        .bind(country)
        .bind(zip_code)
        .bind(assigned_to)
        .bind(assigned_by)
        .bind(notes)
        .bind(tags)
        .bind(next_follow_up_date)
        .fetch_one(executor)
        .await?;

        Ok(lead)
    }

    // Escrita condicional de status: o WHERE carrega a trava de lead fechado.
    // Se `allow_closed` for false e o lead já estiver Won/Lost, nenhuma linha
    // é afetada e o chamador recebe None (corrida perdida ou lead congelado).
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        new_status: LeadStatus,
        allow_closed: bool,
        stamp_contacted: bool,
        mark_converted: bool,
        lost_reason: Option<&str>,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                status = $2,
                last_contacted_date = CASE WHEN $3 THEN NOW() ELSE last_contacted_date END,
                converted_to_customer = converted_to_customer OR $4,
                converted_date = CASE
                    WHEN $4 AND converted_date IS NULL THEN NOW()
                    ELSE converted_date
                END,
                lost_reason = COALESCE($5, lost_reason),
                updated_at = NOW()
            WHERE id = $1
              AND ($6 OR status NOT IN ('Won', 'Lost'))
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(new_status)
        .bind(stamp_contacted)
        .bind(mark_converted)
        .bind(lost_reason)
        .bind(allow_closed)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    // Reatribuição congelada para leads fechados (auditoria de negócios ganhos)
    pub async fn set_assignee<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        new_owner: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET assigned_to = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('Won', 'Lost')
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(new_owner)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    // Atualização de campos editáveis (status e dono têm caminhos guardados próprios)
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        lead: &Lead,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                client_name = $2, business_name = $3, email = $4, phone = $5,
                alternate_phone = $6, source = $7, priority = $8, industry = $9,
                website_url = $10, expected_revenue = $11,
                address = $12, city = $13, state = $14, country = $15, zip_code = $16,
                notes = $17, tags = $18, next_follow_up_date = $19,
                lost_reason = $20,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.client_name)
        .bind(&lead.business_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.alternate_phone)
        .bind(lead.source)
        .bind(lead.priority)
        .bind(&lead.industry)
        .bind(&lead.website_url)
        .bind(lead.expected_revenue)
        .bind(&lead.address)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(&lead.country)
        .bind(&lead.zip_code)
        .bind(&lead.notes)
        .bind(&lead.tags)
        .bind(lead.next_follow_up_date)
        .bind(&lead.lost_reason)
        .fetch_one(executor)
        .await?;

        Ok(updated)
    }

    pub async fn touch_next_follow_up<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        next_follow_up: NaiveDate,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE leads SET next_follow_up_date = $2, updated_at = NOW() WHERE id = $1")
            .bind(lead_id)
            .bind(next_follow_up)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn touch_last_contacted<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE leads SET last_contacted_date = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(lead_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(lead_id)
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
        lead_id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(lead_id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &LeadFilter,
        restrict_to: Option<Uuid>,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = Self::filtered_query("SELECT * FROM leads WHERE 1=1", filter, restrict_to);

        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ").push_bind(filter.limit());
        qb.push(" OFFSET ").push_bind(filter.offset());

        let leads = qb.build_query_as::<Lead>().fetch_all(executor).await?;

        Ok(leads)
    }

    pub async fn count<'e, E>(
        &self,
        executor: E,
        filter: &LeadFilter,
        restrict_to: Option<Uuid>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb =
            Self::filtered_query("SELECT COUNT(*) FROM leads WHERE 1=1", filter, restrict_to);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;

        Ok(total)
    }

    // Snapshot completo para o agregador de métricas (sem paginação)
    pub async fn list_all<'e, E>(
        &self,
        executor: E,
        restrict_to: Option<Uuid>,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE 1=1");
        if let Some(assignee) = restrict_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        }

        let leads = qb.build_query_as::<Lead>().fetch_all(executor).await?;

        Ok(leads)
    }

    // Busca única por código, nome, negócio ou e-mail (lookup do admin)
    pub async fn lookup<'e, E>(
        &self,
        executor: E,
        query: &str,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let search_term = format!("%{}%", query);

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE lead_code ILIKE $1
               OR client_name ILIKE $1
               OR business_name ILIKE $1
               OR email ILIKE $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(search_term)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    // Quantos callbacks/transfers em aberto ainda apontam para o lead.
    // Enquanto for > 0, o lead não pode ser apagado (checagem em cascata).
    pub async fn count_open_references<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let refs: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM callbacks
                  WHERE lead_id = $1
                    AND status IN ('Pending', 'Rescheduled', 'Not Reachable'))
                +
                (SELECT COUNT(*) FROM transfers t
                  JOIN callbacks c ON t.callback_id = c.id
                  WHERE c.lead_id = $1
                    AND t.status IN ('Transferred', 'Accepted'))
            "#,
        )
        .bind(lead_id)
        .fetch_one(executor)
        .await?;

        Ok(refs)
    }

    // Monta o WHERE compartilhado entre list() e count()
    fn filtered_query<'a>(
        base: &str,
        filter: &'a LeadFilter,
        restrict_to: Option<Uuid>,
    ) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(base);

        if let Some(assignee) = restrict_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        } else if let Some(assignee) = filter.assigned_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        }

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
        if let Some(source) = filter.source {
            qb.push(" AND source = ").push_bind(source);
        }

        if let Some(search) = filter.search.as_deref() {
            let term = format!("%{}%", search);
            qb.push(" AND (client_name ILIKE ")
                .push_bind(term.clone())
                .push(" OR business_name ILIKE ")
                .push_bind(term.clone())
                .push(" OR email ILIKE ")
                .push_bind(term.clone())
                .push(" OR lead_code ILIKE ")
                .push_bind(term)
                .push(")");
        }

        qb
    }
}

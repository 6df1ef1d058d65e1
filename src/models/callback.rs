// src/models/callback.rs

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::lead::PriorityLevel;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "callback_channel")]
pub enum CallbackChannel {
    Call,
    Email,
    WhatsApp,
    Zoom,
    #[sqlx(rename = "In-Person Meeting")]
    #[serde(rename = "In-Person Meeting")]
    InPersonMeeting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "callback_status")]
pub enum CallbackStatus {
    Pending,
    Completed,
    Rescheduled,
    #[sqlx(rename = "Not Reachable")]
    #[serde(rename = "Not Reachable")]
    NotReachable,
    Cancelled,
}

impl CallbackStatus {
    // Reagendar só faz sentido para callbacks ainda em aberto
    pub fn allows_reschedule(&self) -> bool {
        matches!(self, CallbackStatus::Pending | CallbackStatus::Rescheduled)
    }

    pub fn allows_complete(&self) -> bool {
        matches!(
            self,
            CallbackStatus::Pending | CallbackStatus::Rescheduled | CallbackStatus::NotReachable
        )
    }

    pub fn allows_cancel(&self) -> bool {
        !matches!(self, CallbackStatus::Completed)
    }
}

// --- CLASSIFICAÇÃO DERIVADA (nunca persistida) ---

// Balde de tempo calculado na leitura, relativo a um "hoje" injetado.
// Não pode virar coluna: o valor apodrece quando o relógio anda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TimeBucket {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    Future,
    Completed,
}

impl TimeBucket {
    // Função pura: (status, data agendada, hoje) -> balde.
    // Semana fecha no próximo domingo: hoje + (7 - índice do dia, 0=domingo).
    pub fn classify(status: CallbackStatus, scheduled: NaiveDate, today: NaiveDate) -> TimeBucket {
        if status == CallbackStatus::Completed {
            return TimeBucket::Completed;
        }

        let tomorrow = today + Duration::days(1);
        let end_of_week =
            today + Duration::days(7 - i64::from(today.weekday().num_days_from_sunday()));

        if scheduled < today {
            TimeBucket::Overdue
        } else if scheduled == today {
            TimeBucket::Today
        } else if scheduled == tomorrow {
            TimeBucket::Tomorrow
        } else if scheduled <= end_of_week {
            TimeBucket::ThisWeek
        } else {
            TimeBucket::Future
        }
    }

    pub const ALL: [TimeBucket; 6] = [
        TimeBucket::Overdue,
        TimeBucket::Today,
        TimeBucket::Tomorrow,
        TimeBucket::ThisWeek,
        TimeBucket::Future,
        TimeBucket::Completed,
    ];
}

// --- CALLBACK (O Dado) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Callback {
    pub id: Uuid,
    #[schema(example = "CB000317")]
    pub callback_code: String,

    // O lead pode ser apagado depois; o snapshot abaixo mantém o registro legível
    pub lead_id: Option<Uuid>,
    pub client_name: String,
    pub business_name: String,

    #[schema(value_type = String, format = Date, example = "2024-03-15")]
    pub callback_date: NaiveDate,
    #[schema(example = "14:30")]
    pub callback_time: String,
    pub channel: CallbackChannel,

    pub status: CallbackStatus,
    pub priority: PriorityLevel,

    pub assigned_to: Uuid,
    pub assigned_by: Option<Uuid>,

    pub remarks: Option<String>,
    pub outcome: Option<String>,

    pub completed_date: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,

    pub rescheduled_from: Option<NaiveDate>,
    pub rescheduled_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Callback {
    pub fn time_bucket(&self, today: NaiveDate) -> TimeBucket {
        TimeBucket::classify(self.status, self.callback_date, today)
    }
}

// Callback enriquecido com o balde derivado, para as listagens
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackView {
    #[serde(flatten)]
    pub callback: Callback,
    pub time_bucket: TimeBucket,
}

impl CallbackView {
    pub fn from_callback(callback: Callback, today: NaiveDate) -> Self {
        let time_bucket = callback.time_bucket(today);
        Self {
            callback,
            time_bucket,
        }
    }
}

// --- FILTRO DE LISTAGEM ---

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CallbackFilter {
    pub status: Option<CallbackStatus>,
    pub channel: Option<CallbackChannel>,
    pub assigned_to: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2024-03-31")]
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl CallbackFilter {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-03-14 é uma quinta-feira
    fn today() -> NaiveDate {
        date(2024, 3, 14)
    }

    #[test]
    fn completed_short_circuits_date_logic() {
        // Mesmo com data no passado distante, Completed vence
        let bucket = TimeBucket::classify(CallbackStatus::Completed, date(2020, 1, 1), today());
        assert_eq!(bucket, TimeBucket::Completed);

        let bucket = TimeBucket::classify(CallbackStatus::Completed, date(2030, 1, 1), today());
        assert_eq!(bucket, TimeBucket::Completed);
    }

    #[test]
    fn bucket_boundaries_around_a_thursday() {
        let cases = [
            (date(2024, 3, 13), TimeBucket::Overdue),
            (date(2024, 3, 14), TimeBucket::Today),
            (date(2024, 3, 15), TimeBucket::Tomorrow),
            // Sábado 16 e domingo 17 ainda caem na mesma semana
            (date(2024, 3, 16), TimeBucket::ThisWeek),
            (date(2024, 3, 17), TimeBucket::ThisWeek),
            // Segunda 18 já é a próxima semana
            (date(2024, 3, 18), TimeBucket::Future),
        ];

        for (scheduled, expected) in cases {
            let got = TimeBucket::classify(CallbackStatus::Pending, scheduled, today());
            assert_eq!(got, expected, "data {scheduled} deveria ser {expected:?}");
        }
    }

    #[test]
    fn classification_is_deterministic_for_fixed_inputs() {
        let first = TimeBucket::classify(CallbackStatus::Rescheduled, date(2024, 3, 16), today());
        let second = TimeBucket::classify(CallbackStatus::Rescheduled, date(2024, 3, 16), today());
        assert_eq!(first, second);
    }

    #[test]
    fn sunday_today_closes_week_next_sunday() {
        // Com hoje = domingo (índice 0), o fim da semana é o próximo domingo
        let sunday = date(2024, 3, 10);
        assert_eq!(
            TimeBucket::classify(CallbackStatus::Pending, date(2024, 3, 16), sunday),
            TimeBucket::ThisWeek
        );
        assert_eq!(
            TimeBucket::classify(CallbackStatus::Pending, date(2024, 3, 17), sunday),
            TimeBucket::ThisWeek
        );
        assert_eq!(
            TimeBucket::classify(CallbackStatus::Pending, date(2024, 3, 18), sunday),
            TimeBucket::Future
        );
    }

    #[test]
    fn non_completed_statuses_share_the_date_rules() {
        for status in [
            CallbackStatus::Pending,
            CallbackStatus::Rescheduled,
            CallbackStatus::NotReachable,
            CallbackStatus::Cancelled,
        ] {
            assert_eq!(
                TimeBucket::classify(status, date(2024, 3, 13), today()),
                TimeBucket::Overdue
            );
        }
    }

    #[test]
    fn status_transition_guards() {
        assert!(CallbackStatus::Pending.allows_reschedule());
        assert!(CallbackStatus::Rescheduled.allows_reschedule());
        assert!(!CallbackStatus::Completed.allows_reschedule());
        assert!(!CallbackStatus::Cancelled.allows_reschedule());
        assert!(!CallbackStatus::NotReachable.allows_reschedule());

        assert!(CallbackStatus::NotReachable.allows_complete());
        assert!(!CallbackStatus::Cancelled.allows_complete());

        assert!(CallbackStatus::Pending.allows_cancel());
        assert!(CallbackStatus::Cancelled.allows_cancel());
        assert!(!CallbackStatus::Completed.allows_cancel());
    }
}

// src/db/scheduling_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        conformidade::Conformidade,
        scheduling::{
            Appointment, AppointmentFilter, ChosenSlot, MeetingKind, NewAppointment, NewProposal,
            PendingProposal, ProposalStatus,
        },
    },
};

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    // --- Propostas ---
    async fn create_proposal(&self, new: &NewProposal) -> Result<PendingProposal, AppError>;
    async fn find_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
    ) -> Result<Option<PendingProposal>, AppError>;
    async fn list_proposals(
        &self,
        kind: MeetingKind,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<PendingProposal>, AppError>;
    /// Proposta pendente mais recente (de qualquer tipo) para um número de telefone.
    async fn latest_pending_for_phone(
        &self,
        phone_digits: &[String],
    ) -> Result<Option<PendingProposal>, AppError>;
    async fn delete_proposal(&self, kind: MeetingKind, id: Uuid) -> Result<bool, AppError>;

    /// Confirma a proposta e cria o agendamento numa única transação.
    /// Falha com `ProposalAlreadyConfirmed` se a proposta não estiver mais pendente.
    async fn confirm_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
        slot: &ChosenSlot,
    ) -> Result<(PendingProposal, Appointment), AppError>;

    // --- Agendamentos ---
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;
    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError>;
    async fn reschedule_appointment(
        &self,
        id: Uuid,
        data_hora: DateTime<FixedOffset>,
        observacoes: &str,
        telefone: Option<&str>,
    ) -> Result<Option<Appointment>, AppError>;
    /// Grava o resultado da entrevista e o reflete na conformidade vinculada.
    async fn record_interview_result(
        &self,
        id: Uuid,
        status: &str,
        observacoes: &str,
        approved: bool,
    ) -> Result<Option<Appointment>, AppError>;
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<Appointment>, AppError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SchedulingRepository {
    pool: PgPool,
}

impl SchedulingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn with_kind(mut proposal: PendingProposal, kind: MeetingKind) -> PendingProposal {
    proposal.kind = kind;
    proposal
}

#[async_trait]
impl SchedulingStore for SchedulingRepository {
    // =========================================================================
    //  PROPOSTAS
    // =========================================================================

    async fn create_proposal(&self, new: &NewProposal) -> Result<PendingProposal, AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                nome_cliente, telefone_cliente, data_opcao_1, data_opcao_2,
                horario_inicio, horario_fim, conformidade_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
            new.kind.proposals_table()
        );

        let proposal = sqlx::query_as::<_, PendingProposal>(&sql)
            .bind(&new.nome_cliente)
            .bind(&new.telefone_cliente)
            .bind(new.data_opcao_1)
            .bind(new.data_opcao_2)
            .bind(new.horario_inicio)
            .bind(new.horario_fim)
            .bind(new.conformidade_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(with_kind(proposal, new.kind))
    }

    async fn find_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
    ) -> Result<Option<PendingProposal>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", kind.proposals_table());
        let maybe = sqlx::query_as::<_, PendingProposal>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe.map(|p| with_kind(p, kind)))
    }

    async fn list_proposals(
        &self,
        kind: MeetingKind,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<PendingProposal>, AppError> {
        let sql = format!(
            r#"
            SELECT * FROM {}
            WHERE ($1::status_proposta IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            kind.proposals_table()
        );
        let rows = sqlx::query_as::<_, PendingProposal>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|p| with_kind(p, kind)).collect())
    }

    async fn latest_pending_for_phone(
        &self,
        phone_digits: &[String],
    ) -> Result<Option<PendingProposal>, AppError> {
        let mut latest: Option<PendingProposal> = None;

        for kind in [MeetingKind::Entrevista, MeetingKind::Assinatura] {
            let sql = format!(
                r#"
                SELECT * FROM {}
                WHERE status = 'pendente'
                  AND regexp_replace(telefone_cliente, '\D', '', 'g') = ANY($1)
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                kind.proposals_table()
            );
            let found = sqlx::query_as::<_, PendingProposal>(&sql)
                .bind(phone_digits)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(p) = found {
                let p = with_kind(p, kind);
                let newer = latest.as_ref().is_none_or(|l| p.created_at > l.created_at);
                if newer {
                    latest = Some(p);
                }
            }
        }

        Ok(latest)
    }

    async fn delete_proposal(&self, kind: MeetingKind, id: Uuid) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.proposals_table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn confirm_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
        slot: &ChosenSlot,
    ) -> Result<(PendingProposal, Appointment), AppError> {
        let table = kind.proposals_table();
        let mut tx = self.pool.begin().await?;

        // 1. Marca como confirmada só se ainda estiver pendente
        let sql = format!(
            r#"
            UPDATE {}
            SET status = 'confirmado', data_confirmada = $1, opcao_escolhida = $2,
                horario_confirmado = $3, updated_at = NOW()
            WHERE id = $4 AND status = 'pendente'
            RETURNING *
            "#,
            table
        );
        let updated = sqlx::query_as::<_, PendingProposal>(&sql)
            .bind(slot.date)
            .bind(slot.option)
            .bind(slot.time)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let proposal = match updated {
            Some(p) => with_kind(p, kind),
            None => {
                let exists = sqlx::query_scalar::<_, bool>(&format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
                    table
                ))
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
                // Drop do tx faz rollback
                return Err(if exists {
                    AppError::ProposalAlreadyConfirmed
                } else {
                    AppError::ResourceNotFound(format!("Proposta {}", id))
                });
            }
        };

        // 2. Resolve CPF / contrato / modalidade pela conformidade vinculada
        let conformidade = match proposal.conformidade_id {
            Some(cid) => {
                sqlx::query_as::<_, Conformidade>("SELECT * FROM conformidades WHERE id = $1")
                    .bind(cid)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        // 3. Cria o agendamento
        let new = NewAppointment::from_confirmation(&proposal, slot, conformidade.as_ref());
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO agendamentos (
                tipo, cpf, tipo_contrato, modalidade, data_hora, status,
                observacoes, conformidade_id, nome_cliente, telefone_cliente
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(new.tipo)
            .bind(new.cpf.as_deref())
            .bind(new.tipo_contrato)
            .bind(new.modalidade.as_deref())
            .bind(new.data_hora)
            .bind(&new.status)
            .bind(&new.observacoes)
            .bind(new.conformidade_id)
            .bind(&new.nome_cliente)
            .bind(&new.telefone_cliente)
            .fetch_one(&mut *tx)
            .await?;

        // 4. Reflete o agendamento na conformidade
        if let Some(c) = &conformidade {
            sqlx::query(
                r#"
                UPDATE conformidades
                SET status = $1,
                    entrevista_id = CASE WHEN $2 THEN $3 ELSE entrevista_id END,
                    updated_at = NOW()
                WHERE id = $4
                "#,
            )
                .bind(kind.conformidade_status())
                .bind(kind == MeetingKind::Entrevista)
                .bind(appointment.id)
                .bind(c.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok((proposal, appointment.in_brasilia()))
    }

    // =========================================================================
    //  AGENDAMENTOS
    // =========================================================================

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        let maybe = sqlx::query_as::<_, Appointment>("SELECT * FROM agendamentos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe.map(Appointment::in_brasilia))
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM agendamentos
            WHERE ($1::tipo_agendamento IS NULL OR tipo = $1)
              AND ($2::text IS NULL OR cpf = $2)
            ORDER BY data_hora ASC
            "#,
        )
            .bind(filter.tipo)
            .bind(filter.cpf.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Appointment::in_brasilia).collect())
    }

    async fn reschedule_appointment(
        &self,
        id: Uuid,
        data_hora: DateTime<FixedOffset>,
        observacoes: &str,
        telefone: Option<&str>,
    ) -> Result<Option<Appointment>, AppError> {
        let maybe = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE agendamentos
            SET data_hora = $1, observacoes = $2,
                telefone_cliente = COALESCE($3, telefone_cliente),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
            .bind(data_hora)
            .bind(observacoes)
            .bind(telefone)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe.map(Appointment::in_brasilia))
    }

    async fn record_interview_result(
        &self,
        id: Uuid,
        status: &str,
        observacoes: &str,
        approved: bool,
    ) -> Result<Option<Appointment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE agendamentos
            SET status = $1, observacoes = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
            .bind(status)
            .bind(observacoes)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(appointment) = updated else {
            return Ok(None);
        };

        if let Some(cid) = appointment.conformidade_id {
            sqlx::query(
                r#"
                UPDATE conformidades
                SET entrevista_aprovada = $1, entrevista_id = $2, updated_at = NOW()
                WHERE id = $3
                "#,
            )
                .bind(approved)
                .bind(appointment.id)
                .bind(cid)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(appointment.in_brasilia()))
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<Appointment>, AppError> {
        let maybe = sqlx::query_as::<_, Appointment>(
            "UPDATE agendamentos SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe.map(Appointment::in_brasilia))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM agendamentos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

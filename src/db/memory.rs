// src/db/memory.rs
//
// Implementação em memória de todos os stores, usada pelos testes dos services.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        ConformidadeStore, DemandStore, DirectoryStore, ExtractionStore, SchedulingStore,
        TaskStore, TemplateStore,
    },
    models::{
        auth::Profile,
        conformidade::{Conformidade, ConformidadeFilter, NewConformidade},
        demand::{Demand, DemandStatus, NewDemand},
        extraction::{DocumentExtraction, DocumentKind},
        scheduling::{
            Appointment, AppointmentFilter, ChosenSlot, MeetingKind, NewAppointment, NewProposal,
            PendingProposal, ProposalStatus,
        },
        tasks::{CompletionSource, DistributedTask, TaskClosure, TaskFilter, TaskKind, TaskStatus},
        template::{Template, TemplateChannel, TemplateUpsert},
        webhook::NewWebhookEvent,
    },
};

#[derive(Default)]
pub struct State {
    pub conformidades: Vec<Conformidade>,
    pub proposals: Vec<PendingProposal>,
    pub appointments: Vec<Appointment>,
    pub tasks: Vec<DistributedTask>,
    pub demands: Vec<Demand>,
    pub templates: Vec<(TemplateChannel, Template)>,
    pub profiles: Vec<Profile>,
    pub webhook_events: Vec<NewWebhookEvent>,
    pub extractions: Vec<DocumentExtraction>,
    /// Quantas escritas foram feitas (para verificar rejeições antes de gravar).
    pub writes: usize,
    /// Escrita (1-based) em que o store de tarefas passa a falhar.
    pub fail_on_write: Option<usize>,
}

impl State {
    fn task_write(&mut self) -> Result<(), AppError> {
        self.writes += 1;
        match self.fail_on_write {
            Some(n) if self.writes == n => Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut)),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    pub state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    pub fn writes(&self) -> usize {
        self.with(|s| s.writes)
    }

    pub fn add_profile(&self, nome: &str, email_preferencia: Option<&str>, telefone: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.with(|s| {
            s.profiles.push(Profile {
                id,
                nome: nome.to_string(),
                email: format!("{}@agencia.com.br", nome.to_lowercase()),
                email_preferencia: email_preferencia.map(str::to_string),
                telefone: telefone.map(str::to_string),
                created_at: Utc::now(),
            })
        });
        id
    }

    pub fn add_template(&self, channel: TemplateChannel, chave: &str, assunto: Option<&str>, corpo: &str) {
        self.with(|s| {
            s.templates.push((
                channel,
                Template {
                    id: Uuid::new_v4(),
                    chave: chave.to_string(),
                    nome: chave.to_string(),
                    assunto: assunto.map(str::to_string),
                    corpo: corpo.to_string(),
                    variaveis: Value::Object(Default::default()),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
            ))
        });
    }

    pub fn task(&self, id: Uuid) -> DistributedTask {
        self.with(|s| s.tasks.iter().find(|t| t.id == id).cloned().unwrap())
    }

    pub fn events(&self) -> Vec<NewWebhookEvent> {
        self.with(|s| s.webhook_events.clone())
    }
}

fn insert_appointment(state: &mut State, new: NewAppointment) -> Appointment {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        tipo: new.tipo,
        cpf: new.cpf,
        tipo_contrato: new.tipo_contrato,
        modalidade: new.modalidade,
        data_hora: new.data_hora,
        status: new.status,
        observacoes: Some(new.observacoes),
        conformidade_id: new.conformidade_id,
        nome_cliente: Some(new.nome_cliente),
        telefone_cliente: Some(new.telefone_cliente),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    state.appointments.push(appointment.clone());
    appointment
}

#[async_trait]
impl ConformidadeStore for InMemoryStore {
    async fn create(&self, new: &NewConformidade) -> Result<Conformidade, AppError> {
        self.with(|s| {
            if s.conformidades.iter().any(|c| c.cpf == new.cpf) {
                return Err(AppError::CpfAlreadyExists);
            }
            s.writes += 1;
            let c = Conformidade {
                id: Uuid::new_v4(),
                cpf: new.cpf.clone(),
                valor_financiamento: new.valor_financiamento,
                modalidade: new.modalidade,
                modalidade_outro: new.modalidade_outro.clone(),
                tipo_contrato: new.tipo_contrato,
                comite_credito: new.comite_credito,
                observacoes: new.observacoes.clone(),
                status: "Em análise".to_string(),
                entrevista_id: None,
                entrevista_aprovada: None,
                created_by: new.created_by,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            s.conformidades.push(c.clone());
            Ok(c)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conformidade>, AppError> {
        Ok(self.with(|s| s.conformidades.iter().find(|c| c.id == id).cloned()))
    }

    async fn list(&self, filter: &ConformidadeFilter) -> Result<Vec<Conformidade>, AppError> {
        Ok(self.with(|s| {
            s.conformidades
                .iter()
                .filter(|c| filter.status.as_ref().is_none_or(|st| &c.status == st))
                .filter(|c| filter.cpf.as_ref().is_none_or(|cpf| &c.cpf == cpf))
                .cloned()
                .collect()
        }))
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Conformidade>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.conformidades.iter_mut().find(|c| c.id == id).map(|c| {
                c.status = status.to_string();
                c.clone()
            })
        }))
    }

    async fn update_notes(
        &self,
        id: Uuid,
        observacoes: Option<&str>,
    ) -> Result<Option<Conformidade>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.conformidades.iter_mut().find(|c| c.id == id).map(|c| {
                c.observacoes = observacoes.map(str::to_string);
                c.clone()
            })
        }))
    }

    async fn set_interview_approved(
        &self,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Conformidade>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.conformidades.iter_mut().find(|c| c.id == id).map(|c| {
                c.entrevista_aprovada = Some(approved);
                c.clone()
            })
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let before = s.conformidades.len();
            s.conformidades.retain(|c| c.id != id);
            before != s.conformidades.len()
        }))
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn create_proposal(&self, new: &NewProposal) -> Result<PendingProposal, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let p = PendingProposal {
                id: Uuid::new_v4(),
                kind: new.kind,
                nome_cliente: new.nome_cliente.clone(),
                telefone_cliente: new.telefone_cliente.clone(),
                data_opcao_1: new.data_opcao_1,
                data_opcao_2: new.data_opcao_2,
                horario_inicio: new.horario_inicio,
                horario_fim: new.horario_fim,
                conformidade_id: new.conformidade_id,
                status: ProposalStatus::Pendente,
                data_confirmada: None,
                opcao_escolhida: None,
                horario_confirmado: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            s.proposals.push(p.clone());
            p
        }))
    }

    async fn find_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
    ) -> Result<Option<PendingProposal>, AppError> {
        Ok(self.with(|s| s.proposals.iter().find(|p| p.id == id && p.kind == kind).cloned()))
    }

    async fn list_proposals(
        &self,
        kind: MeetingKind,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<PendingProposal>, AppError> {
        Ok(self.with(|s| {
            s.proposals
                .iter()
                .filter(|p| p.kind == kind && status.is_none_or(|st| p.status == st))
                .cloned()
                .collect()
        }))
    }

    async fn latest_pending_for_phone(
        &self,
        phone_digits: &[String],
    ) -> Result<Option<PendingProposal>, AppError> {
        Ok(self.with(|s| {
            s.proposals
                .iter()
                .filter(|p| p.status == ProposalStatus::Pendente)
                .filter(|p| {
                    let digits = crate::common::text::only_digits(&p.telefone_cliente);
                    phone_digits.contains(&digits)
                })
                .max_by_key(|p| p.created_at)
                .cloned()
        }))
    }

    async fn delete_proposal(&self, kind: MeetingKind, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let before = s.proposals.len();
            s.proposals.retain(|p| !(p.id == id && p.kind == kind));
            before != s.proposals.len()
        }))
    }

    async fn confirm_proposal(
        &self,
        kind: MeetingKind,
        id: Uuid,
        slot: &ChosenSlot,
    ) -> Result<(PendingProposal, Appointment), AppError> {
        self.with(|s| {
            let proposal = s
                .proposals
                .iter_mut()
                .find(|p| p.id == id && p.kind == kind)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Proposta {}", id)))?;
            if proposal.status != ProposalStatus::Pendente {
                return Err(AppError::ProposalAlreadyConfirmed);
            }
            proposal.status = ProposalStatus::Confirmado;
            proposal.data_confirmada = Some(slot.date);
            proposal.opcao_escolhida = slot.option;
            proposal.horario_confirmado = Some(slot.time);
            let proposal = proposal.clone();

            let conformidade = proposal
                .conformidade_id
                .and_then(|cid| s.conformidades.iter().find(|c| c.id == cid).cloned());

            let new = NewAppointment::from_confirmation(&proposal, slot, conformidade.as_ref());
            let appointment = insert_appointment(s, new);

            if let Some(c) = proposal
                .conformidade_id
                .and_then(|cid| s.conformidades.iter_mut().find(|c| c.id == cid))
            {
                c.status = kind.conformidade_status().to_string();
                if kind == MeetingKind::Entrevista {
                    c.entrevista_id = Some(appointment.id);
                }
            }

            s.writes += 1;
            Ok((proposal, appointment))
        })
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(self.with(|s| s.appointments.iter().find(|a| a.id == id).cloned()))
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AppError> {
        Ok(self.with(|s| {
            s.appointments
                .iter()
                .filter(|a| filter.tipo.is_none_or(|t| a.tipo == t))
                .filter(|a| filter.cpf.as_ref().is_none_or(|cpf| a.cpf.as_ref() == Some(cpf)))
                .cloned()
                .collect()
        }))
    }

    async fn reschedule_appointment(
        &self,
        id: Uuid,
        data_hora: DateTime<FixedOffset>,
        observacoes: &str,
        telefone: Option<&str>,
    ) -> Result<Option<Appointment>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.appointments.iter_mut().find(|a| a.id == id).map(|a| {
                a.data_hora = data_hora;
                a.observacoes = Some(observacoes.to_string());
                if let Some(t) = telefone {
                    a.telefone_cliente = Some(t.to_string());
                }
                a.clone()
            })
        }))
    }

    async fn record_interview_result(
        &self,
        id: Uuid,
        status: &str,
        observacoes: &str,
        approved: bool,
    ) -> Result<Option<Appointment>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let appointment = s.appointments.iter_mut().find(|a| a.id == id).map(|a| {
                a.status = status.to_string();
                a.observacoes = Some(observacoes.to_string());
                a.clone()
            })?;
            if let Some(c) = appointment
                .conformidade_id
                .and_then(|cid| s.conformidades.iter_mut().find(|c| c.id == cid))
            {
                c.entrevista_aprovada = Some(approved);
                c.entrevista_id = Some(appointment.id);
            }
            Some(appointment)
        }))
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<Appointment>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.appointments.iter_mut().find(|a| a.id == id).map(|a| {
                a.status = status.to_string();
                a.clone()
            })
        }))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let before = s.appointments.len();
            s.appointments.retain(|a| a.id != id);
            before != s.appointments.len()
        }))
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create_task(
        &self,
        kind: TaskKind,
        referencia_id: Uuid,
        empregado_id: Uuid,
    ) -> Result<DistributedTask, AppError> {
        self.with(|s| {
            s.task_write()?;
            let t = DistributedTask {
                id: Uuid::new_v4(),
                tipo_tarefa: kind,
                referencia_id,
                empregado_id,
                status: TaskStatus::EmAndamento,
                email_reply_to: None,
                email_message_id: None,
                concluida_em: None,
                concluida_por_email: false,
                email_conclusao_id: None,
                email_conclusao_remetente: None,
                palavra_chave: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            s.tasks.push(t.clone());
            Ok(t)
        })
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<DistributedTask>, AppError> {
        Ok(self.with(|s| s.tasks.iter().find(|t| t.id == id).cloned()))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<DistributedTask>, AppError> {
        Ok(self.with(|s| {
            s.tasks
                .iter()
                .filter(|t| filter.status.is_none_or(|st| t.status == st))
                .filter(|t| filter.empregado_id.is_none_or(|e| t.empregado_id == e))
                .filter(|t| filter.tipo_tarefa.is_none_or(|k| t.tipo_tarefa == k))
                .filter(|t| filter.referencia_id.is_none_or(|r| t.referencia_id == r))
                .cloned()
                .collect()
        }))
    }

    async fn attach_email(
        &self,
        id: Uuid,
        reply_to: &str,
        message_id: Option<&str>,
    ) -> Result<(), AppError> {
        self.with(|s| {
            s.task_write()?;
            if let Some(t) = s.tasks.iter_mut().find(|t| t.id == id) {
                t.email_reply_to = Some(reply_to.to_string());
                t.email_message_id = message_id.map(str::to_string);
            }
            Ok(())
        })
    }

    async fn complete_task(
        &self,
        id: Uuid,
        source: &CompletionSource,
    ) -> Result<Option<TaskClosure>, AppError> {
        Ok(self.with(|s| {
            let task = s
                .tasks
                .iter_mut()
                .find(|t| t.id == id && t.status == TaskStatus::EmAndamento)?;
            s.writes += 1;
            task.status = TaskStatus::Concluida;
            task.concluida_em = Some(Utc::now());
            if let CompletionSource::Email { email_id, remetente, palavra_chave } = source {
                task.concluida_por_email = true;
                task.email_conclusao_id = Some(email_id.clone());
                task.email_conclusao_remetente = Some(remetente.clone());
                task.palavra_chave = Some(palavra_chave.clone());
            }
            let task = task.clone();

            let mut closure = TaskClosure {
                demand_id: None,
                demand_updated: false,
                siblings_completed: 0,
                task,
            };

            if closure.task.tipo_tarefa == TaskKind::Demanda {
                let demand_id = closure.task.referencia_id;
                closure.demand_id = Some(demand_id);
                if let Some(d) = s.demands.iter_mut().find(|d| d.id == demand_id) {
                    d.status = DemandStatus::Concluida;
                    closure.demand_updated = true;
                }
                for t in s.tasks.iter_mut().filter(|t| {
                    t.tipo_tarefa == TaskKind::Demanda
                        && t.referencia_id == demand_id
                        && t.status == TaskStatus::EmAndamento
                }) {
                    t.status = TaskStatus::Concluida;
                    t.concluida_em = Some(Utc::now());
                    closure.siblings_completed += 1;
                }
            }

            Some(closure)
        }))
    }

    async fn log_webhook_event(&self, event: &NewWebhookEvent) -> Result<(), AppError> {
        self.with(|s| s.webhook_events.push(event.clone()));
        Ok(())
    }
}

#[async_trait]
impl DemandStore for InMemoryStore {
    async fn create_demand(&self, new: &NewDemand) -> Result<Demand, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let arquivo = |i: usize| new.arquivos.get(i).cloned();
            let d = Demand {
                id: Uuid::new_v4(),
                tipo: new.tipo,
                cpf: new.cpf.clone(),
                matricula: new.matricula.clone(),
                cartorio: new.cartorio.clone(),
                descricao: new.descricao.clone(),
                arquivo_1: arquivo(0),
                arquivo_2: arquivo(1),
                arquivo_3: arquivo(2),
                arquivo_4: arquivo(3),
                arquivo_5: arquivo(4),
                resposta: None,
                status: DemandStatus::Pendente,
                documento_assinado: None,
                solicitante_id: new.solicitante_id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            s.demands.push(d.clone());
            d
        }))
    }

    async fn find_demand(&self, id: Uuid) -> Result<Option<Demand>, AppError> {
        Ok(self.with(|s| s.demands.iter().find(|d| d.id == id).cloned()))
    }

    async fn list_demands(&self, status: Option<DemandStatus>) -> Result<Vec<Demand>, AppError> {
        Ok(self.with(|s| {
            s.demands
                .iter()
                .filter(|d| status.is_none_or(|st| d.status == st))
                .cloned()
                .collect()
        }))
    }

    async fn respond(
        &self,
        id: Uuid,
        resposta: &str,
        status: DemandStatus,
    ) -> Result<Option<Demand>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.demands.iter_mut().find(|d| d.id == id).map(|d| {
                d.resposta = Some(resposta.to_string());
                d.status = status;
                d.clone()
            })
        }))
    }

    async fn attach_signed_document(&self, id: Uuid, path: &str) -> Result<Option<Demand>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.demands.iter_mut().find(|d| d.id == id).map(|d| {
                d.documento_assinado = Some(path.to_string());
                if !d.status.is_closed() {
                    d.status = DemandStatus::Assinada;
                }
                d.clone()
            })
        }))
    }

    async fn set_status(&self, id: Uuid, status: DemandStatus) -> Result<Option<Demand>, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.demands.iter_mut().find(|d| d.id == id).map(|d| {
                d.status = status;
                d.clone()
            })
        }))
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn find_template(
        &self,
        channel: TemplateChannel,
        chave: &str,
    ) -> Result<Option<Template>, AppError> {
        Ok(self.with(|s| {
            s.templates
                .iter()
                .find(|(c, t)| *c == channel && t.chave == chave)
                .map(|(_, t)| t.clone())
        }))
    }

    async fn list_templates(&self, channel: TemplateChannel) -> Result<Vec<Template>, AppError> {
        Ok(self.with(|s| {
            s.templates
                .iter()
                .filter(|(c, _)| *c == channel)
                .map(|(_, t)| t.clone())
                .collect()
        }))
    }

    async fn upsert_template(
        &self,
        channel: TemplateChannel,
        template: &TemplateUpsert,
    ) -> Result<Template, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            s.templates.retain(|(c, t)| !(*c == channel && t.chave == template.chave));
            let saved = Template {
                id: Uuid::new_v4(),
                chave: template.chave.clone(),
                nome: template.nome.clone(),
                assunto: template.assunto.clone(),
                corpo: template.corpo.clone(),
                variaveis: template.variaveis.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            s.templates.push((channel, saved.clone()));
            saved
        }))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.with(|s| s.profiles.iter().find(|p| p.id == id).cloned()))
    }
}

#[async_trait]
impl ExtractionStore for InMemoryStore {
    async fn save_extraction(
        &self,
        kind: DocumentKind,
        dados: &Value,
        texto_gerado: &str,
    ) -> Result<DocumentExtraction, AppError> {
        Ok(self.with(|s| {
            s.writes += 1;
            let e = DocumentExtraction {
                id: Uuid::new_v4(),
                tipo: kind.as_str().to_string(),
                dados: dados.clone(),
                texto_gerado: texto_gerado.to_string(),
                created_at: Utc::now(),
            };
            s.extractions.push(e.clone());
            e
        }))
    }
}

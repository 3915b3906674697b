pub mod conformidade_service;
pub use conformidade_service::ConformidadeService;
pub mod scheduling_service;
pub use scheduling_service::SchedulingService;
pub mod task_service;
pub use task_service::TaskService;
pub mod email_reply_service;
pub use email_reply_service::EmailReplyService;
pub mod notification_service;
pub use notification_service::NotificationDispatcher;
pub mod template_service;
pub use template_service::TemplateService;
pub mod demand_service;
pub use demand_service::DemandService;
pub mod extraction_service;
pub use extraction_service::ExtractionService;
pub mod signed_document_service;
pub use signed_document_service::SignedDocumentService;

pub mod conformidades;
pub mod demands;
pub mod documents;
pub mod extraction;
pub mod scheduling;
pub mod tasks;
pub mod templates;
pub mod webhooks;

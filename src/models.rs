pub mod auth;
pub mod conformidade;
pub mod demand;
pub mod extraction;
pub mod scheduling;
pub mod tasks;
pub mod template;
pub mod webhook;

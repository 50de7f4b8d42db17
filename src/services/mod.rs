pub mod application_service;
pub mod application_store;
pub mod captcha_service;
pub mod notification_service;
pub mod resume_service;
pub mod resume_storage;

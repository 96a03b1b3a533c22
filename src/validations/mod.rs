pub mod credentials;
pub mod name_email;
pub mod quantities;

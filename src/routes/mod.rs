pub mod access;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod delivery;
pub mod health_check;
pub mod menu;
pub mod order;
pub mod reservation;
pub mod restaurant;
pub mod staff;
pub mod table;
pub mod users;

mod admin;
mod delivery;
mod helper;
mod staff;

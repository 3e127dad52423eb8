pub mod accounts;
pub mod grants;
pub mod health;
pub mod serve;

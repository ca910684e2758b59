//! Database migrations for the ipocket inventory

pub use sea_orm_migration::prelude::*;

mod migration;

pub use migration::Migrator;

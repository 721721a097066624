pub mod checkout;
pub mod clock;
pub mod extension;
pub mod front_desk;
pub mod ledger;
pub mod occupancy;
pub mod status_machine;
pub mod store;
pub mod wizard;

pub mod analyze;
pub mod annualize;
pub mod cash_flow;
pub mod irr;

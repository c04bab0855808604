//! Local forecasting: the mock generator, its error metrics and the
//! store/department/holiday aggregates shown alongside it.

pub mod aggregate;
pub mod metrics;
pub mod mock;

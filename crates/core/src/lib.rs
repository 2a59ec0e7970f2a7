pub mod category;
pub mod money;
pub mod period;
pub mod row;

pub use category::{CategoryCode, NAMED_CATEGORIES};
pub use money::{Money, MoneyError};
pub use period::{PeriodError, StatementPeriod};
pub use row::{Classification, DataRow};

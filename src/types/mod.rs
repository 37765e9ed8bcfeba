pub mod error;
pub mod request;
pub mod validate;

pub use error::{AssistError, Result, ValidationError, ValidationErrorKind};
pub use request::{
    BudgetCoachInput, BudgetLine, CategorySuggestInput, CategorySuggestResult, DuplicatesInput,
    DuplicatesResult, NlFilterInput, NlFilterResult, ReportSummaryInput, TxKind, TxRecord,
};
pub use validate::{Validate, MONEY_MAX};
